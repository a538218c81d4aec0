//! Shared test fixtures used across the workspace: a recording broker
//! double, an in-process HTTP fixture server, sample login-page markup, and
//! the dispatcher's in-memory document/blob stores re-exported under this
//! crate's namespace so a crate's tests don't need a direct dependency on
//! `authscope-dispatcher` just to stand up a store.
//!
//! Promoted to a shared crate (rather than inlined per test file) because
//! the same fixtures — a broker double, an in-memory store, a fixture HTTP
//! server — are useful to more than one of this workspace's crates.

pub mod broker;
pub mod html;
pub mod http_fixture;

pub use broker::RecordingBroker;
pub use http_fixture::{FixtureResponse, FixtureServer};

pub use authscope_dispatcher::store::{InMemoryBlobStore, InMemoryDocumentStore};
