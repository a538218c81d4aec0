//! SSO/IdP detector (C4): recognizes identity-provider sign-in affordances
//! on a login page, click-and-observes them to classify the concrete SDK
//! integration, and exposes the process-wide [`ruleset::RulesetHandle`].

pub mod detect;
pub mod keyword;
pub mod request_match;
pub mod ruleset;

pub use detect::{run, RunParams};
pub use ruleset::RulesetHandle;
