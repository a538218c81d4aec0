//! The browser driver (C1): isolated profiles, navigation, screenshot/HAR
//! capture, and the WebAuthn CDP instrumentation every detector builds on.

pub mod driver;
pub mod failure;
pub mod har;
pub mod profile;
pub mod webauthn;

pub use driver::{BrowserContext, BrowserDriver, ChromiumDriver, NotAnalyzableReason};
pub use failure::NavigationFailure;
pub use profile::{BrowserProfile, ProfileRegistry};
