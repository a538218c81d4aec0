//! The analyzer orchestrator (C7): stitches the browser driver, candidate
//! generator, IdP/passkey/password/MFA detectors, and metadata prober into
//! the five sequential stages that produce one `TaskResult` per task.

pub mod auth_analysis;
pub mod idp_scan;
pub mod metadata;
pub mod orchestrator;
pub mod resolve;

pub use orchestrator::run;
