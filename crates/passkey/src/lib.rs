//! Passkey/WebAuthn detector (C5): layered detection across API
//! availability, enterprise heuristics, UI, inline JS, and visible text,
//! plus an optional CDP-driven implementation capture when something fires.

pub mod api;
pub mod capture;
pub mod detect;
pub mod enterprise;
pub mod js;
pub mod keyword;
pub mod types;
pub mod ui;

pub use detect::run;
