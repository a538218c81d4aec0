//! `authscope-worker` — consumes tasks from the broker, runs each one's
//! analysis in an isolated child process, and replies to the dispatcher.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  authscope worker --analyzer landscape_analysis           │
//! │                                                            │
//! │   authscope_worker::run(config, analyzer, shutdown).await  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Connection flow
//!
//! 1. Connect to the broker queue named for the worker's `AnalyzerKind`,
//!    with `prefetch = 1` (one task in flight at a time per worker).
//! 2. Main loop: on delivery, transition `REQUEST_RECEIVED`, run the
//!    analyzer in a child process capped at `task_wall_time_cap_seconds`,
//!    transition `RESPONSE_SENT`, `PUT` the result to `reply_to` with
//!    HTTP Basic auth and retry-with-backoff, then ack.
//! 3. On disconnect: reconnect with jittered exponential back-off.
//! 4. On shutdown: stop consuming and close the broker connection; an
//!    in-flight child is left to finish (or hit its own wall-time cap).

pub mod consumer;
pub mod process;
pub mod reconnect;
pub mod reply;
pub mod types;

pub use consumer::run;
pub use reconnect::ReconnectBackoff;
pub use types::WorkerError;
