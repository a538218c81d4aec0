//! Top-level worker error type.

/// Errors surfaced by the worker runtime itself (not by task execution —
/// a failed task is data, captured in `TaskResult.exception`, never an
/// `Err` here).
#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    #[error("config: {0}")]
    Config(String),
    #[error("broker: {0}")]
    Broker(String),
    #[error("reconnect exhausted after {0} attempts")]
    ReconnectExhausted(u32),
    #[error("shutdown")]
    Shutdown,
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}
