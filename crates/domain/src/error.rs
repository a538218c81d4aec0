/// Shared error type used across all authscope crates.
///
/// These are infrastructure errors (config, IO, broker, store, HTTP) that
/// propagate to a caller. Detection-level failures (unreachable domain,
/// non-analyzable page, a single well-known probe failing) are *not*
/// represented here — per the propagation rule, they stay local to the
/// stage that produced them and are recorded as data, not raised as errors.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("broker: {0}")]
    Broker(String),

    #[error("browser: {0}")]
    Browser(String),

    #[error("config: {0}")]
    Config(String),

    #[error("admin validation: {0}")]
    AdminValidation(String),

    #[error("blob store: {0}")]
    BlobStore(String),

    #[error("document store: {0}")]
    DocumentStore(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
