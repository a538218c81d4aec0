use std::sync::Arc;

use authscope_domain::config::Config;

use crate::admin::AdminOps;
use crate::broker::BrokerPublish;
use crate::store::{BlobStore, DocumentStore};

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub documents: Arc<dyn DocumentStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub broker: Arc<dyn BrokerPublish>,
    pub admin: Arc<AdminOps>,
    /// SHA-256 hash of the admin bearer token, read once at startup from
    /// `server.admin_token_env`. `None` disables admin auth (dev mode).
    pub admin_token_hash: Option<[u8; 32]>,
}
