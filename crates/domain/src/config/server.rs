use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Dispatcher HTTP server (C9)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "d_port")]
    pub port: u16,
    #[serde(default = "d_host")]
    pub host: String,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Environment variable holding the admin bearer token. If unset at
    /// process start, admin endpoints are disabled (403).
    #[serde(default = "d_admin_token_env")]
    pub admin_token_env: String,
    /// Externally-reachable base URL the dispatcher embeds in a task's
    /// `reply_to` so a worker (possibly on another host) can PUT its result
    /// back here.
    #[serde(default = "d_reply_base_url")]
    pub reply_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: d_port(),
            host: d_host(),
            cors: CorsConfig::default(),
            admin_token_env: d_admin_token_env(),
            reply_base_url: d_reply_base_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "d_cors_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: d_cors_origins(),
        }
    }
}

fn d_port() -> u16 {
    8080
}
fn d_host() -> String {
    "0.0.0.0".into()
}
fn d_cors_origins() -> Vec<String> {
    vec!["http://localhost:*".into(), "http://127.0.0.1:*".into()]
}
fn d_admin_token_env() -> String {
    "AUTHSCOPE_ADMIN_TOKEN".into()
}
fn d_reply_base_url() -> String {
    "http://127.0.0.1:8080".into()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Document store / blob store connections: backend-agnostic at the
// interface level, but a deployment still needs concrete settings to
// reach them, which live here
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStoreConfig {
    #[serde(default = "d_document_store_uri")]
    pub uri: String,
    #[serde(default = "d_database")]
    pub database: String,
}

impl Default for DocumentStoreConfig {
    fn default() -> Self {
        Self {
            uri: d_document_store_uri(),
            database: d_database(),
        }
    }
}

fn d_document_store_uri() -> String {
    "mongodb://127.0.0.1:27017".into()
}
fn d_database() -> String {
    "authscope".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobStoreConfig {
    #[serde(default = "d_blob_store_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub access_key_env: Option<String>,
    #[serde(default)]
    pub secret_key_env: Option<String>,
    #[serde(default = "d_true")]
    pub use_tls: bool,
}

impl Default for BlobStoreConfig {
    fn default() -> Self {
        Self {
            endpoint: d_blob_store_endpoint(),
            access_key_env: None,
            secret_key_env: None,
            use_tls: true,
        }
    }
}

fn d_blob_store_endpoint() -> String {
    "127.0.0.1:9000".into()
}
fn d_true() -> bool {
    true
}
