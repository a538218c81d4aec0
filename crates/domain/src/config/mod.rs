mod artifacts;
mod broker;
mod browser;
mod idp;
mod login_page;
mod metadata;
mod server;

pub use artifacts::*;
pub use broker::*;
pub use browser::*;
pub use idp::*;
pub use login_page::*;
pub use metadata::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub login_page: LoginPageConfig,
    #[serde(default)]
    pub idp: IdpConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub keyword_recognition: KeywordRecognitionConfig,
    #[serde(default)]
    pub logo_recognition: LogoRecognitionConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub document_store: DocumentStoreConfig,
    #[serde(default)]
    pub blob_store: BlobStoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Parse a TOML config file and validate it. Matches the "Admin
    /// validation" error kind: malformed structure is rejected before any
    /// side effect is attempted.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: Config = toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.logo_recognition.scale_lower_bound > self.logo_recognition.scale_upper_bound {
            return Err(Error::Config(
                "logo_recognition.scale_lower_bound must be <= scale_upper_bound".into(),
            ));
        }
        if self.logo_recognition.lower_bound > self.logo_recognition.upper_bound {
            return Err(Error::Config(
                "logo_recognition.lower_bound must be <= upper_bound".into(),
            ));
        }
        if self.worker.broker.prefetch != 1 {
            return Err(Error::Config(
                "worker.broker.prefetch must be 1 (one in-flight task per worker process)".into(),
            ));
        }
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Logging
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "d_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: d_log_level(),
            json: false,
        }
    }
}

fn d_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let cfg = Config::default();
        cfg.validate().expect("default config should validate");
    }

    #[test]
    fn rejects_prefetch_other_than_one() {
        let mut cfg = Config::default();
        cfg.worker.broker.prefetch = 2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = Config::default();
        let text = toml::to_string(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&text).expect("parse");
        assert_eq!(parsed.browser.width, cfg.browser.width);
    }
}
