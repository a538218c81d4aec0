use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Artifact capture toggles
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactsConfig {
    #[serde(default = "d_true")]
    pub store_idp_screenshot: bool,
    #[serde(default)]
    pub store_idp_har: bool,
    #[serde(default = "d_true")]
    pub store_sso_button_detection_screenshot: bool,
    #[serde(default)]
    pub store_sitemap: bool,
    #[serde(default)]
    pub store_robots: bool,
    #[serde(default = "d_true")]
    pub store_passkey_screenshot: bool,
    #[serde(default)]
    pub store_passkey_har: bool,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            store_idp_screenshot: true,
            store_idp_har: false,
            store_sso_button_detection_screenshot: true,
            store_sitemap: false,
            store_robots: false,
            store_passkey_screenshot: true,
            store_passkey_har: false,
        }
    }
}

fn d_true() -> bool {
    true
}
