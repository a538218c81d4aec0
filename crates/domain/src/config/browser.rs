use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Browser driver (C1)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BrowserEngine {
    Chromium,
    Firefox,
    Webkit,
}

impl Default for BrowserEngine {
    fn default() -> Self {
        BrowserEngine::Chromium
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub name: BrowserEngine,
    #[serde(default = "d_true")]
    pub headless: bool,
    #[serde(default = "d_1280")]
    pub width: u32,
    #[serde(default = "d_800")]
    pub height: u32,
    #[serde(default = "d_locale")]
    pub locale: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
    #[serde(default = "d_timeout_default_ms")]
    pub timeout_default_ms: u64,
    #[serde(default = "d_timeout_navigation_ms")]
    pub timeout_navigation_ms: u64,
    #[serde(default = "d_sleep_after_onload_ms")]
    pub sleep_after_onload_ms: u64,
    #[serde(default = "d_true")]
    pub wait_for_networkidle: bool,
    #[serde(default = "d_timeout_networkidle_ms")]
    pub timeout_networkidle_ms: u64,
    #[serde(default = "d_sleep_after_networkidle_ms")]
    pub sleep_after_networkidle_ms: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            name: BrowserEngine::default(),
            headless: true,
            width: 1280,
            height: 800,
            locale: d_locale(),
            user_agent: None,
            extensions: Vec::new(),
            scripts: Vec::new(),
            timeout_default_ms: d_timeout_default_ms(),
            timeout_navigation_ms: d_timeout_navigation_ms(),
            sleep_after_onload_ms: d_sleep_after_onload_ms(),
            wait_for_networkidle: true,
            timeout_networkidle_ms: d_timeout_networkidle_ms(),
            sleep_after_networkidle_ms: d_sleep_after_networkidle_ms(),
        }
    }
}

fn d_true() -> bool {
    true
}
fn d_1280() -> u32 {
    1280
}
fn d_800() -> u32 {
    800
}
fn d_locale() -> String {
    "en-US".into()
}
fn d_timeout_default_ms() -> u64 {
    30_000
}
fn d_timeout_navigation_ms() -> u64 {
    30_000
}
fn d_sleep_after_onload_ms() -> u64 {
    5_000
}
fn d_timeout_networkidle_ms() -> u64 {
    10_000
}
fn d_sleep_after_networkidle_ms() -> u64 {
    2_000
}
