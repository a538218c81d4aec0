use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SSO/IdP detector (C4)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpConfig {
    #[serde(default = "d_idp_scope")]
    pub idp_scope: Vec<String>,
}

impl Default for IdpConfig {
    fn default() -> Self {
        Self {
            idp_scope: d_idp_scope(),
        }
    }
}

fn d_idp_scope() -> Vec<String> {
    vec![
        "GOOGLE".into(),
        "APPLE".into(),
        "FACEBOOK".into(),
        "MICROSOFT".into(),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecognitionMode {
    Fast,
    Normal,
    Extensive,
}

impl Default for RecognitionMode {
    fn default() -> Self {
        RecognitionMode::Normal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionConfig {
    #[serde(default)]
    pub recognition_mode: RecognitionMode,
    #[serde(default = "d_recognition_strategy_scope")]
    pub recognition_strategy_scope: Vec<String>,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            recognition_mode: RecognitionMode::default(),
            recognition_strategy_scope: d_recognition_strategy_scope(),
        }
    }
}

fn d_recognition_strategy_scope() -> Vec<String> {
    vec![
        "KEYWORD-CSS".into(),
        "KEYWORD-XPATH".into(),
        "KEYWORD-ACCESSIBILITY".into(),
        "LOGO".into(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRecognitionConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub xpath: Vec<String>,
    #[serde(default = "d_max_elements_to_click")]
    pub max_elements_to_click: u32,
}

impl Default for KeywordRecognitionConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            xpath: Vec::new(),
            max_elements_to_click: d_max_elements_to_click(),
        }
    }
}

fn d_max_elements_to_click() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleSpace {
    Linspace,
    Geomspace,
}

impl Default for ScaleSpace {
    fn default() -> Self {
        ScaleSpace::Linspace
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleOrder {
    Ascending,
    Descending,
}

impl Default for ScaleOrder {
    fn default() -> Self {
        ScaleOrder::Descending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMethod {
    ScaleTemplate,
    ScaleScreenshot,
}

impl Default for ScaleMethod {
    fn default() -> Self {
        ScaleMethod::ScaleTemplate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchAlgorithm {
    Correlation,
    SumOfSquaredDiffs,
}

impl Default for MatchAlgorithm {
    fn default() -> Self {
        MatchAlgorithm::Correlation
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoRecognitionConfig {
    /// Directory holding one template PNG per `IdpDefinition.logos` entry
    /// (§4.4). A missing file for a given IdP just skips the LOGO strategy
    /// for that IdP rather than failing the task.
    #[serde(default = "d_assets_dir")]
    pub assets_dir: String,
    #[serde(default = "d_logo_size")]
    pub logo_size: u32,
    #[serde(default = "d_max_elements_to_click")]
    pub max_elements_to_click: u32,
    #[serde(default = "d_max_matching")]
    pub max_matching: f64,
    #[serde(default = "d_upper_bound")]
    pub upper_bound: f64,
    #[serde(default = "d_lower_bound")]
    pub lower_bound: f64,
    #[serde(default = "d_scale_upper_bound")]
    pub scale_upper_bound: f64,
    #[serde(default = "d_scale_lower_bound")]
    pub scale_lower_bound: f64,
    #[serde(default)]
    pub scale_method: ScaleMethod,
    #[serde(default)]
    pub scale_space: ScaleSpace,
    #[serde(default)]
    pub scale_order: ScaleOrder,
    #[serde(default = "d_match_intensity")]
    pub match_intensity: u32,
    #[serde(default)]
    pub match_algorithm: MatchAlgorithm,
}

impl Default for LogoRecognitionConfig {
    fn default() -> Self {
        Self {
            assets_dir: d_assets_dir(),
            logo_size: d_logo_size(),
            max_elements_to_click: d_max_elements_to_click(),
            max_matching: d_max_matching(),
            upper_bound: d_upper_bound(),
            lower_bound: d_lower_bound(),
            scale_upper_bound: d_scale_upper_bound(),
            scale_lower_bound: d_scale_lower_bound(),
            scale_method: ScaleMethod::default(),
            scale_space: ScaleSpace::default(),
            scale_order: ScaleOrder::default(),
            match_intensity: d_match_intensity(),
            match_algorithm: MatchAlgorithm::default(),
        }
    }
}

/// Clamp a locator-configured scale bound to a floor of 0.05.
pub fn clamp_scale_bound(value: f64) -> f64 {
    value.max(0.05)
}

fn d_assets_dir() -> String {
    "assets/logos".into()
}
fn d_logo_size() -> u32 {
    64
}
fn d_max_matching() -> f64 {
    0.92
}
fn d_upper_bound() -> f64 {
    0.80
}
fn d_lower_bound() -> f64 {
    0.55
}
fn d_scale_upper_bound() -> f64 {
    2.0
}
fn d_scale_lower_bound() -> f64 {
    0.5
}
fn d_match_intensity() -> u32 {
    10
}
