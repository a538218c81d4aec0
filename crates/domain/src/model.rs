//! Core data model: scans, tasks, results, and the types that flow between
//! the dispatcher and the worker on the wire.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scan
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanType {
    Single,
    Range,
    GroundTruth,
    RescanLoginPages,
    Task,
    Scan,
    Tag,
}

/// Type-specific parameters for a [`Scan`]. Exactly the fields relevant to
/// `scan_type` are expected to be populated; the dispatcher does not enforce
/// this at the type level because the wire document is what downstream
/// analyzer configs key off of.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_scan_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tag_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    pub scan_id: String,
    pub scan_type: ScanType,
    #[serde(default)]
    pub params: ScanParams,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Scan {
    pub fn new(scan_type: ScanType, params: ScanParams) -> Self {
        Self {
            scan_id: Uuid::new_v4().to_string(),
            scan_type,
            params,
            created_at: chrono::Utc::now(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Task
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    RequestSent,
    RequestReceived,
    ResponseSent,
    ResponseReceived,
}

impl TaskState {
    /// The order below models the state machine:
    /// `REQUEST_SENT -> REQUEST_RECEIVED -> RESPONSE_SENT -> RESPONSE_RECEIVED`.
    pub fn next(self) -> Option<TaskState> {
        match self {
            TaskState::RequestSent => Some(TaskState::RequestReceived),
            TaskState::RequestReceived => Some(TaskState::ResponseSent),
            TaskState::ResponseSent => Some(TaskState::ResponseReceived),
            TaskState::ResponseReceived => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::ResponseReceived)
    }
}

/// The analyzer an emitted task is routed to; also the name of its broker
/// queue and its document-store collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalyzerKind {
    LandscapeAnalysis,
    PasskeyAnalysis,
    LoginTraceAnalysis,
    WildcardReceiverAnalysis,
}

impl AnalyzerKind {
    pub fn queue_name(self) -> &'static str {
        match self {
            AnalyzerKind::LandscapeAnalysis => "landscape_analysis",
            AnalyzerKind::PasskeyAnalysis => "passkey_analysis",
            AnalyzerKind::LoginTraceAnalysis => "login_trace_analysis",
            AnalyzerKind::WildcardReceiverAnalysis => "wildcard_receiver_analysis",
        }
    }

    pub fn collection_name(self) -> String {
        format!("{}_tres", self.queue_name())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskTimestamps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_sent: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_received: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_sent: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_received: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub task_id: String,
    pub task_state: TaskState,
    #[serde(flatten)]
    pub timestamps: TaskTimestamps,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    pub scan_id: String,
    pub scan_type: ScanType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u64>,
}

/// One unit of per-domain work. Mirrors the wire envelope's top-level keys
/// (`task_config`, `scan_config`, `domain`, `<analyzer>_config`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_config: TaskConfig,
    pub scan_config: ScanConfig,
    pub domain: String,
    pub analyzer: AnalyzerKind,
    pub analyzer_config: serde_json::Value,
}

impl Task {
    pub fn new(
        scan_config: ScanConfig,
        domain: impl Into<String>,
        analyzer: AnalyzerKind,
        analyzer_config: serde_json::Value,
    ) -> Self {
        Self {
            task_config: TaskConfig {
                task_id: Uuid::new_v4().to_string(),
                task_state: TaskState::RequestSent,
                timestamps: TaskTimestamps {
                    request_sent: Some(chrono::Utc::now()),
                    ..Default::default()
                },
            },
            scan_config,
            domain: domain.into(),
            analyzer,
            analyzer_config,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LoginPageCandidate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CandidateStrategy {
    Homepage,
    Manual,
    Paths,
    Crawling,
    Sitemap,
    Robots,
    Metasearch,
}

impl CandidateStrategy {
    /// Stable tie-break rank used when two candidates share a priority.
    /// Lower is preferred, matching the declaration order in §4.3.
    pub fn rank(self) -> u8 {
        match self {
            CandidateStrategy::Homepage => 0,
            CandidateStrategy::Manual => 1,
            CandidateStrategy::Paths => 2,
            CandidateStrategy::Crawling => 3,
            CandidateStrategy::Sitemap => 4,
            CandidateStrategy::Robots => 5,
            CandidateStrategy::Metasearch => 6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePriority {
    pub regex: Option<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResolved {
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPageCandidate {
    pub url: String,
    pub strategy: CandidateStrategy,
    pub priority: CandidatePriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<CandidateResolved>,
    #[serde(default)]
    pub info: serde_json::Value,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IdentityProviderDetection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IdpFrame {
    Topmost,
    Popup,
    Iframe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecognitionStrategy {
    Keyword,
    Logo,
    Request,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementCoordinates {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProviderDetection {
    pub idp_name: String,
    pub idp_integration: String,
    pub idp_frame: IdpFrame,
    pub login_page_url: String,
    pub element_coordinates: ElementCoordinates,
    pub element_inner_text: String,
    pub element_outer_html: String,
    pub element_tree: Vec<String>,
    pub recognition_strategy: RecognitionStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_matched: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_validity_tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_match_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp_login_request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp_screenshot: Option<serde_json::Value>,
}

/// `idp_integration = "CUSTOM"` is the catch-all for hand-rolled flows.
pub const IDP_INTEGRATION_CUSTOM: &str = "CUSTOM";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PasskeyDetection
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PasskeyDetectionMethod {
    Ui,
    Js,
    Keyword,
    Enterprise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    None,
    Low,
    Medium,
    High,
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::None
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PasskeyImplementation {
    pub captured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_options: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_options: Option<serde_json::Value>,
    #[serde(default)]
    pub credentials: Vec<serde_json::Value>,
    #[serde(default)]
    pub cdp_events: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasskeyDetection {
    pub detected: bool,
    pub detection_methods: HashSet<PasskeyDetectionMethod>,
    pub confidence: Confidence,
    pub indicators: Vec<String>,
    pub webauthn_api_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_coordinates: Option<ElementCoordinates>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_inner_text: Option<String>,
    #[serde(default)]
    pub implementation: PasskeyImplementation,
}

impl PasskeyDetection {
    /// Invariant: `detected ⇒ webauthn_api_available ∨ confidence ∈ {MEDIUM,HIGH}`.
    pub fn invariant_holds(&self) -> bool {
        if !self.detected {
            return true;
        }
        self.webauthn_api_available || self.confidence >= Confidence::Medium
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Password / MFA (C6)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordDetection {
    pub detected: bool,
    pub confidence: Confidence,
    pub login_page_url: String,
    pub has_username: bool,
    pub has_password: bool,
    pub has_submit: bool,
    #[serde(default)]
    pub lastpass_icon_detected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MfaType {
    Totp,
    Sms,
    Email,
    Qr,
    Custom,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MfaDetection {
    pub detected: bool,
    pub confidence: Confidence,
    pub login_page_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_type: Option<MfaType>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TaskResult
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDomain {
    pub reachable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Timings {
    #[serde(flatten)]
    pub stage_seconds: HashMap<String, f64>,
    pub total_duration_seconds: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthenticationMechanisms {
    #[serde(default)]
    pub passkey: Vec<PasskeyDetection>,
    #[serde(default)]
    pub mfa: Vec<MfaDetection>,
    #[serde(default)]
    pub password: Vec<PasswordDetection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub scan_id: String,
    pub resolved: ResolvedDomain,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub login_page_candidates: Vec<LoginPageCandidate>,
    #[serde(default)]
    pub authentication_mechanisms: AuthenticationMechanisms,
    #[serde(default)]
    pub identity_providers: Vec<IdentityProviderDetection>,
    pub metadata_available: HashMap<String, bool>,
    pub metadata_data: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
}

impl TaskResult {
    /// §8 invariant: every login_page_url referenced by a detection appears
    /// in the candidate list.
    pub fn login_page_urls_are_grounded(&self) -> bool {
        let candidate_urls: HashSet<&str> = self
            .login_page_candidates
            .iter()
            .map(|c| c.url.as_str())
            .collect();
        self.identity_providers
            .iter()
            .all(|d| candidate_urls.contains(d.login_page_url.as_str()))
            && self
                .authentication_mechanisms
                .password
                .iter()
                .all(|p| candidate_urls.contains(p.login_page_url.as_str()))
            && self
                .authentication_mechanisms
                .mfa
                .iter()
                .all(|m| candidate_urls.contains(m.login_page_url.as_str()))
    }

    /// §8: `login_page_candidates` must be non-increasing in priority.
    pub fn candidates_are_priority_sorted(&self) -> bool {
        self.login_page_candidates
            .windows(2)
            .all(|w| w[0].priority.priority >= w[1].priority.priority)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// IdpRuleset
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequestRuleParam {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequestRule {
    pub domain: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub params: Vec<LoginRequestRuleParam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SdkRule {
    pub name: String,
    pub login_request_rule: LoginRequestRule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdpDefinition {
    pub name: String,
    pub keywords: Vec<String>,
    pub logos: Vec<String>,
    pub login_request_rule: LoginRequestRule,
    #[serde(default)]
    pub passive_login_request_rule: Option<LoginRequestRule>,
    #[serde(default)]
    pub sdks: Vec<SdkRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdpRuleset {
    pub idps: Vec<IdpDefinition>,
}

impl IdpRuleset {
    pub fn get(&self, name: &str) -> Option<&IdpDefinition> {
        self.idps.iter().find(|d| d.name == name)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ScanTag
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tag consulted when the UI asks for "latest" results without an explicit
/// `scan_id`. Per DESIGN NOTES (c): if absent, callers fall back to "all
/// scans"; `authscope-dispatcher` implements that fallback at the query
/// boundary rather than here.
pub const LATEST_TAG: &str = "latest";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanTag {
    pub tag_name: String,
    pub scan_ids: HashSet<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BlobReference
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename = "reference")]
pub struct BlobReferenceData {
    pub bucket_name: String,
    pub object_name: String,
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobReference {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: BlobReferenceData,
}

impl BlobReference {
    pub fn new(bucket_name: impl Into<String>, object_name: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            kind: "reference".into(),
            data: BlobReferenceData {
                bucket_name: bucket_name.into(),
                object_name: object_name.into(),
                extension: extension.into(),
            },
        }
    }
}

/// Nested keys the dispatcher's blob-offload traversal recognizes (§4.9, §9
/// "Dynamic trees of artifacts"). Any mapping node with one of these keys
/// has its value replaced by a [`BlobReference`] during offload.
pub const BLOB_OFFLOAD_KEY_SUFFIXES: &[&str] = &["_screenshot", "_har", "_storage_state"];
pub const BLOB_OFFLOAD_KEYS_EXACT: &[&str] =
    &["element_tree_markup", "metadata_data", "sitemap", "robots"];

pub fn is_blob_offload_key(key: &str) -> bool {
    BLOB_OFFLOAD_KEYS_EXACT.contains(&key)
        || BLOB_OFFLOAD_KEY_SUFFIXES.iter().any(|suffix| key.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_state_advances_to_terminal() {
        let mut s = TaskState::RequestSent;
        let mut steps = 0;
        while let Some(next) = s.next() {
            s = next;
            steps += 1;
            assert!(steps <= 4);
        }
        assert!(s.is_terminal());
    }

    #[test]
    fn blob_offload_key_matches_suffix_and_exact() {
        assert!(is_blob_offload_key("idp_screenshot"));
        assert!(is_blob_offload_key("passkey_har"));
        assert!(is_blob_offload_key("metadata_data"));
        assert!(!is_blob_offload_key("domain"));
    }

    #[test]
    fn passkey_invariant_rejects_detected_without_support() {
        let mut p = PasskeyDetection {
            detected: true,
            detection_methods: HashSet::new(),
            confidence: Confidence::Low,
            indicators: Vec::new(),
            webauthn_api_available: false,
            element_coordinates: None,
            element_inner_text: None,
            implementation: PasskeyImplementation::default(),
        };
        assert!(!p.invariant_holds());
        p.webauthn_api_available = true;
        assert!(p.invariant_holds());
    }
}
