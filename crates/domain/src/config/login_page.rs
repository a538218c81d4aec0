use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Login-page candidate generator (C3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityRule {
    pub regex: String,
    pub priority: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathsStrategyConfig {
    #[serde(default)]
    pub paths: Vec<String>,
    /// Extra subdomain labels to probe the path list against, in addition to
    /// the resolved host itself — `"accounts"` turns into
    /// `{scheme}://accounts.{registrable_domain}` (§4.3).
    #[serde(default)]
    pub subdomains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlingStrategyConfig {
    #[serde(default = "d_max_elements_to_click")]
    pub max_elements_to_click: u32,
    #[serde(default)]
    pub login_keywords: Vec<String>,
}

impl Default for CrawlingStrategyConfig {
    fn default() -> Self {
        Self {
            max_elements_to_click: d_max_elements_to_click(),
            login_keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SitemapStrategyConfig {
    #[serde(default = "d_max_sitemap_depth")]
    pub max_recursion_depth: u32,
    #[serde(default = "d_max_sitemap_urls")]
    pub max_urls: u32,
}

impl Default for SitemapStrategyConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: d_max_sitemap_depth(),
            max_urls: d_max_sitemap_urls(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RobotsStrategyConfig {
    #[serde(default)]
    pub respect_disallow_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetasearchStrategyConfig {
    #[serde(default = "d_metasearch_endpoint")]
    pub endpoint: String,
    #[serde(default = "d_search_term")]
    pub search_term: String,
    #[serde(default = "d_search_results_number")]
    pub search_results_number: u32,
}

impl Default for MetasearchStrategyConfig {
    fn default() -> Self {
        Self {
            endpoint: d_metasearch_endpoint(),
            search_term: d_search_term(),
            search_results_number: d_search_results_number(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ManualStrategyConfig {
    #[serde(default)]
    pub urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPageConfig {
    #[serde(default)]
    pub login_page_url_regexes: Vec<PriorityRule>,
    #[serde(default = "d_strategy_scope")]
    pub login_page_strategy_scope: Vec<String>,
    #[serde(default)]
    pub paths_strategy_config: PathsStrategyConfig,
    #[serde(default)]
    pub crawling_strategy_config: CrawlingStrategyConfig,
    #[serde(default)]
    pub sitemap_strategy_config: SitemapStrategyConfig,
    #[serde(default)]
    pub robots_strategy_config: RobotsStrategyConfig,
    #[serde(default)]
    pub metasearch_strategy_config: MetasearchStrategyConfig,
    #[serde(default)]
    pub manual_strategy_config: ManualStrategyConfig,
}

impl Default for LoginPageConfig {
    fn default() -> Self {
        Self {
            login_page_url_regexes: Vec::new(),
            login_page_strategy_scope: d_strategy_scope(),
            paths_strategy_config: PathsStrategyConfig::default(),
            crawling_strategy_config: CrawlingStrategyConfig::default(),
            sitemap_strategy_config: SitemapStrategyConfig::default(),
            robots_strategy_config: RobotsStrategyConfig::default(),
            metasearch_strategy_config: MetasearchStrategyConfig::default(),
            manual_strategy_config: ManualStrategyConfig::default(),
        }
    }
}

fn d_max_elements_to_click() -> u32 {
    10
}
fn d_max_sitemap_depth() -> u32 {
    3
}
fn d_max_sitemap_urls() -> u32 {
    5_000
}
fn d_metasearch_endpoint() -> String {
    "https://searx.be/search".into()
}
fn d_search_term() -> String {
    "login %s".into()
}
fn d_search_results_number() -> u32 {
    20
}
fn d_strategy_scope() -> Vec<String> {
    vec!["HOMEPAGE".into(), "PATHS".into(), "CRAWLING".into()]
}
