//! Login-page candidate generator (C3): runs the strategies named in
//! `login_page_strategy_scope`, merges their output, and dedups/sorts by
//! priority (§4.3).

pub mod crawling;
pub mod dedup;
pub mod homepage;
pub mod manual;
pub mod metasearch;
pub mod paths;
pub mod robots;
pub mod sitemap;
pub mod url_util;

use authscope_browser::BrowserContext;
use authscope_domain::config::LoginPageConfig;
use authscope_domain::error::Result;
use authscope_domain::model::LoginPageCandidate;

pub struct GenerationOutput {
    pub candidates: Vec<LoginPageCandidate>,
    /// Present only when the SITEMAP strategy ran and found a sitemap.
    pub sitemap: Option<Vec<serde_json::Value>>,
    /// Present only when the ROBOTS strategy ran and found `robots.txt`.
    pub robots: Option<String>,
}

/// Run every strategy named in `cfg.login_page_strategy_scope`, in scope
/// order, then merge and sort the results. `browser_ctx` is required only
/// when CRAWLING is in scope.
pub async fn generate(
    resolved_url: &str,
    cfg: &LoginPageConfig,
    client: &reqwest::Client,
    browser_ctx: Option<&BrowserContext>,
) -> Result<GenerationOutput> {
    let mut outputs: Vec<Vec<LoginPageCandidate>> = Vec::new();
    let mut sitemap = None;
    let mut robots = None;

    for strategy in &cfg.login_page_strategy_scope {
        match strategy.as_str() {
            "HOMEPAGE" => outputs.push(homepage::candidates(resolved_url, cfg)),
            "MANUAL" => outputs.push(manual::candidates(cfg)),
            "PATHS" => outputs.push(paths::candidates(client, resolved_url, cfg).await),
            "CRAWLING" => {
                if let Some(ctx) = browser_ctx {
                    outputs.push(crawling::candidates(ctx, resolved_url, cfg).await?);
                } else {
                    tracing::warn!("CRAWLING in strategy scope but no browser context provided");
                }
            }
            "SITEMAP" => {
                let (found, full) = sitemap::candidates(client, resolved_url, cfg).await;
                if !full.is_empty() {
                    sitemap = Some(full);
                }
                outputs.push(found);
            }
            "ROBOTS" => {
                let (found, body) = robots::candidates(client, resolved_url, cfg).await;
                if body.is_some() {
                    robots = body;
                }
                outputs.push(found);
            }
            "METASEARCH" => outputs.push(metasearch::candidates(client, resolved_url, cfg).await),
            other => tracing::warn!(strategy = other, "unknown login page strategy in scope"),
        }
    }

    Ok(GenerationOutput {
        candidates: dedup::merge(outputs),
        sitemap,
        robots,
    })
}
