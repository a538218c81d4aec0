//! METASEARCH strategy: query a SearxNG-shaped metasearch endpoint, paging
//! until enough same-eTLD+1 results are collected. Results are NOT
//! re-sorted by priority — engine ordering from the search service is
//! preserved (§4.3).

use serde::Deserialize;

use authscope_domain::config::LoginPageConfig;
use authscope_domain::model::{CandidateStrategy, LoginPageCandidate};

use crate::url_util::{is_same_etld1, normalize, prio_of_url, registrable_domain};

#[derive(Debug, Deserialize)]
struct SearxResponse {
    results: Vec<SearxResult>,
    #[serde(default)]
    unresponsive_engines: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize, Clone)]
struct SearxResult {
    url: String,
    #[serde(default)]
    engines: Vec<String>,
}

pub async fn candidates(
    client: &reqwest::Client,
    resolved_url: &str,
    cfg: &LoginPageConfig,
) -> Vec<LoginPageCandidate> {
    let strategy_cfg = &cfg.metasearch_strategy_config;
    let target = strategy_cfg.search_results_number as usize;

    let Some(host) = url::Url::parse(resolved_url).ok().and_then(|u| u.host_str().map(String::from)) else {
        return Vec::new();
    };
    let etld1 = registrable_domain(&host);
    let query = strategy_cfg.search_term.replace("%s", &etld1);

    let mut out: Vec<LoginPageCandidate> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut hit_counter = 0u32;
    let mut page_no = 1u32;

    loop {
        let prev_len = out.len();
        let resp = client
            .get(&strategy_cfg.endpoint)
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("safesearch", "0"),
                ("pageno", &page_no.to_string()),
            ])
            .header("Accept", "application/json")
            .send()
            .await;

        let parsed: SearxResponse = match resp {
            Ok(r) if r.status().as_u16() == 200 => match r.json().await {
                Ok(p) => p,
                Err(_) => break,
            },
            _ => break,
        };
        if !parsed.unresponsive_engines.is_empty() {
            tracing::info!(count = parsed.unresponsive_engines.len(), "metasearch engines unresponsive");
        }
        let results_len = parsed.results.len();

        for result in &parsed.results {
            hit_counter += 1;
            if !is_same_etld1(resolved_url, &result.url) {
                continue;
            }
            let normalized = normalize(&result.url);
            if !seen.insert(normalized.clone()) {
                continue;
            }
            let priority = prio_of_url(&result.url, &cfg.login_page_url_regexes);
            out.push(LoginPageCandidate {
                url: normalized,
                strategy: CandidateStrategy::Metasearch,
                priority,
                resolved: None,
                info: serde_json::json!({
                    "result_hit": hit_counter,
                    "result_engines": result.engines,
                }),
            });
            if out.len() >= target {
                break;
            }
        }

        if out.len() >= target || results_len == 0 || out.len() == prev_len {
            break;
        }
        page_no += 1;
    }

    out.truncate(target);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_term_substitutes_host() {
        let term = "login %s".replace("%s", "example.com");
        assert_eq!(term, "login example.com");
    }

    #[test]
    fn default_search_term_contains_a_substitution_placeholder() {
        let cfg = authscope_domain::config::LoginPageConfig::default();
        assert!(cfg.metasearch_strategy_config.search_term.contains("%s"));
    }

    #[test]
    fn query_substitutes_registrable_domain_not_full_host() {
        let cfg = authscope_domain::config::LoginPageConfig::default();
        let strategy_cfg = &cfg.metasearch_strategy_config;
        let etld1 = registrable_domain("accounts.example.com");
        let query = strategy_cfg.search_term.replace("%s", &etld1);
        assert_eq!(query, "login example.com");
    }
}
