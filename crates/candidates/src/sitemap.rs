//! SITEMAP strategy: recursively fetch `sitemap.xml` (following sitemap
//! indexes up to a recursion cap), keep URLs matching a priority rule on the
//! same registrable domain (§4.3).
//!
//! No XML/sitemap crate exists anywhere in the retrieval pack, so entries
//! are pulled out with a small set of regexes rather than a full parser —
//! sitemaps are a constrained enough dialect that this holds up in practice.

use regex::Regex;
use std::sync::OnceLock;

use authscope_domain::config::LoginPageConfig;
use authscope_domain::model::{CandidateStrategy, LoginPageCandidate};

use crate::url_util::{is_same_etld1, normalize, prio_of_url};

#[derive(Debug, Clone)]
struct SitemapUrlEntry {
    loc: String,
    priority: Option<f64>,
    last_modified: Option<String>,
    change_frequency: Option<String>,
}

fn loc_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<loc>\s*(.*?)\s*</loc>").unwrap())
}

fn url_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<url>(.*?)</url>").unwrap())
}

fn sitemap_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<sitemap>(.*?)</sitemap>").unwrap())
}

fn field_re(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}>\s*(.*?)\s*</{tag}>")).unwrap()
}

pub async fn candidates(
    client: &reqwest::Client,
    resolved_url: &str,
    cfg: &LoginPageConfig,
) -> (Vec<LoginPageCandidate>, Vec<serde_json::Value>) {
    let base = match url::Url::parse(resolved_url) {
        Ok(u) => format!("{}://{}", u.scheme(), u.host_str().unwrap_or_default()),
        Err(_) => return (Vec::new(), Vec::new()),
    };
    let root_sitemap = format!("{base}/sitemap.xml");

    let mut full_sitemap = Vec::new();
    let mut visited = std::collections::HashSet::new();
    fetch_recursive(
        client,
        &root_sitemap,
        0,
        cfg.sitemap_strategy_config.max_recursion_depth,
        cfg.sitemap_strategy_config.max_urls as usize,
        &mut full_sitemap,
        &mut visited,
    )
    .await;

    let mut prio_sitemap: Vec<LoginPageCandidate> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let mut full_sitemap_json = Vec::with_capacity(full_sitemap.len());

    for entry in &full_sitemap {
        full_sitemap_json.push(serde_json::json!({
            "url": entry.loc,
            "priority": entry.priority,
            "last_modified": entry.last_modified,
            "change_frequency": entry.change_frequency,
        }));

        let priority = prio_of_url(&entry.loc, &cfg.login_page_url_regexes);
        if priority.priority <= 0 || !is_same_etld1(resolved_url, &entry.loc) {
            continue;
        }
        let normalized = normalize(&entry.loc);
        if !seen.insert(normalized.clone()) {
            continue;
        }
        prio_sitemap.push(LoginPageCandidate {
            url: normalized,
            strategy: CandidateStrategy::Sitemap,
            priority,
            resolved: None,
            info: serde_json::json!({
                "priority": entry.priority,
                "last_modified": entry.last_modified,
                "change_frequency": entry.change_frequency,
            }),
        });
    }

    prio_sitemap.sort_by(|a, b| b.priority.priority.cmp(&a.priority.priority));
    (prio_sitemap, full_sitemap_json)
}

fn fetch_recursive<'a>(
    client: &'a reqwest::Client,
    sitemap_url: &'a str,
    depth: u32,
    max_depth: u32,
    max_urls: usize,
    out: &'a mut Vec<SitemapUrlEntry>,
    visited: &'a mut std::collections::HashSet<String>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send + 'a>> {
    Box::pin(async move {
        if depth > max_depth || out.len() >= max_urls || !visited.insert(sitemap_url.to_string()) {
            return;
        }
        let Ok(resp) = client.get(sitemap_url).send().await else { return };
        if resp.status().as_u16() != 200 {
            return;
        }
        let Ok(body) = resp.text().await else { return };

        if sitemap_block_re().is_match(&body) {
            for cap in sitemap_block_re().captures_iter(&body) {
                if out.len() >= max_urls {
                    break;
                }
                if let Some(loc) = loc_re().captures(&cap[1]).and_then(|c| c.get(1)) {
                    fetch_recursive(client, loc.as_str(), depth + 1, max_depth, max_urls, out, visited).await;
                }
            }
            return;
        }

        let priority_re = field_re("priority");
        let lastmod_re = field_re("lastmod");
        let changefreq_re = field_re("changefreq");

        for cap in url_block_re().captures_iter(&body) {
            if out.len() >= max_urls {
                break;
            }
            let block = &cap[1];
            let Some(loc) = loc_re().captures(block).and_then(|c| c.get(1)) else { continue };
            out.push(SitemapUrlEntry {
                loc: loc.as_str().to_string(),
                priority: priority_re
                    .captures(block)
                    .and_then(|c| c.get(1))
                    .and_then(|m| m.as_str().parse().ok()),
                last_modified: lastmod_re.captures(block).map(|c| c[1].to_string()),
                change_frequency: changefreq_re.captures(block).map(|c| c[1].to_string()),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loc_regex_extracts_single_url() {
        let xml = "<url><loc>https://example.com/login</loc><priority>0.8</priority></url>";
        let caps = url_block_re().captures(xml).unwrap();
        let loc = loc_re().captures(&caps[1]).unwrap();
        assert_eq!(&loc[1], "https://example.com/login");
    }

    #[test]
    fn sitemap_index_block_detected() {
        let xml = "<sitemapindex><sitemap><loc>https://example.com/sitemap-1.xml</loc></sitemap></sitemapindex>";
        assert!(sitemap_block_re().is_match(xml));
    }
}
