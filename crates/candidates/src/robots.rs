//! ROBOTS strategy: fetch `/robots.txt` (must be `text/plain` per RFC 9309),
//! extract Allow/Disallow paths, keep the ones matching a priority rule
//! (§4.3).

use authscope_domain::config::LoginPageConfig;
use authscope_domain::model::{CandidateStrategy, LoginPageCandidate};

use crate::url_util::{normalize, prio_of_url};

const MAX_CANDIDATES: usize = 10;

pub async fn candidates(
    client: &reqwest::Client,
    resolved_url: &str,
    cfg: &LoginPageConfig,
) -> (Vec<LoginPageCandidate>, Option<String>) {
    let Ok(parsed) = url::Url::parse(resolved_url) else {
        return (Vec::new(), None);
    };
    let robots_url = format!("{}://{}/robots.txt", parsed.scheme(), parsed.host_str().unwrap_or_default());

    let resp = match client.get(&robots_url).send().await {
        Ok(r) => r,
        Err(_) => return (Vec::new(), None),
    };
    let is_text_plain = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("text/plain"))
        .unwrap_or(false);
    if resp.status().as_u16() != 200 || !is_text_plain {
        return (Vec::new(), None);
    }
    let Ok(body) = resp.text().await else {
        return (Vec::new(), None);
    };

    let base = format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or_default());
    let mut candidates: Vec<LoginPageCandidate> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for (directive, path) in paths_from_robots_txt(&body) {
        let candidate_url = format!("{base}{path}");
        let priority = prio_of_url(&candidate_url, &cfg.login_page_url_regexes);
        if priority.priority <= 0 {
            continue;
        }
        let normalized = normalize(&candidate_url);
        if !seen.insert(normalized.clone()) {
            continue;
        }
        candidates.push(LoginPageCandidate {
            url: normalized,
            strategy: CandidateStrategy::Robots,
            priority,
            resolved: None,
            info: serde_json::json!({ "directive": directive, "path": path }),
        });
    }

    candidates.sort_by(|a, b| b.priority.priority.cmp(&a.priority.priority));
    candidates.truncate(MAX_CANDIDATES);
    (candidates, Some(body))
}

/// Extract `(directive, path)` pairs from Allow/Disallow lines, mirroring
/// Python's `urllib.robotparser` tokenizer.
fn paths_from_robots_txt(body: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw_line in body.lines() {
        let line = raw_line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else { continue };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        if matches!(key.as_str(), "allow" | "disallow") && value.starts_with('/') {
            out.push((key, value.to_string()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_allow_and_disallow_lines() {
        let body = "User-agent: *\nDisallow: /admin\nAllow: /login # comment\nSitemap: https://x/s.xml\n";
        let paths = paths_from_robots_txt(body);
        assert_eq!(paths, vec![
            ("disallow".to_string(), "/admin".to_string()),
            ("allow".to_string(), "/login".to_string()),
        ]);
    }

    #[test]
    fn ignores_non_path_values() {
        let body = "Disallow: \nAllow: relative-no-slash\n";
        assert!(paths_from_robots_txt(body).is_empty());
    }
}
