//! PATHS strategy: probe a fixed list of well-known paths (`/login`,
//! `/signin`, ...) against the resolved host and, optionally, a set of
//! subdomains of its registrable domain (`accounts.example.com`,
//! `login.example.com`, ...), gated by a random-path sanity check per base
//! so a host that answers 200 to everything doesn't produce false
//! positives (§4.3). The first 200 across every base wins.

use uuid::Uuid;

use authscope_domain::config::LoginPageConfig;
use authscope_domain::model::{CandidateStrategy, LoginPageCandidate};

use crate::url_util::{normalize, prio_of_url, registrable_domain};

pub async fn candidates(
    client: &reqwest::Client,
    resolved_url: &str,
    cfg: &LoginPageConfig,
) -> Vec<LoginPageCandidate> {
    let Ok(parsed) = url::Url::parse(resolved_url) else {
        return Vec::new();
    };
    let Some(host) = parsed.host_str() else {
        return Vec::new();
    };
    let scheme = parsed.scheme();
    let etld1 = registrable_domain(host);

    let mut bases = vec![format!("{scheme}://{host}")];
    bases.extend(
        cfg.paths_strategy_config
            .subdomains
            .iter()
            .map(|subdomain| format!("{scheme}://{subdomain}.{etld1}")),
    );

    for base in &bases {
        if !sanity_check(client, base).await {
            tracing::info!(base = %base, "paths strategy not suitable on this base, random path returned 200");
            continue;
        }

        for path in &cfg.paths_strategy_config.paths {
            let candidate_url = format!("{base}{path}");
            match client.get(&candidate_url).send().await {
                Ok(resp) if resp.status().as_u16() == 200 => {
                    let url = normalize(resp.url().as_str());
                    let priority = prio_of_url(&url, &cfg.login_page_url_regexes);
                    return vec![LoginPageCandidate {
                        url,
                        strategy: CandidateStrategy::Paths,
                        priority,
                        resolved: None,
                        info: serde_json::json!({ "path": path, "base": base }),
                    }];
                }
                _ => continue,
            }
        }
    }
    Vec::new()
}

/// A random UUID path should 404. If it instead returns 200, the host
/// serves everything and path probing would be meaningless.
async fn sanity_check(client: &reqwest::Client, base: &str) -> bool {
    let random_url = format!("{base}/{}", Uuid::new_v4());
    match client.get(&random_url).send().await {
        Ok(resp) => resp.status().as_u16() != 200,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_url_formats_scheme_host_path() {
        let base = "https://example.com";
        let path = "/login";
        assert_eq!(format!("{base}{path}"), "https://example.com/login");
    }

    #[test]
    fn subdomain_bases_are_built_against_the_registrable_domain() {
        let host = "app.example.com";
        let etld1 = registrable_domain(host);
        let bases: Vec<String> = ["accounts", "login"]
            .iter()
            .map(|subdomain| format!("https://{subdomain}.{etld1}"))
            .collect();
        assert_eq!(bases, vec!["https://accounts.example.com", "https://login.example.com"]);
    }
}
