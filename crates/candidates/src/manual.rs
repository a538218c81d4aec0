//! MANUAL strategy: operator-configured URLs, taken verbatim. Also used to
//! seed candidates for `rescan-login-pages` and `ground-truth` scans (§3),
//! which is why `from_urls` is exposed separately from the config-driven
//! entry point.

use authscope_domain::config::LoginPageConfig;
use authscope_domain::model::{CandidateStrategy, LoginPageCandidate};

use crate::url_util::{normalize, prio_of_url};

pub fn candidates(cfg: &LoginPageConfig) -> Vec<LoginPageCandidate> {
    from_urls(&cfg.manual_strategy_config.urls, &cfg.login_page_url_regexes)
}

pub fn from_urls(urls: &[String], rules: &[authscope_domain::config::PriorityRule]) -> Vec<LoginPageCandidate> {
    urls.iter()
        .map(|u| {
            let url = normalize(u);
            let priority = prio_of_url(&url, rules);
            LoginPageCandidate {
                url,
                strategy: CandidateStrategy::Manual,
                priority,
                resolved: None,
                info: serde_json::Value::Null,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_emits_every_configured_url() {
        let mut cfg = LoginPageConfig::default();
        cfg.manual_strategy_config.urls = vec!["https://example.com/signin".into()];
        let out = candidates(&cfg);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].strategy, CandidateStrategy::Manual);
    }
}
