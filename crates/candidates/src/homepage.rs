//! HOMEPAGE strategy: the resolved URL itself is the only candidate.

use authscope_domain::config::LoginPageConfig;
use authscope_domain::model::{CandidateStrategy, LoginPageCandidate};

use crate::url_util::{normalize, prio_of_url};

pub fn candidates(resolved_url: &str, cfg: &LoginPageConfig) -> Vec<LoginPageCandidate> {
    let url = normalize(resolved_url);
    let priority = prio_of_url(&url, &cfg.login_page_url_regexes);
    vec![LoginPageCandidate {
        url,
        strategy: CandidateStrategy::Homepage,
        priority,
        resolved: None,
        info: serde_json::Value::Null,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn homepage_always_emits_resolved_url() {
        let out = candidates("https://example.com/", &LoginPageConfig::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].url, "https://example.com");
    }
}
