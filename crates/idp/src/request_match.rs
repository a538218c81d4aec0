//! `login_request_rule` matching and SDK/integration classification (§4.4).

use regex::Regex;
use url::Url;

use authscope_domain::model::{IdpDefinition, LoginRequestRule};
use authscope_domain::model::IDP_INTEGRATION_CUSTOM;

/// Whether `observed_url` satisfies a `login_request_rule`: domain regex
/// against the host, optional path regex against the path, and every
/// declared param must have a query parameter whose name and value both
/// match their respective regexes.
pub fn matches(rule: &LoginRequestRule, observed_url: &str) -> bool {
    let Ok(url) = Url::parse(observed_url) else { return false };
    let Some(host) = url.host_str() else { return false };

    if !regex_matches(&rule.domain, host) {
        return false;
    }
    if let Some(path_pattern) = &rule.path {
        if !regex_matches(path_pattern, url.path()) {
            return false;
        }
    }
    for param in &rule.params {
        let found = url.query_pairs().any(|(k, v)| regex_matches(&param.name, &k) && regex_matches(&param.value, &v));
        if !found {
            return false;
        }
    }
    true
}

fn regex_matches(pattern: &str, value: &str) -> bool {
    Regex::new(pattern).map(|re| re.is_match(value)).unwrap_or(false)
}

/// First SDK (in declaration order, `CUSTOM` excluded) whose
/// `login_request_rule` matches, or `CUSTOM` if none do.
pub fn classify_integration(idp: &IdpDefinition, observed_url: &str) -> String {
    idp.sdks
        .iter()
        .filter(|s| s.name != IDP_INTEGRATION_CUSTOM)
        .find(|s| matches(&s.login_request_rule, observed_url))
        .map(|s| s.name.clone())
        .unwrap_or_else(|| IDP_INTEGRATION_CUSTOM.to_string())
}

/// Phrases that put an anchor in a genuine sign-in context even when it
/// looks like a generic social share/follow link.
const SIGN_IN_CONTEXT_TOKENS: &[&str] = &["sign in", "log in", "login", "continue with", "connect with"];

/// Rejects anchors that look like third-party social *share* links
/// (`target="_blank" rel="noopener"`) rather than sign-in affordances,
/// unless the surrounding text carries a sign-in context token (§4.4).
pub fn is_out_of_context_social_link(outer_html: &str, inner_text: &str) -> bool {
    let lower_html = outer_html.to_lowercase();
    let looks_like_share_link = lower_html.contains("target=\"_blank\"") && lower_html.contains("noopener");
    if !looks_like_share_link {
        return false;
    }
    let lower_text = inner_text.to_lowercase();
    !SIGN_IN_CONTEXT_TOKENS.iter().any(|t| lower_text.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use authscope_domain::model::LoginRequestRuleParam;

    fn google_rule() -> LoginRequestRule {
        LoginRequestRule {
            domain: r"^accounts\.google\.com$".into(),
            path: Some(r"/oauth2".into()),
            params: vec![LoginRequestRuleParam { name: "^client_id$".into(), value: ".*".into() }],
        }
    }

    #[test]
    fn matches_domain_path_and_params() {
        let url = "https://accounts.google.com/o/oauth2/auth?client_id=abc123&scope=email";
        assert!(matches(&google_rule(), url));
    }

    #[test]
    fn rejects_wrong_domain() {
        let url = "https://evil.example.com/oauth2?client_id=abc";
        assert!(!matches(&google_rule(), url));
    }

    #[test]
    fn rejects_missing_required_param() {
        let url = "https://accounts.google.com/oauth2?scope=email";
        assert!(!matches(&google_rule(), url));
    }

    #[test]
    fn social_share_link_without_context_is_out_of_context() {
        let html = r#"<a href="https://facebook.com/share" target="_blank" rel="noopener">Share</a>"#;
        assert!(is_out_of_context_social_link(html, "Share"));
    }

    #[test]
    fn social_link_with_sign_in_text_is_in_context() {
        let html = r#"<a href="https://facebook.com/oauth" target="_blank" rel="noopener">Sign in with Facebook</a>"#;
        assert!(!is_out_of_context_social_link(html, "Sign in with Facebook"));
    }
}
