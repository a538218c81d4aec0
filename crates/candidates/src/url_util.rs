//! URL normalization, registrable-domain comparison, and priority scoring
//! shared by every candidate-generation strategy (§4.3).

use regex::Regex;
use url::Url;

use authscope_domain::config::PriorityRule;
use authscope_domain::model::CandidatePriority;

/// Normalize a URL for dedup purposes: lowercase scheme/host, drop the
/// fragment, drop a trailing slash on a bare path. Idempotent — normalizing
/// an already-normalized URL returns it unchanged (§8 round-trip property).
pub fn normalize(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };
    url.set_fragment(None);
    if url.path() == "/" {
        url.set_path("");
    } else if url.path().ends_with('/') {
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }
    let mut out = url.to_string();
    if out.ends_with('/') && Url::parse(&out).map(|u| u.path() == "/").unwrap_or(false) {
        out.pop();
    }
    out
}

/// Best-effort registrable-domain extraction: the last two labels of the
/// host, or the last three when the second-to-last label is a known
/// multi-part public suffix component (co, com, org, gov, ac, edu). No
/// public-suffix-list crate exists in the corpus, so this is a heuristic,
/// not an authoritative PSL match.
pub(crate) fn registrable_domain(host: &str) -> String {
    const SECOND_LEVEL: &[&str] = &["co", "com", "org", "gov", "ac", "edu", "net"];
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_ascii_lowercase();
    }
    let second_to_last = labels[labels.len() - 2];
    let take = if SECOND_LEVEL.contains(&second_to_last) && labels.len() >= 3 {
        3
    } else {
        2
    };
    labels[labels.len() - take..].join(".").to_ascii_lowercase()
}

/// Whether `candidate` shares a registrable domain with `base`.
pub fn is_same_etld1(base: &str, candidate: &str) -> bool {
    let (Ok(b), Ok(c)) = (Url::parse(base), Url::parse(candidate)) else {
        return false;
    };
    match (b.host_str(), c.host_str()) {
        (Some(bh), Some(ch)) => registrable_domain(bh) == registrable_domain(ch),
        _ => false,
    }
}

/// Score a URL against the configured priority rules: the max priority over
/// every matching regex, or `{regex: None, priority: 0}` if nothing matches.
pub fn prio_of_url(candidate: &str, rules: &[PriorityRule]) -> CandidatePriority {
    let mut best = CandidatePriority { regex: None, priority: 0 };
    for rule in rules {
        let Ok(re) = Regex::new(&rule.regex) else { continue };
        if re.is_match(candidate) && rule.priority > best.priority {
            best = CandidatePriority {
                regex: Some(rule.regex.clone()),
                priority: rule.priority,
            };
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_trailing_slash_and_fragment() {
        assert_eq!(normalize("https://example.com/login/#panel"), "https://example.com/login");
        assert_eq!(normalize("https://example.com/"), "https://example.com");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("https://Example.com/Login/");
        let twice = normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn same_etld1_ignores_subdomain() {
        assert!(is_same_etld1("https://example.com", "https://accounts.example.com/login"));
        assert!(!is_same_etld1("https://example.com", "https://example.org/login"));
    }

    #[test]
    fn same_etld1_handles_second_level_suffix() {
        assert!(is_same_etld1("https://example.co.uk", "https://login.example.co.uk"));
        assert!(!is_same_etld1("https://example.co.uk", "https://other.co.uk"));
    }

    #[test]
    fn prio_of_url_picks_max_matching_priority() {
        let rules = vec![
            PriorityRule { regex: "login".into(), priority: 5 },
            PriorityRule { regex: "signin".into(), priority: 8 },
        ];
        let result = prio_of_url("https://example.com/signin", &rules);
        assert_eq!(result.priority, 8);
    }

    #[test]
    fn prio_of_url_defaults_to_zero() {
        let result = prio_of_url("https://example.com/about", &[]);
        assert_eq!(result.priority, 0);
    }
}
