//! Merge strategy outputs into the final candidate list: dedup by normalized
//! URL keeping the first occurrence, then stable-sort by priority desc,
//! strategy rank, insertion order (§4.3).

use authscope_domain::model::LoginPageCandidate;

pub fn merge(strategy_outputs: Vec<Vec<LoginPageCandidate>>) -> Vec<LoginPageCandidate> {
    let mut seen = std::collections::HashSet::new();
    let mut merged: Vec<LoginPageCandidate> = Vec::new();

    for output in strategy_outputs {
        for candidate in output {
            if seen.insert(candidate.url.clone()) {
                merged.push(candidate);
            }
        }
    }

    // Stable sort preserves insertion order among equal (priority, rank) keys.
    merged.sort_by(|a, b| {
        b.priority
            .priority
            .cmp(&a.priority.priority)
            .then(a.strategy.rank().cmp(&b.strategy.rank()))
    });

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use authscope_domain::model::{CandidatePriority, CandidateStrategy};

    fn candidate(url: &str, strategy: CandidateStrategy, priority: i32) -> LoginPageCandidate {
        LoginPageCandidate {
            url: url.into(),
            strategy,
            priority: CandidatePriority { regex: None, priority },
            resolved: None,
            info: serde_json::Value::Null,
        }
    }

    #[test]
    fn dedup_keeps_first_seen() {
        let a = candidate("https://example.com/login", CandidateStrategy::Homepage, 5);
        let b = candidate("https://example.com/login", CandidateStrategy::Paths, 9);
        let merged = merge(vec![vec![a], vec![b]]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].strategy, CandidateStrategy::Homepage);
    }

    #[test]
    fn sort_is_priority_desc_then_strategy_rank() {
        let low = candidate("https://example.com/a", CandidateStrategy::Sitemap, 1);
        let high = candidate("https://example.com/b", CandidateStrategy::Robots, 9);
        let tie_early = candidate("https://example.com/c", CandidateStrategy::Homepage, 5);
        let tie_late = candidate("https://example.com/d", CandidateStrategy::Crawling, 5);
        let merged = merge(vec![vec![low, high, tie_early, tie_late]]);
        let urls: Vec<&str> = merged.iter().map(|c| c.url.as_str()).collect();
        assert_eq!(urls, vec![
            "https://example.com/b",
            "https://example.com/c",
            "https://example.com/d",
            "https://example.com/a",
        ]);
    }
}
