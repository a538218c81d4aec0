use serde::{Deserialize, Serialize};

/// Typed navigation failure reasons (§4.1). Callers decide what to do with
/// them; the driver never fails a navigation silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NavigationFailure {
    Timeout,
    Dns,
    Reset,
    PageCrash,
    EmptyResponse,
    AddressUnreachable,
    StatusCode { code: u16 },
    Other { message: String },
}

impl std::fmt::Display for NavigationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationFailure::Timeout => write!(f, "navigation timed out"),
            NavigationFailure::Dns => write!(f, "DNS resolution failed"),
            NavigationFailure::Reset => write!(f, "connection reset"),
            NavigationFailure::PageCrash => write!(f, "page crashed"),
            NavigationFailure::EmptyResponse => write!(f, "empty response"),
            NavigationFailure::AddressUnreachable => write!(f, "address unreachable"),
            NavigationFailure::StatusCode { code } => write!(f, "HTTP status {code}"),
            NavigationFailure::Other { message } => write!(f, "{message}"),
        }
    }
}

impl NavigationFailure {
    /// Classify a reqwest-style error string into a typed reason. Used by
    /// both the resolve stage's HTTP probe and the CDP navigation path so
    /// both report failures through the same vocabulary.
    pub fn classify(is_timeout: bool, is_connect: bool, message: &str) -> Self {
        if is_timeout {
            return NavigationFailure::Timeout;
        }
        let lower = message.to_ascii_lowercase();
        if is_connect && (lower.contains("dns") || lower.contains("resolve")) {
            return NavigationFailure::Dns;
        }
        if is_connect && lower.contains("refused") {
            return NavigationFailure::AddressUnreachable;
        }
        if lower.contains("reset") {
            return NavigationFailure::Reset;
        }
        if is_connect {
            return NavigationFailure::AddressUnreachable;
        }
        NavigationFailure::Other {
            message: message.to_string(),
        }
    }
}

/// Reachability per §4.7 stage 1: success iff final status is 2xx or 3xx.
pub fn is_reachable_status(status: u16) -> bool {
    (200..400).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_2xx_3xx_are_reachable() {
        assert!(is_reachable_status(200));
        assert!(is_reachable_status(301));
        assert!(!is_reachable_status(404));
        assert!(!is_reachable_status(500));
    }

    #[test]
    fn classify_timeout_takes_precedence() {
        assert_eq!(
            NavigationFailure::classify(true, true, "connection refused"),
            NavigationFailure::Timeout
        );
    }
}
