//! Password-based login form detector (§4.6 "Password").
//!
//! The LastPass icon check matches a single hardcoded base64 PNG prefix
//! injected by the LastPass browser extension into `background-image`
//! styles — brittle by construction (a LastPass UI refresh silently stops
//! the match), kept only because it's a cheap, high-signal upgrade when it
//! does hit.

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};
use authscope_domain::model::{Confidence, PasswordDetection};

/// Prefix of the LastPass-injected icon's base64 PNG payload. Exposed for
/// the analyzer's same-origin cross-frame sweep (§4.7 stage 3), which
/// re-uses the exact prefix this module matches in the main document.
pub const LASTPASS_ICON_B64_PREFIX: &str = "iVBORw0KGgoAAAANSUhEUgAAABAAAAASCAYAAABSO15qAAAAAXNSR0IArs4c6QAAAPhJREFUOBHlU70KgzAQPlMhEvoQTg6OPoOjT+JWOnRqkUKHgqWP4OQbOPokTk6OTkVULNSLVc62oJmbIdzd95NcuGjX2/3YVI/Ts+t0WLE2ut5xsQ0O+90F6UxFjAI8qNcEGONia08e6MNONYwCS7EQAizLmtGUDEzTBNd1fxsYhjEBnHPQNG3KKTYV34F8ec/zwHEciOMYyrIE3/ehKAqIoggo9inGXKmFXwbyBkmSQJqmUNe15IRhCG3byphitm1/eUzDM4qR0TTNjEixGdAnSi3keS5vSk2UDKqqgizLqB4YzvassiKhGtZ/jDMtLOnHz7TE+yf8BaDZXA509yeBAAAAAElFTkSuQmCC";

#[derive(serde::Deserialize)]
struct RawScan {
    has_username: bool,
    has_password: bool,
    has_submit: bool,
    lastpass_icon_detected: bool,
}

const SCAN_SCRIPT: &str = r#"(() => {
  const isVisible = (el) => {
    const s = window.getComputedStyle(el);
    return s.display !== 'none' && s.visibility !== 'hidden' && el.offsetWidth > 0 && el.offsetHeight > 0;
  };
  const usernameSelectors = [
    'input[type="text"][name="username"]',
    'input[type="text"][name="email"]',
    'input[type="email"]',
    'input[type="text"][placeholder*="username" i]',
    'input[type="text"][placeholder*="email" i]',
    'input[aria-label*="username" i]',
    'input[aria-label*="email" i]',
    'input[autocomplete="username"]',
    'input[autocomplete="email"]',
    'input[id*="username" i]',
    'input[id*="email" i]',
  ];
  const passwordSelectors = [
    'input[type="password"]',
    'input[name="password"]',
    'input[placeholder*="password" i]',
    'input[aria-label*="password" i]',
  ];
  const submitSelectors = [
    'button[type="submit"]',
    'input[type="submit"]',
  ];
  const textSubmitPhrases = ['sign in', 'log in', 'login', 'continue'];

  const anyVisible = (selectors) => selectors.some(sel => {
    try { return Array.from(document.querySelectorAll(sel)).some(isVisible); } catch (e) { return false; }
  });

  const hasTextSubmit = Array.from(document.querySelectorAll('button, input[type="button"]')).some(el => {
    if (!isVisible(el)) return false;
    const text = (el.textContent || el.value || '').toLowerCase();
    return textSubmitPhrases.some(p => text.includes(p));
  });

  const lastpassPrefix = 'PREFIX_PLACEHOLDER';
  const lastpass_icon_detected = Array.from(document.querySelectorAll('input[style*="' + lastpassPrefix + '"]')).length > 0;

  return {
    has_username: anyVisible(usernameSelectors),
    has_password: anyVisible(passwordSelectors),
    has_submit: anyVisible(submitSelectors) || hasTextSubmit,
    lastpass_icon_detected,
  };
})()"#;

pub async fn detect(ctx: &BrowserContext, login_page_url: &str) -> Result<PasswordDetection> {
    let script = SCAN_SCRIPT.replace("PREFIX_PLACEHOLDER", LASTPASS_ICON_B64_PREFIX);
    let scan: RawScan = ctx
        .page
        .evaluate(script)
        .await
        .map_err(|e| Error::Browser(format!("password form scan failed: {e}")))?
        .into_value()
        .map_err(|e| Error::Browser(format!("password form scan decode failed: {e}")))?;

    let lower_url = login_page_url.to_lowercase();
    let url_looks_like_login = lower_url.contains("/login") || lower_url.contains("/signin");

    let (detected, confidence) = if scan.has_username && scan.has_password {
        (true, if scan.has_submit { Confidence::High } else { Confidence::Medium })
    } else if scan.has_password {
        (true, Confidence::Medium)
    } else if scan.has_username && (scan.has_submit || url_looks_like_login) {
        (true, Confidence::Medium)
    } else {
        (false, Confidence::None)
    };

    let (detected, confidence) = if scan.lastpass_icon_detected && !detected {
        (true, Confidence::Medium)
    } else {
        (detected, confidence)
    };

    Ok(PasswordDetection {
        detected,
        confidence,
        login_page_url: login_page_url.to_string(),
        has_username: scan.has_username,
        has_password: scan.has_password,
        has_submit: scan.has_submit,
        lastpass_icon_detected: scan.lastpass_icon_detected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(has_username: bool, has_password: bool, has_submit: bool) -> RawScan {
        RawScan { has_username, has_password, has_submit, lastpass_icon_detected: false }
    }

    fn classify(scan: RawScan, url: &str) -> (bool, Confidence) {
        let lower_url = url.to_lowercase();
        let url_looks_like_login = lower_url.contains("/login") || lower_url.contains("/signin");
        if scan.has_username && scan.has_password {
            (true, if scan.has_submit { Confidence::High } else { Confidence::Medium })
        } else if scan.has_password {
            (true, Confidence::Medium)
        } else if scan.has_username && (scan.has_submit || url_looks_like_login) {
            (true, Confidence::Medium)
        } else {
            (false, Confidence::None)
        }
    }

    #[test]
    fn full_form_with_submit_is_high() {
        assert_eq!(classify(base(true, true, true), "https://x.com/account"), (true, Confidence::High));
    }

    #[test]
    fn full_form_without_submit_is_medium() {
        assert_eq!(classify(base(true, true, false), "https://x.com/account"), (true, Confidence::Medium));
    }

    #[test]
    fn password_only_is_medium() {
        assert_eq!(classify(base(false, true, false), "https://x.com/account"), (true, Confidence::Medium));
    }

    #[test]
    fn username_only_needs_submit_or_login_url() {
        assert_eq!(classify(base(true, false, false), "https://x.com/account"), (false, Confidence::None));
        assert_eq!(classify(base(true, false, false), "https://x.com/login"), (true, Confidence::Medium));
        assert_eq!(classify(base(true, false, true), "https://x.com/account"), (true, Confidence::Medium));
    }

    #[test]
    fn lastpass_prefix_matches_injected_icon_example() {
        assert!(SCAN_SCRIPT.contains("PREFIX_PLACEHOLDER"));
        assert!(!LASTPASS_ICON_B64_PREFIX.is_empty());
    }
}
