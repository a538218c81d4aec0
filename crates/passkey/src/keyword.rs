//! Layer 5: visible text keyword match (§4.5 "Keyword"). The weakest
//! signal on its own — bare mentions of "passkey" in body copy are common
//! even on pages that don't offer one — so a strong action phrase
//! (`sign in with passkey`) is required for HIGH, and a bare keyword only
//! reaches MEDIUM when the page is itself in an authentication context.

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};
use authscope_domain::model::Confidence;

use crate::types::LayerHit;

#[derive(serde::Deserialize)]
struct RawScan {
    strong_matches: Vec<String>,
    weak_matches: Vec<String>,
    auth_context: bool,
}

const SCAN_SCRIPT: &str = r#"(() => {
  const strongPatterns = [
    /sign\s?in\s+with\s+passkey/i,
    /continue\s+with\s+passkey/i,
    /use\s+(?:your\s+)?passkey/i,
    /passkey\s+authentication/i,
  ];
  const weakPatterns = [/passkey/i, /webauthn/i, /security\s?key/i, /biometric\s+authentication/i];

  const text = (document.title + ' ' + (document.body ? document.body.innerText : '')).slice(0, 20000);
  const strong_matches = strongPatterns.filter(p => p.test(text)).map(p => p.source);
  const weak_matches = weakPatterns.filter(p => p.test(text)).map(p => p.source);

  const url = window.location.href.toLowerCase();
  const urlIsAuth = /login|signin|auth|account|register|signup/.test(url);
  const titleIsAuth = /login|sign.?in|register|create.?account/i.test(document.title);
  const hasAuthForm = !!document.querySelector(
    'form input[type="password"], form input[type="email"][required], form input[name*="username"][required]'
  );
  const hasAuthButton = Array.from(document.querySelectorAll('button, [role="button"], input[type="submit"]')).some(el => {
    const t = (el.textContent || el.value || '').toLowerCase();
    return /sign.?in|log.?in|register|create.?account/.test(t);
  });

  return { strong_matches, weak_matches, auth_context: urlIsAuth || titleIsAuth || hasAuthForm || hasAuthButton };
})()"#;

pub async fn detect(ctx: &BrowserContext) -> Result<Option<LayerHit>> {
    let scan: RawScan = ctx
        .page
        .evaluate(SCAN_SCRIPT)
        .await
        .map_err(|e| Error::Browser(format!("passkey keyword scan failed: {e}")))?
        .into_value()
        .map_err(|e| Error::Browser(format!("passkey keyword scan decode failed: {e}")))?;

    if scan.strong_matches.is_empty() && scan.weak_matches.is_empty() {
        return Ok(None);
    }

    let confidence = confidence_for(&scan);
    let mut indicators: Vec<String> = scan.strong_matches.iter().map(|m| format!("strong phrase: {m}")).collect();
    indicators.extend(scan.weak_matches.iter().map(|m| format!("weak phrase: {m}")));
    indicators.truncate(5);

    Ok(Some(LayerHit { confidence, indicators, element_coordinates: None, element_inner_text: None }))
}

fn confidence_for(scan: &RawScan) -> Confidence {
    if !scan.strong_matches.is_empty() {
        return Confidence::High;
    }
    if scan.auth_context {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_match_is_always_high() {
        let scan = RawScan { strong_matches: vec!["sign in with passkey".into()], weak_matches: vec![], auth_context: false };
        assert_eq!(confidence_for(&scan), Confidence::High);
    }

    #[test]
    fn bare_keyword_needs_auth_context_for_medium() {
        let scan = RawScan { strong_matches: vec![], weak_matches: vec!["passkey".into()], auth_context: false };
        assert_eq!(confidence_for(&scan), Confidence::Low);

        let scan = RawScan { strong_matches: vec![], weak_matches: vec!["passkey".into()], auth_context: true };
        assert_eq!(confidence_for(&scan), Confidence::Medium);
    }
}
