//! Layer 4: inline script scanning (§4.5 "JS"). Looks at every same-document
//! `<script>` with literal content (not `src`) for WebAuthn call sites,
//! capability probes, and known client libraries.

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};
use authscope_domain::model::Confidence;

use crate::types::LayerHit;

#[derive(serde::Deserialize)]
struct RawHit {
    kind: String,
    detail: String,
}

const SCAN_SCRIPT: &str = r#"(() => {
  const results = [];
  const strong = [
    [/navigator\.credentials\.(create|get)\s*\(\s*\{[\s\S]*?publicKey/, 'credential_call'],
    [/isUserVerifyingPlatformAuthenticatorAvailable/, 'platform_check'],
    [/isConditionalMediationAvailable/, 'conditional_ui'],
  ];
  const weak = [
    [/authenticatorSelection\s*:\s*\{/, 'authenticator_selection'],
    [/userVerification\s*:\s*["'](?:required|preferred)["']/, 'user_verification'],
    [/"challenge"\s*:\s*["'][A-Za-z0-9+/=]+["']/, 'challenge_handling'],
  ];
  const libraries = ['@simplewebauthn/browser', 'webauthn-json', 'fido2-lib', '@github/webauthn-json', 'webauthn-framework', 'webauthn.io'];

  for (const script of document.scripts) {
    let content;
    try { content = script.textContent || ''; } catch (e) { continue; }
    if (!content.trim() || script.src) continue;

    for (const [re, name] of strong) {
      if (re.test(content)) results.push({ kind: 'strong', detail: name });
    }
    for (const [re, name] of weak) {
      if (re.test(content)) results.push({ kind: 'weak', detail: name });
    }
    for (const lib of libraries) {
      if (content.includes(lib)) results.push({ kind: 'library', detail: lib });
    }
  }
  return results.slice(0, 20);
})()"#;

pub async fn detect(ctx: &BrowserContext) -> Result<Option<LayerHit>> {
    let hits: Vec<RawHit> = ctx
        .page
        .evaluate(SCAN_SCRIPT)
        .await
        .map_err(|e| Error::Browser(format!("passkey JS scan failed: {e}")))?
        .into_value()
        .map_err(|e| Error::Browser(format!("passkey JS scan decode failed: {e}")))?;

    if hits.is_empty() {
        return Ok(None);
    }

    let confidence = if hits.iter().any(|h| h.kind == "strong" || h.kind == "library") {
        Confidence::High
    } else {
        Confidence::Medium
    };
    let indicators = hits.iter().take(5).map(|h| format!("JS {}: {}", h.kind, h.detail)).collect();

    Ok(Some(LayerHit { confidence, indicators, element_coordinates: None, element_inner_text: None }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_script_references_known_webauthn_library() {
        assert!(SCAN_SCRIPT.contains("@simplewebauthn/browser"));
    }
}
