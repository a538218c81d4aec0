//! Layer 2: enterprise-specific heuristics (§4.5 "Enterprise heuristics").
//! Known identity-provider domains ship distinctive selectors and copy for
//! their own passkey/security-key step that generic keyword scanning misses
//! or over-fires on (e.g. Microsoft's "Windows Hello" wording).

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};
use authscope_domain::model::{Confidence, ElementCoordinates};

use crate::types::LayerHit;

struct EnterpriseProvider {
    name: &'static str,
    domains: &'static [&'static str],
    selectors: &'static [&'static str],
    text_patterns: &'static [&'static str],
}

const PROVIDERS: &[EnterpriseProvider] = &[
    EnterpriseProvider {
        name: "microsoft",
        domains: &["login.microsoft.com", "login.live.com", "login.microsoftonline.com", "account.microsoft.com"],
        selectors: &["#idBtn_Back", ".win-button", "[data-bind*='winButton']"],
        text_patterns: &["windows hello", "security key", "fido2"],
    },
    EnterpriseProvider {
        name: "google",
        domains: &["accounts.google.com"],
        selectors: &["[data-primary-action-label]", ".ZFr60d"],
        text_patterns: &["security key", "2-step verification", "passkey"],
    },
    EnterpriseProvider {
        name: "apple",
        domains: &["appleid.apple.com", "idmsa.apple.com"],
        selectors: &["[data-auth-widget-type]", ".si-button"],
        text_patterns: &["security key", "face id", "touch id"],
    },
    EnterpriseProvider {
        name: "adobe",
        domains: &["account.adobe.com", "auth.services.adobe.com"],
        selectors: &[".spectrum-Button", "[data-testid*='security-key']"],
        text_patterns: &["security key", "biometric sign in"],
    },
    EnterpriseProvider {
        name: "bestbuy",
        domains: &["www.bestbuy.com", "login.bestbuy.com"],
        selectors: &["[data-testid*='passkey']", "[data-track*='passkey']"],
        text_patterns: &["passkey", "face id", "touch id", "windows hello"],
    },
];

/// Finds the enterprise provider whose domain list contains `host`, then
/// scans for a matching selector or text pattern. Returns `None` when the
/// host isn't one of the known providers, not just when nothing matches.
/// A selector match is HIGH confidence (the provider's own markup); a text
/// pattern match alone is MEDIUM (copy can be reused outside the flow).
pub async fn detect(ctx: &BrowserContext, host: &str) -> Result<Option<LayerHit>> {
    let Some(provider) = PROVIDERS.iter().find(|p| p.domains.iter().any(|d| host.ends_with(d))) else {
        return Ok(None);
    };

    let script = build_script(provider);
    let hit = ctx
        .page
        .evaluate(script)
        .await
        .map_err(|e| Error::Browser(format!("enterprise heuristic evaluate failed: {e}")))?
        .into_value::<Option<RawHit>>()
        .map_err(|e| Error::Browser(format!("enterprise heuristic decode failed: {e}")))?;

    Ok(hit.map(|h| LayerHit {
        confidence: if h.kind == "selector" { Confidence::High } else { Confidence::Medium },
        indicators: vec![format!("{}: {} match", provider.name, h.kind)],
        element_coordinates: Some(ElementCoordinates { x: h.x, y: h.y, width: h.width, height: h.height }),
        element_inner_text: Some(h.inner_text),
    }))
}

#[derive(serde::Deserialize)]
struct RawHit {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    inner_text: String,
    kind: String,
}

fn build_script(provider: &EnterpriseProvider) -> String {
    let selectors_json = serde_json::to_string(provider.selectors).unwrap_or_else(|_| "[]".into());
    let patterns_json = serde_json::to_string(provider.text_patterns).unwrap_or_else(|_| "[]".into());
    format!(
        r#"(() => {{
  const selectors = {selectors_json};
  const patterns = {patterns_json};
  const isVisible = (el) => {{
    const s = window.getComputedStyle(el);
    return s.display !== 'none' && s.visibility !== 'hidden' && el.offsetWidth > 0 && el.offsetHeight > 0;
  }};
  for (const sel of selectors) {{
    let el;
    try {{ el = document.querySelector(sel); }} catch (e) {{ continue; }}
    if (el && isVisible(el)) {{
      const r = el.getBoundingClientRect();
      return {{ x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height, inner_text: (el.textContent || '').trim().slice(0, 500), kind: 'selector' }};
    }}
  }}
  const lowerPatterns = patterns.map(p => p.toLowerCase());
  for (const el of document.querySelectorAll('button, [role="button"], a, div, span')) {{
    if (!isVisible(el)) continue;
    const text = (el.textContent || '').toLowerCase();
    if (lowerPatterns.some(p => text.includes(p))) {{
      const r = el.getBoundingClientRect();
      if (r.width <= 0 || r.height <= 0) continue;
      return {{ x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height, inner_text: (el.textContent || '').trim().slice(0, 500), kind: 'text' }};
    }}
  }}
  return null;
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn microsoft_domain_resolves_to_provider() {
        let provider = PROVIDERS.iter().find(|p| p.domains.iter().any(|d| "login.live.com".ends_with(d)));
        assert_eq!(provider.unwrap().name, "microsoft");
    }

    #[test]
    fn unknown_domain_has_no_provider() {
        let provider = PROVIDERS.iter().find(|p| p.domains.iter().any(|d| "example.com".ends_with(d)));
        assert!(provider.is_none());
    }
}
