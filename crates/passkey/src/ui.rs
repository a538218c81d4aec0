//! Layer 3: UI element scan (§4.5 "UI"). Visible buttons/inputs/images
//! whose text, ARIA label, or attributes name a passkey/biometric
//! affordance, filtered against third-party SSO buttons that use similar
//! iconography. Retries with a scroll between attempts since passkey
//! buttons are frequently revealed behind a "Try another way" toggle or lazy
//! JS render.

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};
use authscope_domain::model::{Confidence, ElementCoordinates};

use crate::types::LayerHit;

const MAX_ATTEMPTS: usize = 3;
const RETRY_WAIT_MS: u64 = 400;

pub async fn detect(ctx: &BrowserContext) -> Result<Option<LayerHit>> {
    for attempt in 0..MAX_ATTEMPTS {
        let hits = scan(ctx).await?;
        if let Some(hit) = best_hit(hits) {
            return Ok(Some(hit));
        }
        if attempt == 0 {
            click_reveal_toggle(ctx).await?;
        }
        let _ = ctx.page.evaluate("window.scrollBy(0, 400)").await;
        tokio::time::sleep(std::time::Duration::from_millis(RETRY_WAIT_MS)).await;
    }
    Ok(None)
}

#[derive(serde::Deserialize)]
struct RawHit {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    inner_text: String,
    kind: String,
    auth_context: bool,
}

async fn scan(ctx: &BrowserContext) -> Result<Vec<RawHit>> {
    ctx.page
        .evaluate(SCAN_SCRIPT)
        .await
        .map_err(|e| Error::Browser(format!("passkey UI scan failed: {e}")))?
        .into_value::<Vec<RawHit>>()
        .map_err(|e| Error::Browser(format!("passkey UI scan decode failed: {e}")))
}

fn best_hit(hits: Vec<RawHit>) -> Option<LayerHit> {
    if hits.is_empty() {
        return None;
    }
    let confidence_rank = |h: &RawHit| match h.kind.as_str() {
        "input" | "attribute" => 3,
        "button" if h.auth_context => 3,
        "button" | "biometric" => 2,
        _ => 1,
    };
    let best = hits.iter().max_by_key(|h| confidence_rank(h))?;
    let confidence = match confidence_rank(best) {
        3 => Confidence::High,
        2 => Confidence::Medium,
        _ => Confidence::Low,
    };
    let indicators = hits
        .iter()
        .take(5)
        .map(|h| format!("UI {}: {}", h.kind, h.inner_text.chars().take(80).collect::<String>()))
        .collect();
    Some(LayerHit {
        confidence,
        indicators,
        element_coordinates: Some(ElementCoordinates { x: best.x, y: best.y, width: best.width, height: best.height }),
        element_inner_text: Some(best.inner_text.clone()),
    })
}

/// Clicks a single "Try another way" / "More options" style reveal button if
/// present, once, to surface passkey options hidden behind a secondary
/// sign-in menu.
async fn click_reveal_toggle(ctx: &BrowserContext) -> Result<()> {
    let _ = ctx
        .page
        .evaluate(
            r#"(() => {
  const phrases = ['try another way', 'more options', 'other ways to sign in', 'more sign-in options'];
  for (const el of document.querySelectorAll('button, [role="button"], a')) {
    const text = (el.textContent || '').trim().toLowerCase();
    if (phrases.some(p => text.includes(p))) { el.click(); return true; }
  }
  return false;
})()"#,
        )
        .await;
    Ok(())
}

const SCAN_SCRIPT: &str = r#"(() => {
  const results = [];
  const isVisible = (el) => {
    const s = window.getComputedStyle(el);
    return s.display !== 'none' && s.visibility !== 'hidden' && s.opacity !== '0' && el.offsetWidth > 0 && el.offsetHeight > 0;
  };
  const isSocialButton = (el) => {
    const text = (el.textContent || '').toLowerCase();
    const cls = (el.className || '').toString().toLowerCase();
    return /facebook|twitter|google|github|linkedin/.test(text) || /social|oauth/.test(cls);
  };
  const box = (el) => {
    const r = el.getBoundingClientRect();
    return { x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height };
  };

  for (const el of document.querySelectorAll('button, [role="button"], a')) {
    if (!isVisible(el) || isSocialButton(el)) continue;
    const text = (el.textContent || '').toLowerCase();
    const aria = (el.getAttribute('aria-label') || '').toLowerCase();
    const combined = text + ' ' + aria;
    const isPasskey = /passkey|security\s?key|webauthn/.test(combined);
    const isBiometric = /face\s?id|touch\s?id|fingerprint|biometric/.test(combined);
    if (!isPasskey && !isBiometric) continue;
    const r = box(el);
    if (r.width <= 0 || r.height <= 0) continue;
    results.push({
      ...r,
      inner_text: (el.textContent || '').trim().slice(0, 500),
      kind: isBiometric && !isPasskey ? 'biometric' : 'button',
      auth_context: /sign\s?in|log\s?in|continue|verify/.test(combined),
    });
  }

  for (const input of document.querySelectorAll('input')) {
    if (!isVisible(input)) continue;
    const autocomplete = (input.getAttribute('autocomplete') || '').toLowerCase();
    const type = (input.getAttribute('type') || '').toLowerCase();
    if (autocomplete === 'webauthn' || type === 'publickey') {
      const r = box(input);
      results.push({ ...r, inner_text: '', kind: 'input', auth_context: true });
    }
  }

  for (const el of document.querySelectorAll('[data-webauthn], [data-passkey]')) {
    if (!isVisible(el)) continue;
    const r = box(el);
    if (r.width <= 0 || r.height <= 0) continue;
    results.push({ ...r, inner_text: (el.textContent || '').trim().slice(0, 500), kind: 'attribute', auth_context: true });
  }

  for (const el of document.querySelectorAll('img, svg')) {
    if (!isVisible(el)) continue;
    const alt = (el.getAttribute('alt') || '').toLowerCase();
    const aria = (el.getAttribute('aria-label') || '').toLowerCase();
    if (/passkey|security\s?key|fingerprint/.test(alt + ' ' + aria)) {
      const r = box(el);
      if (r.width <= 0 || r.height <= 0) continue;
      results.push({ ...r, inner_text: alt, kind: 'image', auth_context: false });
    }
  }

  return results.slice(0, 50);
})()"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(kind: &str, auth_context: bool) -> RawHit {
        RawHit { x: 0.0, y: 0.0, width: 10.0, height: 10.0, inner_text: "x".into(), kind: kind.into(), auth_context }
    }

    #[test]
    fn credential_input_wins_high_confidence() {
        let hits = vec![hit("image", false), hit("input", false)];
        let result = best_hit(hits).unwrap();
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn biometric_without_auth_context_is_medium() {
        let hits = vec![hit("biometric", false)];
        let result = best_hit(hits).unwrap();
        assert_eq!(result.confidence, Confidence::Medium);
    }

    #[test]
    fn no_hits_returns_none() {
        assert!(best_hit(vec![]).is_none());
    }
}
