//! Implementation capture (§4.5 "Implementation capture"), gated on a
//! positive detection from any layer. Adds a CDP virtual authenticator,
//! tries to trigger a real `navigator.credentials` call in increasing order
//! of intrusiveness, then reads back whatever the init script captured.

use authscope_browser::webauthn::{add_virtual_authenticator, get_credentials, WebAuthnEventRecorder};
use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};
use authscope_domain::model::PasskeyImplementation;

const TRIGGER_WAIT_MS: u64 = 1500;

/// Runs the capture sequence and returns whatever got captured, regardless
/// of which trigger (if any) produced it — `captured` reflects whether
/// `__webauthn_capture` ended up non-empty.
pub async fn capture(ctx: &BrowserContext) -> Result<PasskeyImplementation> {
    let events = WebAuthnEventRecorder::attach(ctx).await?;
    let authenticator_id = add_virtual_authenticator(ctx).await?;

    passive_wait().await;
    if read_capture_len(ctx).await? == 0 {
        click_passkey_button(ctx).await;
        tokio::time::sleep(std::time::Duration::from_millis(TRIGGER_WAIT_MS)).await;
    }
    if read_capture_len(ctx).await? == 0 {
        fill_test_username(ctx).await;
        tokio::time::sleep(std::time::Duration::from_millis(TRIGGER_WAIT_MS)).await;
    }

    let calls = ctx
        .page
        .evaluate("window.__webauthn_capture || []")
        .await
        .map_err(|e| Error::Browser(format!("webauthn capture read failed: {e}")))?
        .into_value::<Vec<serde_json::Value>>()
        .map_err(|e| Error::Browser(format!("webauthn capture decode failed: {e}")))?;

    let credentials = get_credentials(ctx, &authenticator_id)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter_map(|c| serde_json::to_value(c).ok())
        .collect();

    let create_options = calls.iter().find(|c| c.get("method").and_then(|m| m.as_str()) == Some("create")).and_then(|c| c.get("options")).cloned();
    let get_options = calls.iter().find(|c| c.get("method").and_then(|m| m.as_str()) == Some("get")).and_then(|c| c.get("options")).cloned();

    Ok(PasskeyImplementation {
        captured: !calls.is_empty(),
        create_options,
        get_options,
        credentials,
        cdp_events: events.events(),
    })
}

async fn passive_wait() {
    tokio::time::sleep(std::time::Duration::from_millis(TRIGGER_WAIT_MS)).await;
}

async fn read_capture_len(ctx: &BrowserContext) -> Result<usize> {
    ctx.page
        .evaluate("(window.__webauthn_capture || []).length")
        .await
        .map_err(|e| Error::Browser(format!("webauthn capture length read failed: {e}")))?
        .into_value::<usize>()
        .map_err(|e| Error::Browser(format!("webauthn capture length decode failed: {e}")))
}

async fn click_passkey_button(ctx: &BrowserContext) {
    let _ = ctx
        .page
        .evaluate(
            r#"(() => {
  for (const el of document.querySelectorAll('button, [role="button"], a')) {
    const text = (el.textContent || '').toLowerCase();
    if (/passkey|security\s?key|webauthn|face\s?id|touch\s?id|biometric/.test(text)) { el.click(); return true; }
  }
  return false;
})()"#,
        )
        .await;
}

async fn fill_test_username(ctx: &BrowserContext) {
    let _ = ctx
        .page
        .evaluate(
            r#"(() => {
  const input = document.querySelector('input[type="email"], input[type="text"][name*="user"], input[autocomplete="username"]');
  if (!input) return false;
  input.focus();
  input.value = 'authscope-probe@example.com';
  input.dispatchEvent(new Event('input', { bubbles: true }));
  const form = input.closest('form');
  if (form) { form.requestSubmit ? form.requestSubmit() : form.submit(); }
  return true;
})()"#,
        )
        .await;
}
