//! WebAuthn instrumentation: the init script that captures
//! `navigator.credentials.create`/`get` calls, the CDP virtual authenticator
//! the passkey detector drives to complete a flow, and a recorder for the
//! `WebAuthn.credentialAdded`/`credentialAsserted` CDP events the virtual
//! authenticator itself emits once a flow actually completes.

use std::sync::Arc;

use chromiumoxide::cdp::browser_protocol::web_authn::{
    AddVirtualAuthenticatorParams, AuthenticatorProtocol, AuthenticatorTransport, Credential,
    EventCredentialAdded, EventCredentialAsserted, VirtualAuthenticatorOptions,
};
use chromiumoxide::listeners::EventStream;
use futures_util::StreamExt;
use parking_lot::Mutex;

use authscope_domain::error::{Error, Result};

use crate::driver::BrowserContext;

/// Wraps `navigator.credentials.create`/`get` to record every call's
/// arguments (challenges and ids base64-encoded) into `__webauthn_capture`.
/// Must be installed via `evaluate_on_new_document` before navigation so it
/// runs in every document (§4.1 "Init scripts").
pub const WEBAUTHN_INSTRUMENTATION_SCRIPT: &str = r#"
(() => {
  if (window.__webauthn_capture) return;
  window.__webauthn_capture = [];

  const toB64 = (buf) => {
    if (!buf) return null;
    const bytes = new Uint8Array(buf);
    let bin = "";
    for (const b of bytes) bin += String.fromCharCode(b);
    return btoa(bin);
  };

  const serialize = (opts) => JSON.parse(JSON.stringify(opts, (key, value) => {
    if (value instanceof ArrayBuffer || ArrayBuffer.isView(value)) {
      return { __b64: toB64(value.buffer || value) };
    }
    return value;
  }));

  if (!navigator.credentials) return;
  const origCreate = navigator.credentials.create?.bind(navigator.credentials);
  const origGet = navigator.credentials.get?.bind(navigator.credentials);

  if (origCreate) {
    navigator.credentials.create = (options) => {
      window.__webauthn_capture.push({ method: "create", options: serialize(options) });
      return origCreate(options);
    };
  }
  if (origGet) {
    navigator.credentials.get = (options) => {
      window.__webauthn_capture.push({ method: "get", options: serialize(options) });
      return origGet(options);
    };
  }
})();
"#;

/// Add a `ctap2`/`internal` virtual authenticator with resident keys, user
/// verification, and automatic presence/consent simulation, matching §4.5
/// "Implementation capture".
pub async fn add_virtual_authenticator(ctx: &BrowserContext) -> Result<String> {
    let params = AddVirtualAuthenticatorParams::builder()
        .options(
            VirtualAuthenticatorOptions::builder()
                .protocol(AuthenticatorProtocol::Ctap2)
                .transport(AuthenticatorTransport::Internal)
                .has_resident_key(true)
                .has_user_verification(true)
                .is_user_verified(true)
                .automatic_presence_simulation(true)
                .build()
                .map_err(|e| Error::Browser(format!("invalid virtual authenticator options: {e}")))?,
        )
        .build()
        .map_err(|e| Error::Browser(format!("invalid AddVirtualAuthenticatorParams: {e}")))?;

    let resp = ctx
        .page
        .execute(params)
        .await
        .map_err(|e| Error::Browser(format!("AddVirtualAuthenticator failed: {e}")))?;
    Ok(resp.result.authenticator_id.inner().to_string())
}

#[derive(Default)]
struct WebAuthnEventState {
    events: Vec<serde_json::Value>,
}

/// A handle that accumulates `WebAuthn.credentialAdded`/`credentialAsserted`
/// events for the lifetime of a page. Unlike `__webauthn_capture`, which
/// records every call into `navigator.credentials`, these events only fire
/// once the virtual authenticator actually completes a registration or
/// assertion — so a non-empty buffer here is stronger evidence than a
/// non-empty JS capture array.
pub struct WebAuthnEventRecorder {
    state: Arc<Mutex<WebAuthnEventState>>,
}

impl WebAuthnEventRecorder {
    /// Attach to a page's WebAuthn event stream. Must be called before
    /// [`add_virtual_authenticator`] triggers any registration/assertion so
    /// the first event is captured.
    pub async fn attach(ctx: &BrowserContext) -> Result<Self> {
        let state = Arc::new(Mutex::new(WebAuthnEventState::default()));

        let mut added_stream: EventStream<EventCredentialAdded> = ctx
            .page
            .event_listener()
            .await
            .map_err(|e| Error::Browser(format!("webauthn listener failed: {e}")))?;
        let added_state = state.clone();
        tokio::spawn(async move {
            while let Some(ev) = added_stream.next().await {
                if let Ok(value) = serde_json::to_value(&*ev) {
                    added_state.lock().events.push(value);
                }
            }
        });

        let mut asserted_stream: EventStream<EventCredentialAsserted> = ctx
            .page
            .event_listener()
            .await
            .map_err(|e| Error::Browser(format!("webauthn listener failed: {e}")))?;
        let asserted_state = state.clone();
        tokio::spawn(async move {
            while let Some(ev) = asserted_stream.next().await {
                if let Ok(value) = serde_json::to_value(&*ev) {
                    asserted_state.lock().events.push(value);
                }
            }
        });

        Ok(Self { state })
    }

    /// Every credential-added/asserted event observed so far, in arrival
    /// order.
    pub fn events(&self) -> Vec<serde_json::Value> {
        self.state.lock().events.clone()
    }
}

/// Enumerate credentials registered on a virtual authenticator, as captured
/// by `WebAuthn.getCredentials`.
pub async fn get_credentials(
    ctx: &BrowserContext,
    authenticator_id: &str,
) -> Result<Vec<Credential>> {
    use chromiumoxide::cdp::browser_protocol::web_authn::{
        AuthenticatorId, GetCredentialsParams,
    };
    let resp = ctx
        .page
        .execute(GetCredentialsParams::new(AuthenticatorId::from(
            authenticator_id.to_string(),
        )))
        .await
        .map_err(|e| Error::Browser(format!("GetCredentials failed: {e}")))?;
    Ok(resp.result.credentials.clone())
}
