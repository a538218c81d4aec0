//! Layer 1: WebAuthn API availability (§4.5 "API availability").

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};

/// `PublicKeyCredential !== undefined && isSecureContext`. Every other layer
/// is skipped when this is false — a page with no WebAuthn API cannot
/// possibly offer passkeys, whatever its UI claims.
pub async fn is_available(ctx: &BrowserContext) -> Result<bool> {
    ctx.page
        .evaluate("typeof window.PublicKeyCredential !== 'undefined' && window.isSecureContext === true")
        .await
        .map_err(|e| Error::Browser(format!("webauthn availability check failed: {e}")))?
        .into_value::<bool>()
        .map_err(|e| Error::Browser(format!("webauthn availability decode failed: {e}")))
}
