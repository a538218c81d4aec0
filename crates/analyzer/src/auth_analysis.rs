//! Stage 3: authentication analysis (§4.7). One shared browser context is
//! navigated across every login-page candidate in turn; password, MFA and
//! passkey detectors run on whatever loads, plus a same-origin frame sweep
//! for LastPass icons that the per-candidate detectors (scoped to the main
//! document only) can't see themselves.

use authscope_browser::{BrowserContext, BrowserDriver, NotAnalyzableReason};
use authscope_domain::config::Config;
use authscope_domain::error::Result;
use authscope_domain::model::{
    CandidateResolved, Confidence, LoginPageCandidate, MfaDetection, PasswordDetection,
};

pub struct CandidateAnalysis {
    pub resolved: CandidateResolved,
    pub password: Option<PasswordDetection>,
    pub mfa: Option<MfaDetection>,
    pub passkey: Option<authscope_domain::model::PasskeyDetection>,
}

/// Recursively scans same-origin `<iframe>` documents for the LastPass icon
/// prefix; cross-origin frames throw on `contentDocument` access and are
/// silently skipped, matching how a real browser extension's DOM injection
/// is only visible to scripts that share its origin.
const FRAME_LASTPASS_SCRIPT: &str = r#"(() => {
  const prefix = 'PREFIX_PLACEHOLDER';
  const scanDoc = (doc) => {
    try {
      if (Array.from(doc.querySelectorAll('input[style*="' + prefix + '"]')).length > 0) return true;
    } catch (e) { return false; }
    let frames;
    try { frames = Array.from(doc.querySelectorAll('iframe')); } catch (e) { return false; }
    for (const f of frames) {
      try {
        if (f.contentDocument && scanDoc(f.contentDocument)) return true;
      } catch (e) { /* cross-origin, skip */ }
    }
    return false;
  };
  return scanDoc(document);
})()"#;

async fn scan_frames_for_lastpass(ctx: &BrowserContext) -> Result<bool> {
    use authscope_authdetect::password::LASTPASS_ICON_B64_PREFIX;
    let script = FRAME_LASTPASS_SCRIPT.replace("PREFIX_PLACEHOLDER", LASTPASS_ICON_B64_PREFIX);
    let found: bool = ctx
        .page
        .evaluate(script)
        .await
        .ok()
        .and_then(|v| v.into_value().ok())
        .unwrap_or(false);
    Ok(found)
}

pub async fn analyze_candidate(
    driver: &dyn BrowserDriver,
    ctx: &BrowserContext,
    cfg: &Config,
    candidate: &LoginPageCandidate,
) -> Result<CandidateAnalysis> {
    let nav_result = driver.navigate(ctx, &candidate.url).await;
    if let Err(failure) = nav_result {
        return Ok(CandidateAnalysis {
            resolved: CandidateResolved {
                reachable: false,
                final_domain: None,
                final_url: None,
                error_msg: Some(failure.to_string()),
            },
            password: None,
            mfa: None,
            passkey: None,
        });
    }

    driver.wait_for_load(ctx, &cfg.browser).await;
    // Element-appearance wait: dynamic login widgets (passkey buttons, MFA
    // steps) frequently render a beat after `networkidle` fires.
    tokio::time::sleep(std::time::Duration::from_millis(cfg.browser.sleep_after_networkidle_ms)).await;

    let (analyzable, reason) = driver.content_analyzable(ctx).await;
    let final_url = ctx.page.url().await.ok().flatten();
    let final_domain = final_url
        .as_deref()
        .and_then(|u| url::Url::parse(u).ok())
        .and_then(|u| u.host_str().map(str::to_string));

    if !analyzable {
        let msg = match reason {
            Some(NotAnalyzableReason::AboutBlank) => "about:blank after navigation".to_string(),
            Some(NotAnalyzableReason::NonHtmlContentType(ct)) => format!("non-HTML content type: {ct}"),
            None => "not analyzable".to_string(),
        };
        return Ok(CandidateAnalysis {
            resolved: CandidateResolved { reachable: false, final_domain, final_url, error_msg: Some(msg) },
            password: None,
            mfa: None,
            passkey: None,
        });
    }

    let mut password = authscope_authdetect::password::detect(ctx, &candidate.url).await?;
    let mfa = authscope_authdetect::mfa::detect(ctx, &candidate.url).await?;
    let passkey = authscope_passkey::run(ctx, &candidate.url).await?;

    if scan_frames_for_lastpass(ctx).await? && !password.lastpass_icon_detected {
        password.lastpass_icon_detected = true;
        if !password.detected {
            password.detected = true;
            password.confidence = Confidence::Medium;
        }
    }

    Ok(CandidateAnalysis {
        resolved: CandidateResolved { reachable: true, final_domain, final_url, error_msg: None },
        password: Some(password),
        mfa: Some(mfa),
        passkey: Some(passkey),
    })
}
