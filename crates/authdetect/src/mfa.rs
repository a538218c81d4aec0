//! MFA/2FA detector (§4.6 "MFA"). Requires either a high-confidence OTP
//! input or a strong context phrase on its own; everything weaker needs a
//! corroborating signal, and needs two when "negative indicators" (password
//! reset, signup, zip code, credit card…) suggest the page isn't actually an
//! MFA step.

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};
use authscope_domain::model::{Confidence, MfaDetection, MfaType};

#[derive(serde::Deserialize)]
struct RawScan {
    strong_context: bool,
    negative_present: bool,
    otp_high: bool,
    otp_medium: bool,
    segmented_in_row: bool,
    mfa_text_high: Option<String>,
    mfa_text_medium: Option<String>,
    type_guess: String,
}

const SCAN_SCRIPT: &str = r#"(() => {
  const text = (document.title + ' ' + (document.body ? document.body.innerText : '')).toLowerCase();

  const negativeIndicators = ['password', 'sign up', 'register', 'create account', 'passkey', 'reset password', 'zip code', 'postal code', 'credit card', 'pin', 'ssn', 'social security'];
  const negative_present = negativeIndicators.some(i => text.includes(i));

  const strongContextPhrases = [
    'two-factor authentication', '2-factor authentication', 'multi-factor authentication',
    'two-step verification', '2-step verification', 'additional security step',
    'verify your identity', 'authentication code', 'we sent a code to your',
    'enter the code we sent', 'verification code sent', 'check your phone for a code',
    'check your email for a code', 'use your authenticator app',
  ];
  const strong_context = strongContextPhrases.some(p => text.includes(p));

  const isVisible = (el) => {
    const s = window.getComputedStyle(el);
    return s.display !== 'none' && s.visibility !== 'hidden' && el.offsetWidth > 0 && el.offsetHeight > 0;
  };

  const highSelectors = [
    'input[autocomplete="one-time-code"]',
    'input[name="otp"]',
    'input[name="verificationCode"]',
    'input[aria-label*="verification code" i]',
    'input[placeholder*="verification code" i]',
  ];
  const otp_high = highSelectors.some(sel => {
    try { return Array.from(document.querySelectorAll(sel)).some(isVisible); } catch (e) { return false; }
  });

  const mediumSelectors = [
    'input[name="code"]',
    'input[placeholder*="code" i][maxlength="4"]',
    'input[placeholder*="code" i][maxlength="6"]',
    'input[placeholder*="code" i][maxlength="8"]',
  ];
  const otp_medium = mediumSelectors.some(sel => {
    try { return Array.from(document.querySelectorAll(sel)).some(isVisible); } catch (e) { return false; }
  });

  let segmented_in_row = false;
  const segmented = Array.from(document.querySelectorAll('input[maxlength="1"]')).filter(isVisible);
  if (segmented.length >= 4 && segmented.length <= 8) {
    const rects = segmented.map(el => el.getBoundingClientRect());
    const ys = rects.map(r => r.y);
    const xs = rects.map(r => r.x).sort((a, b) => a - b);
    const sameRow = (Math.max(...ys) - Math.min(...ys)) < 10;
    let sequential = true;
    for (let i = 1; i < xs.length; i++) {
      if (xs[i] - xs[i - 1] > 100) { sequential = false; break; }
    }
    segmented_in_row = sameRow && sequential;
  }

  const highTextIndicators = {
    TOTP: ['authenticator app code', 'google authenticator code', 'microsoft authenticator code', 'authy code', 'totp code', 'use your authenticator app', 'open your authenticator app'],
    SMS: ['verification code via sms', 'verification code by text', 'code sent to your phone', 'text message with a code', 'sms verification code', "we've sent a text to"],
    EMAIL: ['verification code via email', 'code sent to your email', 'check your inbox for a code', "we've sent a code to your email", 'email verification code'],
  };
  let mfa_text_high = null;
  for (const [type, phrases] of Object.entries(highTextIndicators)) {
    if (phrases.some(p => text.includes(p))) { mfa_text_high = type; break; }
  }

  const mediumTextIndicators = {
    TOTP: ['authenticator', 'google authenticator', 'microsoft authenticator', 'authy', 'totp'],
    SMS: ['sms code', 'text message code', 'via text message'],
    EMAIL: ['email code', 'sent to your email', 'check your inbox'],
  };
  let mfa_text_medium = null;
  for (const [type, phrases] of Object.entries(mediumTextIndicators)) {
    if (phrases.some(p => text.includes(p))) { mfa_text_medium = type; break; }
  }

  let type_guess = 'CUSTOM';
  if (['authenticator app', 'google authenticator', 'microsoft authenticator', 'authy', 'totp'].some(p => text.includes(p))) type_guess = 'TOTP';
  else if (['verification code via sms', 'sent to your phone', 'text message with a code', 'sms verification code', 'we sent a text to', 'phone number ending in'].some(p => text.includes(p))) type_guess = 'SMS';
  else if (['sent to your email', 'check your inbox', 'verification code via email', 'email address ending in'].some(p => text.includes(p))) type_guess = 'EMAIL';
  else if (['scan qr code', 'scan this code', 'scan with authenticator'].some(p => text.includes(p))) type_guess = 'QR';

  return { strong_context, negative_present, otp_high, otp_medium, segmented_in_row, mfa_text_high, mfa_text_medium, type_guess };
})()"#;

pub async fn detect(ctx: &BrowserContext, login_page_url: &str) -> Result<MfaDetection> {
    let scan: RawScan = ctx
        .page
        .evaluate(SCAN_SCRIPT)
        .await
        .map_err(|e| Error::Browser(format!("MFA scan failed: {e}")))?
        .into_value()
        .map_err(|e| Error::Browser(format!("MFA scan decode failed: {e}")))?;

    let required = if scan.negative_present { 2 } else { 1 };
    let mut signals = 0u32;
    let mut mfa_type: Option<&str> = None;

    if scan.strong_context {
        signals += 1;
    }

    if scan.otp_high || (scan.otp_medium && scan.strong_context) || (scan.segmented_in_row && scan.strong_context) {
        signals += 1;
        if mfa_type.is_none() {
            mfa_type = Some(scan.type_guess.as_str());
        }
    }

    if signals < required {
        if let Some(t) = &scan.mfa_text_high {
            signals += 1;
            if mfa_type.is_none() {
                mfa_type = Some(t.as_str());
            }
        } else if scan.strong_context {
            if let Some(t) = &scan.mfa_text_medium {
                signals += 1;
                if mfa_type.is_none() {
                    mfa_type = Some(t.as_str());
                }
            }
        }
    }

    if signals < required {
        return Ok(MfaDetection { detected: false, confidence: Confidence::None, login_page_url: login_page_url.to_string(), mfa_type: None });
    }

    Ok(MfaDetection {
        detected: true,
        confidence: if signals > 1 { Confidence::High } else { Confidence::Medium },
        login_page_url: login_page_url.to_string(),
        mfa_type: Some(parse_mfa_type(mfa_type.unwrap_or("CUSTOM"))),
    })
}

fn parse_mfa_type(s: &str) -> MfaType {
    match s {
        "TOTP" => MfaType::Totp,
        "SMS" => MfaType::Sms,
        "EMAIL" => MfaType::Email,
        "QR" => MfaType::Qr,
        _ => MfaType::Custom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mfa_type_maps_known_strings() {
        assert_eq!(parse_mfa_type("SMS"), MfaType::Sms);
        assert_eq!(parse_mfa_type("unknown"), MfaType::Custom);
    }
}
