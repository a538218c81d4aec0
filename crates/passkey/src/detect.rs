//! Top-level orchestrator (§4.5): runs every detection layer, aggregates
//! confidence as the max across layers that fired, and — when something
//! fired — attempts an implementation capture.

use authscope_browser::BrowserContext;
use authscope_domain::error::Result;
use authscope_domain::model::{Confidence, PasskeyDetection, PasskeyDetectionMethod, PasskeyImplementation};

use crate::types::LayerHit;
use crate::{api, capture, enterprise, js, keyword, ui};

/// Runs all five layers against the already-navigated page at `login_page_url`
/// and, if any layer fired, attempts a WebAuthn implementation capture.
pub async fn run(ctx: &BrowserContext, login_page_url: &str) -> Result<PasskeyDetection> {
    let webauthn_api_available = api::is_available(ctx).await?;
    if !webauthn_api_available {
        tracing::debug!(url = login_page_url, "webauthn API unavailable, skipping passkey detection");
        return Ok(negative());
    }

    let host = url::Url::parse(login_page_url).ok().and_then(|u| u.host_str().map(str::to_string)).unwrap_or_default();

    let mut hits: Vec<(PasskeyDetectionMethod, LayerHit)> = Vec::new();
    if let Some(hit) = enterprise::detect(ctx, &host).await? {
        hits.push((PasskeyDetectionMethod::Enterprise, hit));
    }
    if let Some(hit) = ui::detect(ctx).await? {
        hits.push((PasskeyDetectionMethod::Ui, hit));
    }
    if let Some(hit) = js::detect(ctx).await? {
        hits.push((PasskeyDetectionMethod::Js, hit));
    }
    if let Some(hit) = keyword::detect(ctx).await? {
        hits.push((PasskeyDetectionMethod::Keyword, hit));
    }

    if hits.is_empty() {
        return Ok(PasskeyDetection {
            detected: false,
            detection_methods: Default::default(),
            confidence: Confidence::None,
            indicators: Vec::new(),
            webauthn_api_available,
            element_coordinates: None,
            element_inner_text: None,
            implementation: PasskeyImplementation::default(),
        });
    }

    let detection_methods = hits.iter().map(|(m, _)| *m).collect();
    let confidence = hits.iter().map(|(_, h)| h.confidence).max().unwrap_or(Confidence::None);
    let indicators: Vec<String> = hits.iter().flat_map(|(_, h)| h.indicators.clone()).take(5).collect();

    let richest = hits
        .iter()
        .filter(|(_, h)| h.element_coordinates.is_some())
        .max_by_key(|(_, h)| h.confidence)
        .map(|(_, h)| h);
    let element_coordinates = richest.and_then(|h| h.element_coordinates.clone());
    let element_inner_text = richest.and_then(|h| h.element_inner_text.clone());

    let implementation = capture::capture(ctx).await.unwrap_or_default();

    Ok(PasskeyDetection {
        detected: true,
        detection_methods,
        confidence,
        indicators,
        webauthn_api_available,
        element_coordinates,
        element_inner_text,
        implementation,
    })
}

fn negative() -> PasskeyDetection {
    PasskeyDetection {
        detected: false,
        detection_methods: Default::default(),
        confidence: Confidence::None,
        indicators: Vec::new(),
        webauthn_api_available: false,
        element_coordinates: None,
        element_inner_text: None,
        implementation: PasskeyImplementation::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_result_satisfies_invariant() {
        assert!(negative().invariant_holds());
    }
}
