//! Per-candidate, per-IdP recognition (§4.4). Stateless and pure given a
//! navigated [`BrowserContext`] and ruleset entry — the candidate×IdP
//! iteration and recognition-mode pruning (FAST/NORMAL/EXTENSIVE) live in
//! the analyzer, which is the only caller with visibility across the whole
//! scan.

use authscope_browser::har::HarRecorder;
use authscope_browser::{BrowserContext, BrowserDriver, ChromiumDriver};
use authscope_domain::config::{KeywordRecognitionConfig, LogoRecognitionConfig, RecognitionConfig};
use authscope_domain::error::Result;
use authscope_domain::model::{
    ElementCoordinates, IdentityProviderDetection, IdpDefinition, IdpFrame, RecognitionStrategy,
};
use authscope_locators::element::ElementDescriptor;
use authscope_locators::logo::{self, LogoMatch};

use crate::keyword::{self, KeywordHit};
use crate::request_match::{classify_integration, is_out_of_context_social_link, matches};

pub struct RunParams<'a> {
    pub login_page_url: &'a str,
    pub idp: &'a IdpDefinition,
    pub recognition: &'a RecognitionConfig,
    pub keyword_cfg: &'a KeywordRecognitionConfig,
    pub logo_cfg: &'a LogoRecognitionConfig,
    pub logo_template_png: Option<&'a [u8]>,
}

/// Run every strategy in `recognition.recognition_strategy_scope`, in order,
/// stopping at the first that yields matched elements, then clicks and
/// observes each matched element up to `max_elements_to_click`.
pub async fn run(ctx: &BrowserContext, params: RunParams<'_>) -> Result<Vec<IdentityProviderDetection>> {
    let mut detections = Vec::new();

    for strategy in &params.recognition.recognition_strategy_scope {
        let hit = match strategy.as_str() {
            "LOGO" => logo_hit(ctx, params.logo_cfg, params.logo_template_png).await?,
            other => keyword::recognize(ctx, params.idp, params.keyword_cfg, other).await?.map(GenericHit::from),
        };
        let Some(hit) = hit else { continue };

        let max_clicks = if strategy == "LOGO" {
            params.logo_cfg.max_elements_to_click
        } else {
            params.keyword_cfg.max_elements_to_click
        } as usize;

        for element in hit.elements.iter().take(max_clicks) {
            if is_out_of_context_social_link(&element.outer_html, &element.inner_text) {
                continue;
            }
            if let Some(detection) = click_and_observe(ctx, params.idp, params.login_page_url, element, strategy, hit.validity_tier, hit.logo_score).await? {
                detections.push(detection);
            }
        }

        if !detections.is_empty() {
            break;
        }
    }

    Ok(detections)
}

struct GenericHit {
    elements: Vec<ElementDescriptor>,
    logo_score: Option<f64>,
    validity_tier: Option<&'static str>,
}

impl From<KeywordHit> for GenericHit {
    fn from(h: KeywordHit) -> Self {
        Self { elements: h.elements, logo_score: None, validity_tier: h.validity_tier }
    }
}

async fn logo_hit(
    ctx: &BrowserContext,
    cfg: &LogoRecognitionConfig,
    template_png: Option<&[u8]>,
) -> Result<Option<GenericHit>> {
    let Some(template) = template_png else { return Ok(None) };
    let screenshot = ChromiumDriver::new().screenshot(ctx).await?;
    let decoded = decode_zlib_base64(&screenshot)?;
    let Some(m): Option<LogoMatch> = logo::locate(&decoded, template, cfg)? else { return Ok(None) };
    let element = ElementDescriptor {
        x: m.x as f64,
        y: m.y as f64,
        width: m.width as f64,
        height: m.height as f64,
        inner_text: String::new(),
        outer_html: String::new(),
        element_tree: None,
    };
    Ok(Some(GenericHit { elements: vec![element], logo_score: Some(m.score), validity_tier: None }))
}

fn decode_zlib_base64(encoded: &str) -> Result<Vec<u8>> {
    use authscope_domain::error::Error;
    use base64::Engine;
    let compressed = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| Error::Browser(format!("screenshot decode failed: {e}")))?;
    let mut decoder = flate2::read::ZlibDecoder::new(&compressed[..]);
    let mut out = Vec::new();
    std::io::Read::read_to_end(&mut decoder, &mut out).map_err(|e| Error::Browser(format!("screenshot inflate failed: {e}")))?;
    Ok(out)
}

async fn click_and_observe(
    ctx: &BrowserContext,
    idp: &IdpDefinition,
    login_page_url: &str,
    element: &ElementDescriptor,
    strategy: &str,
    validity_tier: Option<&'static str>,
    logo_score: Option<f64>,
) -> Result<Option<IdentityProviderDetection>> {
    let pre_click_url = ctx.page.url().await.ok().flatten().unwrap_or_default();
    let recorder = HarRecorder::attach(ctx).await?;

    let cx = element.x + element.width / 2.0;
    let cy = element.y + element.height / 2.0;
    let click_script = format!(
        "(() => {{ const el = document.elementFromPoint({cx}, {cy}); if (el) el.click(); return true; }})()"
    );
    let _ = ctx.page.evaluate(click_script).await;

    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(2);
    let mut matched_request = None;
    let mut frame = IdpFrame::Topmost;

    while tokio::time::Instant::now() < deadline {
        for url in recorder.request_urls() {
            if matches(&idp.login_request_rule, &url)
                || idp.passive_login_request_rule.as_ref().is_some_and(|r| matches(r, &url))
            {
                matched_request = Some(url);
                break;
            }
        }
        if matched_request.is_some() {
            break;
        }
        if let Ok(pages) = ctx.browser.pages().await {
            for page in &pages {
                if page.target_id() == ctx.page.target_id() {
                    continue;
                }
                if let Ok(Some(url)) = page.url().await {
                    if url != "about:blank" {
                        frame = IdpFrame::Popup;
                        if matched_request.is_none()
                            && (matches(&idp.login_request_rule, &url)
                                || idp.passive_login_request_rule.as_ref().is_some_and(|r| matches(r, &url)))
                        {
                            matched_request = Some(url.clone());
                        }
                        let _ = page.close().await;
                    }
                }
            }
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    let current_url = ctx.page.url().await.ok().flatten().unwrap_or_default();
    if current_url != pre_click_url {
        let _ = ctx.page.goto(&pre_click_url).await;
    }

    let Some(observed_url) = matched_request else { return Ok(None) };
    let idp_integration = classify_integration(idp, &observed_url);

    Ok(Some(IdentityProviderDetection {
        idp_name: idp.name.clone(),
        idp_integration,
        idp_frame: frame,
        login_page_url: login_page_url.to_string(),
        element_coordinates: ElementCoordinates { x: element.x, y: element.y, width: element.width, height: element.height },
        element_inner_text: element.inner_text.clone(),
        element_outer_html: element.outer_html.clone(),
        element_tree: element.element_tree.clone().unwrap_or_default(),
        recognition_strategy: if strategy == "LOGO" { RecognitionStrategy::Logo } else { RecognitionStrategy::Keyword },
        keyword_matched: (strategy != "LOGO").then(|| idp.keywords.join(", ")),
        keyword_validity_tier: validity_tier.map(str::to_string),
        logo_match_score: logo_score,
        idp_login_request: Some(observed_url),
        idp_screenshot: None,
    }))
}
