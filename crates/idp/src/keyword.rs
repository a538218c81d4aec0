//! Keyword-based recognition strategies: `KEYWORD-CSS`, `KEYWORD-XPATH`,
//! `KEYWORD-ACCESSIBILITY` (§4.4). Each substitutes the IdP's own keywords
//! (e.g. "google") into the configured high-validity phrase templates
//! (e.g. `"continue with %s"`).

use authscope_browser::BrowserContext;
use authscope_domain::config::KeywordRecognitionConfig;
use authscope_domain::error::Result;
use authscope_domain::model::IdpDefinition;
use authscope_locators::element::ElementDescriptor;
use authscope_locators::{accessibility, css, xpath};

pub struct KeywordHit {
    pub elements: Vec<ElementDescriptor>,
    /// "HIGH" or "LOW", absent for the accessibility strategy which has no
    /// validity tiering.
    pub validity_tier: Option<&'static str>,
}

pub async fn recognize(
    ctx: &BrowserContext,
    idp: &IdpDefinition,
    cfg: &KeywordRecognitionConfig,
    strategy: &str,
) -> Result<Option<KeywordHit>> {
    match strategy {
        "KEYWORD-CSS" => {
            let (tier, elements) = css::locate(ctx, &idp.keywords, &cfg.keywords).await?;
            if elements.is_empty() {
                return Ok(None);
            }
            let tier_name = match tier {
                css::ValidityTier::High => "HIGH",
                css::ValidityTier::Low => "LOW",
            };
            Ok(Some(KeywordHit { elements, validity_tier: Some(tier_name) }))
        }
        "KEYWORD-XPATH" => {
            let phrases: Vec<String> = idp
                .keywords
                .iter()
                .flat_map(|kw| cfg.xpath.iter().map(move |p| p.replace("%s", kw)))
                .collect();
            let elements = xpath::locate(ctx, &phrases, false).await?;
            if elements.is_empty() {
                return Ok(None);
            }
            Ok(Some(KeywordHit { elements, validity_tier: None }))
        }
        "KEYWORD-ACCESSIBILITY" => {
            let elements = accessibility::locate(ctx, &idp.keywords).await?;
            if elements.is_empty() {
                return Ok(None);
            }
            Ok(Some(KeywordHit { elements, validity_tier: None }))
        }
        _ => Ok(None),
    }
}
