//! CSS locator: substitutes keywords into high-validity patterns (e.g.
//! `"sign in with %s"`) and falls back to raw low-validity keyword matching
//! over a wider attribute set (§4.2).

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};

use crate::element::{
    ElementDescriptor, EXCLUDED_TAGS, HIGH_VALIDITY_ATTRIBUTES, LOW_VALIDITY_ATTRIBUTES,
    MAX_LOCATOR_CANDIDATES,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityTier {
    High,
    Low,
}

/// Run the CSS locator. Tries high-validity patterns first; only falls back
/// to the raw low-validity keyword match if high-validity yields nothing,
/// matching the IdP keyword recognition order in §4.4.
pub async fn locate(
    ctx: &BrowserContext,
    keywords: &[String],
    high_validity_patterns: &[String],
) -> Result<(ValidityTier, Vec<ElementDescriptor>)> {
    let high = locate_tier(ctx, keywords, high_validity_patterns, ValidityTier::High).await?;
    if !high.is_empty() {
        return Ok((ValidityTier::High, high));
    }
    let low = locate_tier(ctx, keywords, &[], ValidityTier::Low).await?;
    Ok((ValidityTier::Low, low))
}

async fn locate_tier(
    ctx: &BrowserContext,
    keywords: &[String],
    patterns: &[String],
    tier: ValidityTier,
) -> Result<Vec<ElementDescriptor>> {
    let phrases: Vec<String> = match tier {
        ValidityTier::High => keywords
            .iter()
            .flat_map(|kw| patterns.iter().map(move |p| p.replace("%s", kw)))
            .collect(),
        ValidityTier::Low => keywords.to_vec(),
    };
    if phrases.is_empty() {
        return Ok(Vec::new());
    }

    let attrs: &[&str] = match tier {
        ValidityTier::High => HIGH_VALIDITY_ATTRIBUTES,
        ValidityTier::Low => LOW_VALIDITY_ATTRIBUTES,
    };

    let script = build_locate_script(&phrases, attrs);
    let value = ctx
        .page
        .evaluate(script)
        .await
        .map_err(|e| Error::Browser(format!("css locator evaluate failed: {e}")))?
        .into_value::<Vec<ElementDescriptor>>()
        .map_err(|e| Error::Browser(format!("css locator decode failed: {e}")))?;

    Ok(value
        .into_iter()
        .filter(ElementDescriptor::has_nonzero_box)
        .take(MAX_LOCATOR_CANDIDATES)
        .collect())
}

/// Build the JS snippet that scans every non-excluded element's text and the
/// given attribute set for a case-insensitive phrase match, then reports
/// absolute bounding boxes via `getBoundingClientRect` offset by scroll
/// position.
fn build_locate_script(phrases: &[String], attrs: &[&str]) -> String {
    let phrases_json = serde_json::to_string(phrases).unwrap_or_else(|_| "[]".into());
    let attrs_json = serde_json::to_string(attrs).unwrap_or_else(|_| "[]".into());
    let excluded_json = serde_json::to_string(EXCLUDED_TAGS).unwrap_or_else(|_| "[]".into());

    format!(
        r#"(() => {{
  const phrases = {phrases_json}.map(p => p.toLowerCase());
  const attrs = {attrs_json};
  const excluded = new Set({excluded_json});
  const out = [];
  const matches = (text) => phrases.some(p => text.includes(p));
  for (const el of document.querySelectorAll('*')) {{
    const tag = el.tagName.toLowerCase();
    if (excluded.has(tag)) continue;
    let hit = matches((el.textContent || '').toLowerCase());
    if (!hit) {{
      for (const a of attrs) {{
        const v = el.getAttribute(a);
        if (v && matches(v.toLowerCase())) {{ hit = true; break; }}
      }}
    }}
    if (!hit) continue;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') continue;
    const r = el.getBoundingClientRect();
    if (r.width <= 0 || r.height <= 0) continue;
    out.push({{
      x: r.left + window.scrollX,
      y: r.top + window.scrollY,
      width: r.width,
      height: r.height,
      inner_text: (el.textContent || '').trim().slice(0, 500),
      outer_html: el.outerHTML.slice(0, 2000),
      element_tree: null,
    }});
    if (out.length >= 100) break;
  }}
  return out;
}})()"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_locate_script_embeds_phrases_as_json() {
        let script = build_locate_script(&["sign in with google".into()], HIGH_VALIDITY_ATTRIBUTES);
        assert!(script.contains("sign in with google"));
        assert!(script.contains("getBoundingClientRect"));
    }
}
