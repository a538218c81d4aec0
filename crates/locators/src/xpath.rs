//! XPath locator: same keyword/attribute semantics as the CSS locator,
//! expressed as an XPath expression with `translate()` for case-insensitive
//! matching and an optional exact-match mode (§4.2).

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};

use crate::element::{ElementDescriptor, HIGH_VALIDITY_ATTRIBUTES, MAX_LOCATOR_CANDIDATES};

const LOWER_MAP: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const UPPER_MAP: &str = "abcdefghijklmnopqrstuvwxyz";

/// Build an XPath 1.0 expression matching any of `phrases` (case-insensitive
/// via `translate`) in text content or any of `attrs`. When `exact` is set,
/// the phrase must equal the normalized text/attribute rather than merely
/// be contained within it.
pub fn build_expression(phrases: &[String], attrs: &[&str], exact: bool) -> String {
    let conditions: Vec<String> = phrases
        .iter()
        .map(|p| p.to_lowercase())
        .flat_map(|p| {
            let mut parts = vec![text_condition(&p, exact)];
            parts.extend(attrs.iter().map(|a| attr_condition(a, &p, exact)));
            parts
        })
        .collect();
    format!("//*[{}]", conditions.join(" or "))
}

fn translate_lower(expr: &str) -> String {
    format!("translate({expr}, '{LOWER_MAP}', '{UPPER_MAP}')")
}

fn text_condition(phrase: &str, exact: bool) -> String {
    let lowered = translate_lower("normalize-space(text())");
    if exact {
        format!("{lowered}='{phrase}'")
    } else {
        format!("contains({lowered}, '{phrase}')")
    }
}

fn attr_condition(attr: &str, phrase: &str, exact: bool) -> String {
    let lowered = translate_lower(&format!("@{attr}"));
    if exact {
        format!("{lowered}='{phrase}'")
    } else {
        format!("contains({lowered}, '{phrase}')")
    }
}

/// Evaluate the built XPath expression against the live page. `document.evaluate`
/// has no concept of bounding boxes, so this still reads geometry via
/// `getBoundingClientRect` on each matched node from JS.
pub async fn locate(
    ctx: &BrowserContext,
    phrases: &[String],
    exact: bool,
) -> Result<Vec<ElementDescriptor>> {
    if phrases.is_empty() {
        return Ok(Vec::new());
    }
    let xpath = build_expression(phrases, HIGH_VALIDITY_ATTRIBUTES, exact);
    let xpath_json = serde_json::to_string(&xpath).unwrap_or_else(|_| "\"\"".into());

    let script = format!(
        r#"(() => {{
  const result = document.evaluate({xpath_json}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
  const out = [];
  for (let i = 0; i < result.snapshotLength && out.length < 100; i++) {{
    const el = result.snapshotItem(i);
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
  }}
  return out;
}})()"#
    );

    let value = ctx
        .page
        .evaluate(script)
        .await
        .map_err(|e| Error::Browser(format!("xpath locator evaluate failed: {e}")))?
        .into_value::<Vec<ElementDescriptor>>()
        .map_err(|e| Error::Browser(format!("xpath locator decode failed: {e}")))?;

    Ok(value.into_iter().take(MAX_LOCATOR_CANDIDATES).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mode_uses_equality_not_contains() {
        let expr = build_expression(&["sign in".into()], &["aria-label"], true);
        assert!(expr.contains("='sign in'"));
        assert!(!expr.contains("contains("));
    }

    #[test]
    fn default_mode_uses_contains() {
        let expr = build_expression(&["sign in".into()], &["aria-label"], false);
        assert!(expr.contains("contains("));
    }
}
