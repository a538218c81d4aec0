//! Accessibility locator: walks the full CDP accessibility tree rather than
//! the DOM, matching node names/roles against the same phrase set as the
//! CSS/XPath locators, then resolves absolute geometry via `DOM.getBoxModel`
//! (§4.2).

use chromiumoxide::cdp::browser_protocol::accessibility::GetFullAxTreeParams;
use chromiumoxide::cdp::browser_protocol::dom::GetBoxModelParams;

use authscope_browser::BrowserContext;
use authscope_domain::error::{Error, Result};

use crate::element::{ElementDescriptor, MAX_LOCATOR_CANDIDATES};

/// Roles that never carry actionable sign-in affordances; skipped even on a
/// text match to keep noise (generic containers, text nodes) out of results.
const IGNORED_ROLES: &[&str] = &["text", "generic", "none", "presentation", "InlineTextBox"];

pub async fn locate(ctx: &BrowserContext, phrases: &[String]) -> Result<Vec<ElementDescriptor>> {
    if phrases.is_empty() {
        return Ok(Vec::new());
    }
    let lowered: Vec<String> = phrases.iter().map(|p| p.to_lowercase()).collect();

    let tree = ctx
        .page
        .execute(GetFullAxTreeParams::default())
        .await
        .map_err(|e| Error::Browser(format!("accessibility tree fetch failed: {e}")))?;

    let mut out = Vec::new();
    for node in tree.result.nodes.iter() {
        if out.len() >= MAX_LOCATOR_CANDIDATES {
            break;
        }
        let role = node
            .role
            .as_ref()
            .and_then(|v| v.value.as_ref())
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        if IGNORED_ROLES.iter().any(|r| r.eq_ignore_ascii_case(role)) {
            continue;
        }
        let name = node
            .name
            .as_ref()
            .and_then(|v| v.value.as_ref())
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_lowercase();
        if name.is_empty() || !lowered.iter().any(|p| name.contains(p.as_str())) {
            continue;
        }
        let Some(backend_id) = node.backend_dom_node_id else {
            continue;
        };
        let Ok(model) = ctx
            .page
            .execute(GetBoxModelParams::builder().backend_node_id(backend_id).build())
            .await
        else {
            continue;
        };
        let quad = &model.result.model.content;
        if quad.len() < 8 {
            continue;
        }
        let xs = [quad[0], quad[2], quad[4], quad[6]];
        let ys = [quad[1], quad[3], quad[5], quad[7]];
        let (x_min, x_max) = (xs.iter().cloned().fold(f64::MAX, f64::min), xs.iter().cloned().fold(f64::MIN, f64::max));
        let (y_min, y_max) = (ys.iter().cloned().fold(f64::MAX, f64::min), ys.iter().cloned().fold(f64::MIN, f64::max));
        let width = x_max - x_min;
        let height = y_max - y_min;
        if width <= 0.0 || height <= 0.0 {
            continue;
        }
        out.push(ElementDescriptor {
            x: x_min,
            y: y_min,
            width,
            height,
            inner_text: name,
            outer_html: String::new(),
            element_tree: Some(vec![role.to_string()]),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignored_roles_filter_text_nodes() {
        assert!(IGNORED_ROLES.contains(&"text"));
        assert!(IGNORED_ROLES.contains(&"generic"));
    }
}
