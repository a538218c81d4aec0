use serde::{Deserialize, Serialize};

/// A located page element, always in absolute page coordinates (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub inner_text: String,
    pub outer_html: String,
    /// Ancestor-tag stack at the element (or, for click-driven captures, at
    /// the click point via `elementsFromPoint`).
    #[serde(default)]
    pub element_tree: Option<Vec<String>>,
}

impl ElementDescriptor {
    pub fn has_nonzero_box(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Attribute set used by the high-validity CSS/XPath selector (§4.2).
pub const HIGH_VALIDITY_ATTRIBUTES: &[&str] =
    &["title", "aria-label", "value", "id", "alt", "label", "name", "placeholder"];

/// Extended attribute set used by the low-validity selector.
pub const LOW_VALIDITY_ATTRIBUTES: &[&str] = &[
    "title",
    "aria-label",
    "value",
    "id",
    "alt",
    "label",
    "name",
    "placeholder",
    "class",
    "action",
    "href",
    "data",
];

/// Structural tags excluded from every locator match.
pub const EXCLUDED_TAGS: &[&str] = &["script", "html", "body", "head", "noscript"];

/// Hard cap on candidates returned by any single locator invocation.
pub const MAX_LOCATOR_CANDIDATES: usize = 100;
