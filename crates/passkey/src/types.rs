use authscope_domain::model::{Confidence, ElementCoordinates};

/// A single detection layer's contribution (§4.5 "Confidence aggregation").
/// The orchestrator takes the max confidence across all `LayerHit`s and
/// keeps the richest element context for the final record.
pub struct LayerHit {
    pub confidence: Confidence,
    pub indicators: Vec<String>,
    pub element_coordinates: Option<ElementCoordinates>,
    pub element_inner_text: Option<String>,
}
