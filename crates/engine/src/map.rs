//! The narrow slice of a web map engine (maplibre-gl style) the core drives.
//!
//! Map creation and gesture callbacks stay in the host; the host turns
//! `dragend` / `moveend` / `load` into events and hands the engine to the
//! session controller, which is the only caller of these methods.

use foundation::bounds::BoundingBox;
use foundation::geo::LngLat;
use formats::geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Fill,
    Line,
}

impl LayerKind {
    pub fn style_type(self) -> &'static str {
        match self {
            LayerKind::Fill => "fill",
            LayerKind::Line => "line",
        }
    }
}

/// A style layer bound to a source, with a paint object in the engine's
/// expression language.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub kind: LayerKind,
    pub source: String,
    pub paint: Value,
}

impl LayerSpec {
    pub fn to_style_json(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.kind.style_type(),
            "source": self.source,
            "paint": self.paint,
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitBoundsOptions {
    pub padding_px: f64,
    pub max_zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    StyleNotLoaded,
    MissingSource(String),
    DuplicateLayer(String),
    Backend(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::StyleNotLoaded => write!(f, "map style is not done loading"),
            EngineError::MissingSource(id) => write!(f, "source {id:?} does not exist"),
            EngineError::DuplicateLayer(id) => write!(f, "layer {id:?} already exists"),
            EngineError::Backend(msg) => write!(f, "map engine error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

pub trait MapEngine {
    fn is_style_loaded(&self) -> bool;

    fn has_source(&self, id: &str) -> bool;

    /// Creates a GeoJSON source, or replaces the data of an existing one in
    /// place (layers bound to it keep their styling).
    fn add_or_replace_source(&mut self, id: &str, data: &FeatureCollection) -> Result<(), EngineError>;

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError>;

    fn fit_bounds(&mut self, bounds: BoundingBox, options: FitBoundsOptions);

    fn fly_to(&mut self, center: LngLat, zoom: f64);

    /// Creates the draggable marker on first use, moves it afterwards.
    fn place_marker(&mut self, position: LngLat);
}

#[cfg(test)]
mod tests {
    use super::{LayerKind, LayerSpec};
    use serde_json::json;

    #[test]
    fn layer_style_json() {
        let spec = LayerSpec {
            id: "polygons-outline".to_string(),
            kind: LayerKind::Line,
            source: "polygons-source".to_string(),
            paint: json!({ "line-width": 2 }),
        };
        assert_eq!(
            spec.to_style_json(),
            json!({
                "id": "polygons-outline",
                "type": "line",
                "source": "polygons-source",
                "paint": { "line-width": 2 }
            })
        );
    }
}
