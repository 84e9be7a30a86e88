use std::collections::BTreeMap;

use foundation::bounds::BoundingBox;
use foundation::geo::LngLat;
use formats::geojson::FeatureCollection;

use crate::map::{EngineError, FitBoundsOptions, LayerKind, LayerSpec, MapEngine};

/// One call observed by [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    AddSource { id: String, features: usize },
    ReplaceSourceData { id: String, features: usize },
    AddLayer { id: String, kind: LayerKind },
    FitBounds { bounds: BoundingBox, options: FitBoundsOptions },
    FlyTo { center: LngLat, zoom: f64 },
    CreateMarker(LngLat),
    MoveMarker(LngLat),
}

/// In-memory engine that keeps sources and layers and records every call.
///
/// It enforces the same ordering rules as a real style: sources and layers
/// can only be added once the style is loaded, layers need an existing source
/// and unique ids. Replacing existing source data works at any time.
#[derive(Debug, Default)]
pub struct RecordingEngine {
    style_loaded: bool,
    sources: BTreeMap<String, FeatureCollection>,
    layers: Vec<LayerSpec>,
    marker: Option<LngLat>,
    calls: Vec<EngineCall>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loaded() -> Self {
        Self {
            style_loaded: true,
            ..Self::default()
        }
    }

    pub fn finish_style_load(&mut self) {
        self.style_loaded = true;
    }

    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn marker(&self) -> Option<LngLat> {
        self.marker
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<EngineCall> {
        std::mem::take(&mut self.calls)
    }
}

impl MapEngine for RecordingEngine {
    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_or_replace_source(&mut self, id: &str, data: &FeatureCollection) -> Result<(), EngineError> {
        if let Some(existing) = self.sources.get_mut(id) {
            *existing = data.clone();
            self.calls.push(EngineCall::ReplaceSourceData {
                id: id.to_string(),
                features: data.len(),
            });
            return Ok(());
        }
        if !self.style_loaded {
            return Err(EngineError::StyleNotLoaded);
        }
        self.sources.insert(id.to_string(), data.clone());
        self.calls.push(EngineCall::AddSource {
            id: id.to_string(),
            features: data.len(),
        });
        Ok(())
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError> {
        if !self.style_loaded {
            return Err(EngineError::StyleNotLoaded);
        }
        if !self.sources.contains_key(&layer.source) {
            return Err(EngineError::MissingSource(layer.source.clone()));
        }
        if self.layers.iter().any(|l| l.id == layer.id) {
            return Err(EngineError::DuplicateLayer(layer.id.clone()));
        }
        self.layers.push(layer.clone());
        self.calls.push(EngineCall::AddLayer {
            id: layer.id.clone(),
            kind: layer.kind,
        });
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, options: FitBoundsOptions) {
        self.calls.push(EngineCall::FitBounds { bounds, options });
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64) {
        self.calls.push(EngineCall::FlyTo { center, zoom });
    }

    fn place_marker(&mut self, position: LngLat) {
        let call = match self.marker {
            None => EngineCall::CreateMarker(position),
            Some(_) => EngineCall::MoveMarker(position),
        };
        self.marker = Some(position);
        self.calls.push(call);
    }
}

#[cfg(test)]
mod tests {
    use super::{EngineCall, RecordingEngine};
    use crate::map::{EngineError, LayerKind, LayerSpec, MapEngine};
    use formats::geojson::FeatureCollection;
    use foundation::geo::LngLat;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fill(source: &str) -> LayerSpec {
        LayerSpec {
            id: "fill".to_string(),
            kind: LayerKind::Fill,
            source: source.to_string(),
            paint: json!({}),
        }
    }

    #[test]
    fn sources_need_a_loaded_style() {
        let mut e = RecordingEngine::new();
        let fc = FeatureCollection::default();
        assert_eq!(e.add_or_replace_source("s", &fc), Err(EngineError::StyleNotLoaded));
        e.finish_style_load();
        assert!(e.add_or_replace_source("s", &fc).is_ok());
        assert!(e.has_source("s"));
    }

    #[test]
    fn layers_need_source_and_unique_id() {
        let mut e = RecordingEngine::loaded();
        assert_eq!(e.add_layer(&fill("s")), Err(EngineError::MissingSource("s".to_string())));
        e.add_or_replace_source("s", &FeatureCollection::default()).expect("source");
        e.add_layer(&fill("s")).expect("layer");
        assert_eq!(e.add_layer(&fill("s")), Err(EngineError::DuplicateLayer("fill".to_string())));
    }

    #[test]
    fn marker_is_created_then_moved() {
        let mut e = RecordingEngine::new();
        e.place_marker(LngLat::new(1.0, 2.0));
        e.place_marker(LngLat::new(3.0, 4.0));
        assert_eq!(
            e.take_calls(),
            vec![
                EngineCall::CreateMarker(LngLat::new(1.0, 2.0)),
                EngineCall::MoveMarker(LngLat::new(3.0, 4.0)),
            ]
        );
        assert_eq!(e.marker(), Some(LngLat::new(3.0, 4.0)));
    }
}
