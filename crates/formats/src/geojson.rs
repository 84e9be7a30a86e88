//! Minimal GeoJSON model for the polygon source handed to the map engine.

use foundation::geo::Ring;
use foundation::ids::PolygonId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub properties: FeatureProperties,
    pub geometry: PolygonGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    pub id: PolygonId,
    pub name: String,
    /// Key into the layer palette; read by the paint `match` expressions.
    #[serde(rename = "colorIndex")]
    pub color_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Polygon")]
pub struct PolygonGeometry {
    /// Outer ring only. Non-finite coordinates serialize as `null`.
    pub coordinates: Vec<Ring>,
}

impl Feature {
    pub fn polygon(id: PolygonId, name: impl Into<String>, ring: Ring, color_index: usize) -> Self {
        Self {
            properties: FeatureProperties {
                id,
                name: name.into(),
                color_index,
            },
            geometry: PolygonGeometry {
                coordinates: vec![ring],
            },
        }
    }
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Feature, FeatureCollection};
    use foundation::geo::LngLat;
    use foundation::ids::PolygonId;
    use serde_json::json;

    #[test]
    fn serializes_as_geojson() {
        let ring = vec![
            LngLat::new(0.0, 0.0),
            LngLat::new(1.0, 0.0),
            LngLat::new(1.0, 1.0),
        ];
        let fc = FeatureCollection::new(vec![Feature::polygon(PolygonId::new("a"), "A", ring, 2)]);
        let value = serde_json::to_value(&fc).expect("serialize");
        assert_eq!(
            value,
            json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "properties": { "id": "a", "name": "A", "colorIndex": 2 },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]]
                    }
                }]
            })
        );
    }

    #[test]
    fn nan_coordinates_become_null() {
        let ring = vec![LngLat::new(f64::NAN, 1.0)];
        let fc = FeatureCollection::new(vec![Feature::polygon(PolygonId::new("x"), "X", ring, 0)]);
        let raw = fc.to_json().expect("serialize");
        assert!(raw.contains("[[[null,1.0]]]"));
    }

    #[test]
    fn round_trips_through_json() {
        let fc = FeatureCollection::default();
        let raw = fc.to_json().expect("serialize");
        assert_eq!(raw, r#"{"type":"FeatureCollection","features":[]}"#);
        let back: FeatureCollection = serde_json::from_str(&raw).expect("decode");
        assert!(back.is_empty());
    }
}
