use engine::map::{EngineError, LayerKind, LayerSpec, MapEngine};
use formats::geojson::{Feature, FeatureCollection};
use formats::records::PolygonRecord;
use formats::wkt::{parse_polygon, parse_polygon_strict};
use foundation::bounds::BoundingBox;
use foundation::geo::Ring;
use foundation::ids::PolygonId;
use serde::{Deserialize, Serialize};

use crate::symbology::{PALETTE_SIZE, PolygonPalette};

pub const POLYGONS_SOURCE_ID: &str = "polygons-source";
pub const POLYGONS_FILL_LAYER: &str = "polygons-fill";
pub const POLYGONS_OUTLINE_LAYER: &str = "polygons-outline";

/// How strictly result geometry is read before it reaches the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryPolicy {
    /// Anything matching `POLYGON((...))` is drawn; bad numbers become `NaN`.
    #[default]
    Lenient,
    /// Only rings of finite coordinate pairs with at least 3 distinct points.
    Strict,
}

impl GeometryPolicy {
    pub fn parse(self, wkt: &str) -> Option<Ring> {
        match self {
            GeometryPolicy::Lenient => parse_polygon(wkt),
            GeometryPolicy::Strict => parse_polygon_strict(wkt).ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub id: PolygonId,
    pub name: String,
    pub ring: Ring,
    /// Position in the surviving list modulo [`PALETTE_SIZE`].
    pub color_index: usize,
}

impl PolygonFeature {
    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_ring(&self.ring)
    }

    pub fn to_geojson(&self) -> Feature {
        Feature::polygon(self.id.clone(), self.name.clone(), self.ring.clone(), self.color_index)
    }
}

/// Parses `records` in order, dropping those whose geometry does not parse.
///
/// Color indices follow the position in the surviving list, so an id's color
/// changes when the list order or membership changes.
pub fn build_features(records: &[PolygonRecord], policy: GeometryPolicy) -> (Vec<PolygonFeature>, usize) {
    let mut features = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    for record in records {
        let Some(ring) = policy.parse(&record.wkt) else {
            tracing::debug!(id = %record.id, "polygon geometry dropped");
            dropped += 1;
            continue;
        };
        let color_index = features.len() % PALETTE_SIZE;
        features.push(PolygonFeature {
            id: record.id.clone(),
            name: record.name.clone(),
            ring,
            color_index,
        });
    }
    (features, dropped)
}

pub fn feature_collection(features: &[PolygonFeature]) -> FeatureCollection {
    FeatureCollection::new(features.iter().map(PolygonFeature::to_geojson).collect())
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// Source and both layers were created.
    Created,
    /// Existing source data was replaced; layers untouched.
    Replaced,
    /// Style still loading; applied on [`PolygonLayerManager::on_style_loaded`].
    Deferred,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayerUpdate {
    pub kind: UpdateKind,
    pub features: usize,
    pub dropped: usize,
}

/// Owns the one GeoJSON source holding every result polygon and the fill and
/// outline layers drawn from it.
#[derive(Debug, Default)]
pub struct PolygonLayerManager {
    palette: PolygonPalette,
    policy: GeometryPolicy,
    features: Vec<PolygonFeature>,
    pending: Option<FeatureCollection>,
}

impl PolygonLayerManager {
    pub fn new(policy: GeometryPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> GeometryPolicy {
        self.policy
    }

    pub fn features(&self) -> &[PolygonFeature] {
        &self.features
    }

    pub fn feature(&self, id: &PolygonId) -> Option<&PolygonFeature> {
        self.features.iter().find(|f| &f.id == id)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Rebuilds the features from `records` and pushes them to the engine.
    pub fn update<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        records: &[PolygonRecord],
    ) -> Result<LayerUpdate, EngineError> {
        let (features, dropped) = build_features(records, self.policy);
        self.features = features;
        let collection = feature_collection(&self.features);
        let features = collection.len();

        let kind = if engine.has_source(POLYGONS_SOURCE_ID) {
            self.pending = None;
            engine.add_or_replace_source(POLYGONS_SOURCE_ID, &collection)?;
            UpdateKind::Replaced
        } else if engine.is_style_loaded() {
            self.pending = None;
            self.create(engine, &collection)?;
            UpdateKind::Created
        } else {
            tracing::debug!(features, "polygon layer deferred until style load");
            self.pending = Some(collection);
            UpdateKind::Deferred
        };

        Ok(LayerUpdate {
            kind,
            features,
            dropped,
        })
    }

    /// Applies the latest deferred collection, if any.
    pub fn on_style_loaded<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
    ) -> Result<Option<LayerUpdate>, EngineError> {
        let Some(collection) = self.pending.take() else {
            return Ok(None);
        };
        let features = collection.len();
        let kind = if engine.has_source(POLYGONS_SOURCE_ID) {
            engine.add_or_replace_source(POLYGONS_SOURCE_ID, &collection)?;
            UpdateKind::Replaced
        } else {
            self.create(engine, &collection)?;
            UpdateKind::Created
        };
        Ok(Some(LayerUpdate {
            kind,
            features,
            dropped: 0,
        }))
    }

    fn create<E: MapEngine + ?Sized>(
        &self,
        engine: &mut E,
        collection: &FeatureCollection,
    ) -> Result<(), EngineError> {
        engine.add_or_replace_source(POLYGONS_SOURCE_ID, collection)?;
        engine.add_layer(&LayerSpec {
            id: POLYGONS_FILL_LAYER.to_string(),
            kind: LayerKind::Fill,
            source: POLYGONS_SOURCE_ID.to_string(),
            paint: self.palette.fill_paint(),
        })?;
        engine.add_layer(&LayerSpec {
            id: POLYGONS_OUTLINE_LAYER.to_string(),
            kind: LayerKind::Line,
            source: POLYGONS_SOURCE_ID.to_string(),
            paint: self.palette.outline_paint(),
        })?;
        tracing::info!(features = collection.len(), "polygon layers created");
        Ok(())
    }
}
