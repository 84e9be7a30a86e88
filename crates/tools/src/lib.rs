//! Command implementations behind the `courtmap` binary.

use std::fs;
use std::path::Path;

use districts_web::config::MapConfig;
use formats::geojson::FeatureCollection;
use formats::records::{polygon_records, results_from_json};
use formats::wkt::parse_polygon_strict;
use foundation::bounds::BoundingBox;
use foundation::geo::{LngLat, Ring};
use layers::polygons::{GeometryPolicy, build_features, feature_collection};
use query::params::{FindParams, parse_courts_param};
use serde::Serialize;

pub fn policy_for(strict: bool, config: &MapConfig) -> GeometryPolicy {
    if strict {
        GeometryPolicy::Strict
    } else {
        config.geometry_policy
    }
}

pub fn parse_ring(wkt: &str, policy: GeometryPolicy) -> Result<Ring, String> {
    match policy {
        // Keep the strict reader's reason instead of a bare "no match".
        GeometryPolicy::Strict => parse_polygon_strict(wkt).map_err(|e| e.to_string()),
        GeometryPolicy::Lenient => policy
            .parse(wkt)
            .ok_or_else(|| "no POLYGON((...)) found".to_string()),
    }
}

pub fn ring_bounds(wkt: &str, policy: GeometryPolicy) -> Result<BoundingBox, String> {
    let ring = parse_ring(wkt, policy)?;
    BoundingBox::from_ring(&ring)
        .filter(BoundingBox::is_finite)
        .ok_or_else(|| "ring has no finite coordinates".to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundsReport {
    #[serde(flatten)]
    pub bounds: BoundingBox,
    pub center: LngLat,
}

pub fn bounds_report(wkt: &str, policy: GeometryPolicy) -> Result<BoundsReport, String> {
    let bounds = ring_bounds(wkt, policy)?;
    Ok(BoundsReport {
        bounds,
        center: bounds.center(),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeaturesReport {
    pub collection: FeatureCollection,
    pub dropped: usize,
}

/// Builds the colored collection the map would show for a court-find
/// response body.
pub fn features_from_results(raw: &str, policy: GeometryPolicy) -> Result<FeaturesReport, String> {
    let results = results_from_json(raw).map_err(|e| format!("results json: {e}"))?;
    let (features, dropped) = build_features(&polygon_records(&results), policy);
    Ok(FeaturesReport {
        collection: feature_collection(&features),
        dropped,
    })
}

pub fn find_url(config: &MapConfig, courts: &str, position: LngLat) -> Result<String, String> {
    let ids = parse_courts_param(courts);
    let params = FindParams::enabled(&ids, Some(position))
        .ok_or_else(|| "at least one court id is required".to_string())?;
    Ok(config.find_url(&params.path()))
}

pub fn load_config(path: Option<&Path>) -> Result<MapConfig, String> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
            MapConfig::from_json(&text).map_err(|e| e.to_string())
        }
        None => Ok(MapConfig::default()),
    }
}

/// Applies `COURTMAP_*` overrides. `lookup` is `std::env::var` in the binary.
pub fn apply_env_overrides<F>(mut config: MapConfig, lookup: F) -> Result<MapConfig, String>
where
    F: Fn(&str) -> Option<String>,
{
    config.api_base_url = lookup("COURTMAP_API_BASE_URL").unwrap_or(config.api_base_url);
    config.search_debounce_ms = env_u64(&lookup, "COURTMAP_DEBOUNCE_MS", config.search_debounce_ms);
    config.viewport.padding_px = env_f64(&lookup, "COURTMAP_PADDING_PX", config.viewport.padding_px);
    config.viewport.max_zoom = env_f64(&lookup, "COURTMAP_MAX_ZOOM", config.viewport.max_zoom);
    config.viewport.marker_zoom = env_f64(&lookup, "COURTMAP_MARKER_ZOOM", config.viewport.marker_zoom);
    if let Some(v) = lookup("COURTMAP_QUERY_FOLLOWS_VIEWPORT") {
        config.query_follows_viewport = matches!(v.trim(), "1" | "true" | "yes");
    }
    if let Some(v) = lookup("COURTMAP_GEOMETRY_POLICY") {
        config.geometry_policy = match v.trim() {
            "strict" => GeometryPolicy::Strict,
            "lenient" => GeometryPolicy::Lenient,
            other => return Err(format!("COURTMAP_GEOMETRY_POLICY: unknown policy {other:?}")),
        };
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn env_u64<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn env_f64<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: f64) -> f64 {
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
