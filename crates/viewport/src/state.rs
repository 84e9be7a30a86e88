use foundation::geo::LngLat;
use serde::{Deserialize, Serialize};

/// Where the map currently looks.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapViewState {
    pub center: LngLat,
    pub zoom: f64,
    /// Set right before a code-issued camera change; cleared by the next
    /// move-end. Never persisted.
    pub is_programmatic_move: bool,
}

impl MapViewState {
    pub fn new(center: LngLat, zoom: f64) -> Self {
        Self {
            center,
            zoom,
            is_programmatic_move: false,
        }
    }
}

/// Fixed framing parameters for programmatic camera moves.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub padding_px: f64,
    /// Zoom ceiling for fit-to-bounds, however small the polygon.
    pub max_zoom: f64,
    /// Zoom used when flying to the marker.
    pub marker_zoom: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            padding_px: 50.0,
            max_zoom: 15.0,
            marker_zoom: 14.0,
        }
    }
}
