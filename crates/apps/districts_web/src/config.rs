use foundation::geo::LngLat;
use layers::polygons::GeometryPolicy;
use location::AZADI_SQUARE;
use serde::{Deserialize, Serialize};
use viewport::state::ViewportConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "map config parse error: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "map config invalid: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Session settings. Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Camera position before the start location resolves.
    pub initial_center: LngLat,
    pub initial_zoom: f64,
    /// Used whenever the device position is unavailable or declined.
    pub fallback_center: LngLat,
    pub viewport: ViewportConfig,
    pub search_debounce_ms: u64,
    /// Prefix for `/court/find`; empty means same origin.
    pub api_base_url: String,
    /// When set, a user pan moves the search position to the new center.
    pub query_follows_viewport: bool,
    pub geometry_policy: GeometryPolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_center: LngLat::new(51.389, 35.6892),
            initial_zoom: 11.0,
            fallback_center: AZADI_SQUARE,
            viewport: ViewportConfig::default(),
            search_debounce_ms: 500,
            api_base_url: String::new(),
            query_follows_viewport: false,
            geometry_policy: GeometryPolicy::Lenient,
        }
    }
}

impl MapConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_center.is_finite() || !self.fallback_center.is_finite() {
            return Err(ConfigError::Invalid("centers must be finite".to_string()));
        }
        let zooms = [
            self.initial_zoom,
            self.viewport.max_zoom,
            self.viewport.marker_zoom,
        ];
        if zooms.iter().any(|z| !z.is_finite() || *z < 0.0) {
            return Err(ConfigError::Invalid("zoom levels must be finite and >= 0".to_string()));
        }
        if !self.viewport.padding_px.is_finite() || self.viewport.padding_px < 0.0 {
            return Err(ConfigError::Invalid("padding must be finite and >= 0".to_string()));
        }
        Ok(())
    }

    pub fn find_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_json_gives_defaults() {
        assert_eq!(MapConfig::from_json("{}"), Ok(MapConfig::default()));
        assert_eq!(MapConfig::from_json(""), Ok(MapConfig::default()));
    }

    #[test]
    fn partial_override() {
        let config = MapConfig::from_json(
            r#"{"search_debounce_ms": 250, "viewport": {"max_zoom": 16}, "geometry_policy": "strict"}"#,
        )
        .expect("config");
        assert_eq!(config.search_debounce_ms, 250);
        assert_eq!(config.viewport.max_zoom, 16.0);
        assert_eq!(config.viewport.padding_px, 50.0);
        assert_eq!(config.geometry_policy, GeometryPolicy::Strict);
        assert_eq!(config.fallback_center, AZADI_SQUARE);
    }

    #[test]
    fn rejects_negative_zoom() {
        assert!(matches!(
            MapConfig::from_json(r#"{"initial_zoom": -1}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(MapConfig::from_json("[1,"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn find_url_joins_base() {
        let config = MapConfig {
            api_base_url: "https://api.example.org/".to_string(),
            ..MapConfig::default()
        };
        assert_eq!(
            config.find_url("/court/find?x=1"),
            "https://api.example.org/court/find?x=1"
        );
    }
}
