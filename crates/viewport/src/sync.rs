use engine::map::{FitBoundsOptions, MapEngine};
use foundation::bounds::BoundingBox;
use foundation::geo::LngLat;
use foundation::ids::PolygonId;
use layers::polygons::PolygonFeature;

use crate::state::{MapViewState, ViewportConfig};

/// Result of a move-end event.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum MoveOutcome {
    /// The move was issued by code; collaborators are not told.
    Suppressed,
    /// A user-driven move collaborators should hear about.
    Notify { center: LngLat, zoom: f64 },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FocusOutcome {
    Framed(BoundingBox),
    NotFound,
    /// The ring had no finite extent; nothing was issued.
    Unframeable,
}

/// Keeps the camera and marker in step with the core, and tells programmatic
/// camera moves apart from user gestures.
///
/// Every camera command issued here sets `is_programmatic_move` before the
/// engine sees it, and the next [`ViewportSync::on_move_end`] swallows exactly
/// one notification.
#[derive(Debug, Clone)]
pub struct ViewportSync {
    state: MapViewState,
    config: ViewportConfig,
}

impl ViewportSync {
    pub fn new(center: LngLat, zoom: f64, config: ViewportConfig) -> Self {
        Self {
            state: MapViewState::new(center, zoom),
            config,
        }
    }

    pub fn state(&self) -> MapViewState {
        self.state
    }

    pub fn config(&self) -> ViewportConfig {
        self.config
    }

    /// Frames the polygon `id` from `features`; unknown ids are a no-op.
    pub fn focus<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        id: &PolygonId,
        features: &[PolygonFeature],
    ) -> FocusOutcome {
        let Some(feature) = features.iter().find(|f| &f.id == id) else {
            tracing::debug!(%id, "focus: polygon not in current set");
            return FocusOutcome::NotFound;
        };
        match feature.bounds() {
            Some(bounds) if bounds.is_finite() => {
                self.fit(engine, bounds);
                FocusOutcome::Framed(bounds)
            }
            _ => {
                tracing::warn!(%id, "focus: polygon has no finite bounds");
                FocusOutcome::Unframeable
            }
        }
    }

    /// Frames the union of every feature with a finite extent.
    pub fn frame_all<E: MapEngine + ?Sized>(
        &mut self,
        engine: &mut E,
        features: &[PolygonFeature],
    ) -> Option<BoundingBox> {
        let bounds = features
            .iter()
            .filter_map(PolygonFeature::bounds)
            .filter(BoundingBox::is_finite)
            .reduce(|a, b| a.union(&b))?;
        self.fit(engine, bounds);
        Some(bounds)
    }

    /// Places the marker and flies the camera to it.
    pub fn follow_marker<E: MapEngine + ?Sized>(&mut self, engine: &mut E, position: LngLat) {
        engine.place_marker(position);
        self.state.is_programmatic_move = true;
        engine.fly_to(position, self.config.marker_zoom);
    }

    /// Moves only the marker; the camera and the user's zoom stay put.
    pub fn place_marker<E: MapEngine + ?Sized>(&mut self, engine: &mut E, position: LngLat) {
        engine.place_marker(position);
    }

    pub fn on_move_end(&mut self, center: LngLat, zoom: f64) -> MoveOutcome {
        self.state.center = center;
        self.state.zoom = zoom;
        if self.state.is_programmatic_move {
            self.state.is_programmatic_move = false;
            tracing::trace!("viewport: programmatic move-end suppressed");
            return MoveOutcome::Suppressed;
        }
        MoveOutcome::Notify { center, zoom }
    }

    fn fit<E: MapEngine + ?Sized>(&mut self, engine: &mut E, bounds: BoundingBox) {
        self.state.is_programmatic_move = true;
        engine.fit_bounds(
            bounds,
            FitBoundsOptions {
                padding_px: self.config.padding_px,
                max_zoom: self.config.max_zoom,
            },
        );
    }
}
