//! Single-threaded dispatcher for one map session.
//!
//! Hosts feed [`AppEvent`]s in and carry out the returned [`AppCommand`]s
//! (prompting, geolocation, HTTP, timers, notifications). Events raised while
//! handling another event are queued and processed in order before
//! [`DistrictsController::dispatch`] returns, so a move-end can never be seen
//! before the camera command that caused it.

use engine::map::MapEngine;
use formats::records::{CourtFindResult, polygon_records};
use foundation::geo::LngLat;
use foundation::ids::PolygonId;
use foundation::time::Millis;
use layers::polygons::{PolygonFeature, PolygonLayerManager};
use location::{GeolocationFailure, LocationCommand, LocationController, LocationEvent};
use permissions::ChoiceStore;
use query::params::{FindParams, QueryKey};
use query::tracker::{FetchError, FetchState, FindRequest, QueryTracker, RequestOutcome};
use runtime::debounce::DebounceTicket;
use runtime::event_bus::EventBus;
use runtime::metrics::Metrics;
use serde::Serialize;
use viewport::state::MapViewState;
use viewport::sync::{FocusOutcome, MoveOutcome, ViewportSync};

use crate::config::MapConfig;
use crate::search::{SearchBox, SearchQuery};
use crate::sidebar::{SidebarStatus, sidebar_status};

pub const METRIC_POLYGONS_DROPPED: &str = "polygons.dropped";
pub const METRIC_MOVES_SUPPRESSED: &str = "viewport.moves_suppressed";
pub const METRIC_STALE_RESPONSES: &str = "query.stale_responses";
pub const METRIC_FETCHES: &str = "query.fetches";

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    PermissionAllowed,
    PermissionDenied,
    PermissionDismissed,
    PositionAcquired(LngLat),
    PositionFailed(GeolocationFailure),
    StyleLoaded,
    /// The user finished dragging the marker.
    MarkerDragged(LngLat),
    /// The camera settled, whoever moved it.
    MoveEnded { center: LngLat, zoom: f64 },
    SearchInput { text: String, at: Millis },
    TimerFired { ticket: DebounceTicket, at: Millis },
    ResultSelected(PolygonId),
    FrameAllRequested,
    FetchCompleted {
        key: QueryKey,
        outcome: Result<Vec<CourtFindResult>, FetchError>,
    },
    /// Posted internally when the search position changes.
    SearchPositionChanged(LngLat),
}

/// Work handed back to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AppCommand {
    ShowPermissionPrompt,
    RequestPosition,
    /// Emitted once, when the start location resolves.
    LocatingChanged { loading: bool },
    Fetch(FindRequest),
    /// Call back with [`AppEvent::TimerFired`] at `due_at`.
    ScheduleTimer { ticket: DebounceTicket },
    SearchSettled { text: String },
    /// A user-driven camera move.
    ViewportMoved { center: LngLat, zoom: f64 },
    SearchPositionChanged { position: LngLat },
}

pub struct DistrictsController<E: MapEngine, S: ChoiceStore> {
    config: MapConfig,
    engine: E,
    store: S,
    bus: EventBus<AppEvent>,
    location: LocationController,
    layers: PolygonLayerManager,
    viewport: ViewportSync,
    query: QueryTracker,
    search: SearchBox,
    judicial_ids: Vec<String>,
    marker: Option<LngLat>,
    metrics: Metrics,
    outbox: Vec<AppCommand>,
}

impl<E: MapEngine, S: ChoiceStore> DistrictsController<E, S> {
    /// Opens a session. The returned commands start location acquisition.
    pub fn start(
        config: MapConfig,
        engine: E,
        store: S,
        judicial_ids: Vec<String>,
    ) -> (Self, Vec<AppCommand>) {
        let (location, location_commands) = LocationController::start(&store, config.fallback_center);
        let mut controller = Self {
            layers: PolygonLayerManager::new(config.geometry_policy),
            viewport: ViewportSync::new(config.initial_center, config.initial_zoom, config.viewport),
            search: SearchBox::new(config.search_debounce_ms),
            config,
            engine,
            store,
            bus: EventBus::new(),
            location,
            query: QueryTracker::new(),
            judicial_ids,
            marker: None,
            metrics: Metrics::new(),
            outbox: Vec::new(),
        };
        tracing::info!(courts = controller.judicial_ids.len(), "districts session started");

        // The empty layer is set up right away so results only ever swap data.
        controller.refresh_layers();
        controller.apply_location(location_commands);
        let commands = controller.run_until_idle();
        (controller, commands)
    }

    pub fn dispatch(&mut self, event: AppEvent) -> Vec<AppCommand> {
        self.bus.post(event);
        self.run_until_idle()
    }

    /// Stops pending timers and drops queued events. Safe to call twice.
    pub fn teardown(&mut self) {
        self.search.cancel();
        self.bus.clear();
        tracing::debug!("districts session torn down");
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn is_locating(&self) -> bool {
        self.location.is_loading()
    }

    pub fn marker(&self) -> Option<LngLat> {
        self.marker
    }

    pub fn view_state(&self) -> MapViewState {
        self.viewport.state()
    }

    pub fn features(&self) -> &[PolygonFeature] {
        self.layers.features()
    }

    pub fn fetch_state(&self) -> &FetchState {
        self.query.state()
    }

    pub fn search_query(&self) -> &SearchQuery {
        self.search.query()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn sidebar(&self) -> SidebarStatus {
        sidebar_status(self.is_locating(), self.query.state())
    }

    fn run_until_idle(&mut self) -> Vec<AppCommand> {
        while let Some(event) = self.bus.pop() {
            self.handle(event);
        }
        std::mem::take(&mut self.outbox)
    }

    fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::PermissionAllowed => self.location_event(LocationEvent::Allow),
            AppEvent::PermissionDenied => self.location_event(LocationEvent::Deny),
            AppEvent::PermissionDismissed => self.location_event(LocationEvent::Dismiss),
            AppEvent::PositionAcquired(p) => self.location_event(LocationEvent::PositionAcquired(p)),
            AppEvent::PositionFailed(reason) => {
                self.location_event(LocationEvent::PositionFailed(reason))
            }
            AppEvent::StyleLoaded => match self.layers.on_style_loaded(&mut self.engine) {
                Ok(Some(update)) => tracing::debug!(?update, "deferred polygon layer applied"),
                Ok(None) => {}
                Err(err) => tracing::warn!("polygon layer setup failed: {err}"),
            },
            AppEvent::MarkerDragged(p) => {
                if self.marker.is_none() {
                    tracing::debug!("marker drag before location resolved, ignored");
                    return;
                }
                self.bus.post(AppEvent::SearchPositionChanged(p));
            }
            AppEvent::MoveEnded { center, zoom } => self.move_ended(center, zoom),
            AppEvent::SearchInput { text, at } => {
                let ticket = self.search.input(text, at);
                self.outbox.push(AppCommand::ScheduleTimer { ticket });
            }
            AppEvent::TimerFired { ticket, at } => {
                if let Some(text) = self.search.fire(ticket, at) {
                    self.outbox.push(AppCommand::SearchSettled { text });
                }
            }
            AppEvent::ResultSelected(id) => {
                let outcome = self
                    .viewport
                    .focus(&mut self.engine, &id, self.layers.features());
                if outcome == FocusOutcome::NotFound {
                    tracing::debug!(%id, "selected result has no polygon on the map");
                }
            }
            AppEvent::FrameAllRequested => {
                self.viewport.frame_all(&mut self.engine, self.layers.features());
            }
            AppEvent::FetchCompleted { key, outcome } => {
                if let Err(err) = &outcome {
                    tracing::warn!(%key, "court search failed: {err}");
                }
                if self.query.complete(&key, outcome) {
                    self.refresh_layers();
                } else {
                    self.metrics.inc(METRIC_STALE_RESPONSES);
                }
            }
            AppEvent::SearchPositionChanged(p) => self.set_search_position(p, true),
        }
    }

    /// `recenter` flies the camera to the marker; a pan that moved the search
    /// position already has the camera where the user wants it.
    fn set_search_position(&mut self, p: LngLat, recenter: bool) {
        self.marker = Some(p);
        if recenter {
            self.viewport.follow_marker(&mut self.engine, p);
        } else {
            self.viewport.place_marker(&mut self.engine, p);
        }
        self.outbox.push(AppCommand::SearchPositionChanged { position: p });
        self.refresh_query();
    }

    fn location_event(&mut self, event: LocationEvent) {
        let commands = self.location.handle(event, &mut self.store);
        self.apply_location(commands);
    }

    fn apply_location(&mut self, commands: Vec<LocationCommand>) {
        for command in commands {
            match command {
                LocationCommand::ShowPrompt => self.outbox.push(AppCommand::ShowPermissionPrompt),
                LocationCommand::RequestPosition => self.outbox.push(AppCommand::RequestPosition),
                LocationCommand::Resolved(resolution) => {
                    tracing::info!(source = ?resolution.source, "start location resolved");
                    self.outbox.push(AppCommand::LocatingChanged { loading: false });
                    self.bus.post(AppEvent::SearchPositionChanged(resolution.center));
                }
            }
        }
    }

    fn move_ended(&mut self, center: LngLat, zoom: f64) {
        match self.viewport.on_move_end(center, zoom) {
            MoveOutcome::Suppressed => self.metrics.inc(METRIC_MOVES_SUPPRESSED),
            MoveOutcome::Notify { center, zoom } => {
                self.outbox.push(AppCommand::ViewportMoved { center, zoom });
                if self.config.query_follows_viewport && self.marker.is_some() {
                    self.set_search_position(center, false);
                }
            }
        }
    }

    fn refresh_query(&mut self) {
        let params = FindParams::enabled(&self.judicial_ids, self.marker);
        match self.query.request(params) {
            RequestOutcome::Started(request) => {
                self.metrics.inc(METRIC_FETCHES);
                self.outbox.push(AppCommand::Fetch(request));
                // Polygons of the previous key go away while the new one loads.
                self.refresh_layers();
            }
            RequestOutcome::Disabled => self.refresh_layers(),
            RequestOutcome::Unchanged => {}
        }
    }

    fn refresh_layers(&mut self) {
        let records = polygon_records(self.query.results());
        match self.layers.update(&mut self.engine, &records) {
            Ok(update) => {
                if update.dropped > 0 {
                    self.metrics.add(METRIC_POLYGONS_DROPPED, update.dropped as u64);
                }
            }
            Err(err) => tracing::warn!("polygon layer update failed: {err}"),
        }
    }
}
