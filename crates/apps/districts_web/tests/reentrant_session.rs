use std::cell::RefCell;

use districts_web::{
    AppCommand, AppEvent, DistrictsController, METRIC_MOVES_SUPPRESSED, MapConfig, SessionSlot,
};
use engine::map::{EngineError, FitBoundsOptions, LayerSpec, MapEngine};
use engine::recording::RecordingEngine;
use formats::geojson::FeatureCollection;
use foundation::bounds::BoundingBox;
use foundation::geo::LngLat;
use permissions::{InMemoryChoiceStore, LocationChoice};
use pretty_assertions::assert_eq;

/// A map that settles without animating: move-end fires before the camera
/// call returns, straight back into the session.
struct InstantMap {
    inner: RecordingEngine,
}

impl MapEngine for InstantMap {
    fn is_style_loaded(&self) -> bool {
        self.inner.is_style_loaded()
    }

    fn has_source(&self, id: &str) -> bool {
        self.inner.has_source(id)
    }

    fn add_or_replace_source(&mut self, id: &str, data: &FeatureCollection) -> Result<(), EngineError> {
        self.inner.add_or_replace_source(id, data)
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError> {
        self.inner.add_layer(layer)
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, options: FitBoundsOptions) {
        self.inner.fit_bounds(bounds, options);
        settle(bounds.center(), options.max_zoom);
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64) {
        self.inner.fly_to(center, zoom);
        settle(center, zoom);
    }

    fn place_marker(&mut self, position: LngLat) {
        self.inner.place_marker(position);
    }
}

type Slot = SessionSlot<InstantMap, InMemoryChoiceStore>;

thread_local! {
    static SESSION: Slot = const { SessionSlot::new() };
    static NESTED: RefCell<Vec<Vec<AppCommand>>> = const { RefCell::new(Vec::new()) };
}

fn settle(center: LngLat, zoom: f64) {
    let commands = SESSION.with(|s| s.dispatch(AppEvent::MoveEnded { center, zoom }));
    NESTED.with(|n| n.borrow_mut().push(commands));
}

fn open(choice: LocationChoice) -> Vec<AppCommand> {
    SESSION
        .with(|s| {
            s.open(|| {
                DistrictsController::start(
                    MapConfig::default(),
                    InstantMap {
                        inner: RecordingEngine::loaded(),
                    },
                    InMemoryChoiceStore::with_choice(choice),
                    vec!["7".to_string()],
                )
            })
        })
        .expect("idle slot")
}

fn suppressed_moves() -> Option<u64> {
    SESSION.with(|s| s.with(|c| c.metrics().counter(METRIC_MOVES_SUPPRESSED)))
}

#[test]
fn synchronous_move_end_is_queued_and_suppressed() {
    assert_eq!(open(LocationChoice::Allowed), vec![AppCommand::RequestPosition]);

    let here = LngLat::new(51.42, 35.72);
    let commands = SESSION.with(|s| s.dispatch(AppEvent::PositionAcquired(here)));

    // The nested call only queued its event.
    assert_eq!(NESTED.with(|n| n.take()), vec![Vec::new()]);
    assert!(commands.contains(&AppCommand::LocatingChanged { loading: false }));
    assert!(commands.iter().any(|c| matches!(c, AppCommand::Fetch(_))));
    assert!(
        !commands
            .iter()
            .any(|c| matches!(c, AppCommand::ViewportMoved { .. })),
        "{commands:?}"
    );
    assert_eq!(suppressed_moves(), Some(1));
    let view = SESSION.with(|s| s.with(|c| c.view_state())).expect("session");
    assert_eq!(view.center, here);
    assert!(!view.is_programmatic_move);

    let dragged = LngLat::new(51.5, 35.8);
    let commands = SESSION.with(|s| {
        s.dispatch(AppEvent::MoveEnded {
            center: dragged,
            zoom: 14.0,
        })
    });
    assert_eq!(
        commands,
        vec![AppCommand::ViewportMoved {
            center: dragged,
            zoom: 14.0
        }]
    );
}

#[test]
fn move_end_raised_during_startup_is_handled_after_it() {
    let commands = open(LocationChoice::Denied);
    assert_eq!(NESTED.with(|n| n.take()), vec![Vec::new()]);
    assert!(commands.iter().any(|c| matches!(c, AppCommand::Fetch(_))));
    assert!(
        !commands
            .iter()
            .any(|c| matches!(c, AppCommand::ViewportMoved { .. })),
        "{commands:?}"
    );
    assert_eq!(suppressed_moves(), Some(1));
}

#[test]
fn ended_session_ignores_events() {
    open(LocationChoice::Denied);
    NESTED.with(|n| n.take());
    assert!(SESSION.with(|s| s.end()));
    assert!(!SESSION.with(|s| s.end()));
    assert!(SESSION.with(|s| s.dispatch(AppEvent::FrameAllRequested)).is_empty());
    assert!(SESSION.with(|s| s.with(|c| c.sidebar())).is_none());
}
