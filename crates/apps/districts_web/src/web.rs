use std::cell::RefCell;

use console_error_panic_hook::set_once;
use engine::map::{EngineError, FitBoundsOptions, LayerSpec, MapEngine};
use formats::geojson::FeatureCollection;
use formats::records::results_from_json;
use foundation::bounds::BoundingBox;
use foundation::geo::LngLat;
use foundation::ids::PolygonId;
use foundation::time::Millis;
use gloo_net::http::Request;
use location::GeolocationFailure;
use permissions::{
    ChoiceStore, DEFAULT_CHOICE_KEY, InMemoryChoiceStore, SessionStorageChoiceStore,
};
use query::params::parse_courts_param;
use query::tracker::{FetchError, FindRequest};
use runtime::debounce::DebounceTicket;
use tracing::Level;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::config::MapConfig;
use crate::console_log::line_subscriber;
use crate::controller::{AppCommand, AppEvent, DistrictsController};
use crate::session::SessionSlot;

#[wasm_bindgen]
extern "C" {
    /// `maplibregl.Map`, created and owned by the page.
    #[wasm_bindgen(js_namespace = maplibregl, js_name = Map)]
    pub type MaplibreMap;

    #[wasm_bindgen(method, js_name = isStyleLoaded)]
    fn is_style_loaded(this: &MaplibreMap) -> bool;

    #[wasm_bindgen(method, js_name = getSource)]
    fn get_source(this: &MaplibreMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = addSource)]
    fn add_source(this: &MaplibreMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer(this: &MaplibreMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = fitBounds)]
    fn fit_bounds(this: &MaplibreMap, bounds: &JsValue, options: &JsValue);

    #[wasm_bindgen(method, js_name = flyTo)]
    fn fly_to(this: &MaplibreMap, options: &JsValue);

    #[wasm_bindgen(js_namespace = maplibregl, js_name = GeoJSONSource)]
    type GeoJsonSource;

    #[wasm_bindgen(method, catch, js_name = setData)]
    fn set_data(this: &GeoJsonSource, data: &JsValue) -> Result<(), JsValue>;
}

struct MaplibreEngine {
    map: MaplibreMap,
    /// `(lng, lat) => void`; the page owns the draggable marker.
    place_marker: js_sys::Function,
}

fn to_js(value: &serde_json::Value) -> Result<JsValue, EngineError> {
    js_sys::JSON::parse(&value.to_string()).map_err(|e| EngineError::Backend(format!("{e:?}")))
}

impl MapEngine for MaplibreEngine {
    fn is_style_loaded(&self) -> bool {
        self.map.is_style_loaded()
    }

    fn has_source(&self, id: &str) -> bool {
        let source = self.map.get_source(id);
        !(source.is_undefined() || source.is_null())
    }

    fn add_or_replace_source(&mut self, id: &str, data: &FeatureCollection) -> Result<(), EngineError> {
        let raw = data
            .to_json()
            .map_err(|e| EngineError::Backend(e.to_string()))?;
        let geojson = js_sys::JSON::parse(&raw).map_err(|e| EngineError::Backend(format!("{e:?}")))?;

        let existing = self.map.get_source(id);
        if !(existing.is_undefined() || existing.is_null()) {
            return existing
                .unchecked_into::<GeoJsonSource>()
                .set_data(&geojson)
                .map_err(|e| EngineError::Backend(format!("setData: {e:?}")));
        }
        if !self.map.is_style_loaded() {
            return Err(EngineError::StyleNotLoaded);
        }
        let spec = js_sys::Object::new();
        js_sys::Reflect::set(&spec, &"type".into(), &"geojson".into())
            .map_err(|e| EngineError::Backend(format!("{e:?}")))?;
        js_sys::Reflect::set(&spec, &"data".into(), &geojson)
            .map_err(|e| EngineError::Backend(format!("{e:?}")))?;
        self.map
            .add_source(id, &spec)
            .map_err(|e| EngineError::Backend(format!("addSource: {e:?}")))
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), EngineError> {
        let spec = to_js(&layer.to_style_json())?;
        self.map
            .add_layer(&spec)
            .map_err(|e| EngineError::Backend(format!("addLayer: {e:?}")))
    }

    fn fit_bounds(&mut self, bounds: BoundingBox, options: FitBoundsOptions) {
        let bounds = serde_json::json!(bounds.corners());
        let options = serde_json::json!({
            "padding": options.padding_px,
            "maxZoom": options.max_zoom,
        });
        match (to_js(&bounds), to_js(&options)) {
            (Ok(b), Ok(o)) => self.map.fit_bounds(&b, &o),
            _ => tracing::warn!("fitBounds arguments could not be built"),
        }
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64) {
        let options = serde_json::json!({ "center": [center.lng, center.lat], "zoom": zoom });
        match to_js(&options) {
            Ok(o) => self.map.fly_to(&o),
            Err(err) => tracing::warn!("flyTo arguments could not be built: {err}"),
        }
    }

    fn place_marker(&mut self, position: LngLat) {
        if let Err(e) = self.place_marker.call2(
            &JsValue::NULL,
            &JsValue::from_f64(position.lng),
            &JsValue::from_f64(position.lat),
        ) {
            tracing::warn!("placeMarker callback failed: {e:?}");
        }
    }
}

type WebSession = SessionSlot<MaplibreEngine, Box<dyn ChoiceStore>>;

thread_local! {
    static SESSION: WebSession = const { SessionSlot::new() };
    /// Receives every host-facing command as a JSON string.
    static ON_COMMAND: RefCell<Option<js_sys::Function>> = const { RefCell::new(None) };
}

fn console_line(level: Level, line: &str) {
    let line = JsValue::from_str(line);
    if level == Level::ERROR {
        web_sys::console::error_1(&line);
    } else if level == Level::WARN {
        web_sys::console::warn_1(&line);
    } else {
        web_sys::console::log_1(&line);
    }
}

fn now() -> Millis {
    Millis(js_sys::Date::now().max(0.0) as u64)
}

fn choice_store() -> Box<dyn ChoiceStore> {
    match SessionStorageChoiceStore::new(DEFAULT_CHOICE_KEY) {
        Ok(store) => Box::new(store),
        Err(err) => {
            tracing::warn!("session storage unavailable, choice kept in memory: {err}");
            Box::new(InMemoryChoiceStore::new())
        }
    }
}

/// Opens the map session. `courts` is the raw `?courts=` query value.
#[wasm_bindgen]
pub fn start_session(
    map: MaplibreMap,
    place_marker: js_sys::Function,
    on_command: js_sys::Function,
    config_json: &str,
    courts: &str,
) -> Result<(), JsValue> {
    set_once();
    // Later sessions keep the first subscriber.
    let _ = tracing::subscriber::set_global_default(line_subscriber(console_line, Level::INFO));
    let config = MapConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let engine = MaplibreEngine { map, place_marker };
    ON_COMMAND.with(|c| *c.borrow_mut() = Some(on_command));
    let commands = SESSION
        .with(|s| {
            s.open(|| {
                DistrictsController::start(config, engine, choice_store(), parse_courts_param(courts))
            })
        })
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    execute(commands);
    Ok(())
}

/// Drives one event through the session, then runs the resulting commands
/// with the session released. Events raised by the map while an engine call
/// is in flight are queued and handled by the outer call.
fn dispatch(event: AppEvent) {
    let commands = SESSION.with(|s| s.dispatch(event));
    execute(commands);
}

fn execute(commands: Vec<AppCommand>) {
    for command in commands {
        match command {
            AppCommand::Fetch(request) => spawn_fetch(request),
            AppCommand::ScheduleTimer { ticket } => schedule_timer(ticket),
            other => notify_host(&other),
        }
    }
}

fn notify_host(command: &AppCommand) {
    let json = match serde_json::to_string(command) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!("command not serializable: {err}");
            return;
        }
    };
    let callback = ON_COMMAND.with(|c| c.borrow().clone());
    if let Some(callback) = callback {
        if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(&json)) {
            web_sys::console::log_1(&JsValue::from_str(&format!("command handler threw: {e:?}")));
        }
    }
}

fn schedule_timer(ticket: DebounceTicket) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let delay = ticket.due_at.since(now()).min(i32::MAX as u64) as i32;
    let callback = Closure::once_into_js(move || {
        dispatch(AppEvent::TimerFired { ticket, at: now() });
    });
    if let Err(e) = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
    {
        tracing::warn!("setTimeout failed: {e:?}");
    }
}

fn spawn_fetch(request: FindRequest) {
    let url = SESSION.with(|s| s.with(|controller| controller.config().find_url(&request.path)));
    let Some(url) = url else {
        return;
    };
    spawn_local(async move {
        let outcome = fetch_results(&url).await;
        dispatch(AppEvent::FetchCompleted {
            key: request.key,
            outcome,
        });
    });
}

async fn fetch_results(
    url: &str,
) -> Result<Vec<formats::records::CourtFindResult>, FetchError> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    if !resp.ok() {
        return Err(FetchError::Http {
            status: resp.status(),
        });
    }
    let text = resp
        .text()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    results_from_json(&text).map_err(|e| FetchError::Decode(e.to_string()))
}

#[wasm_bindgen]
pub fn permission_allowed() {
    dispatch(AppEvent::PermissionAllowed);
}

#[wasm_bindgen]
pub fn permission_denied() {
    dispatch(AppEvent::PermissionDenied);
}

#[wasm_bindgen]
pub fn permission_dismissed() {
    dispatch(AppEvent::PermissionDismissed);
}

#[wasm_bindgen]
pub fn position_acquired(lng: f64, lat: f64) {
    dispatch(AppEvent::PositionAcquired(LngLat::new(lng, lat)));
}

/// `code` is the `GeolocationPositionError.code`; `0` means no geolocation.
#[wasm_bindgen]
pub fn position_failed(code: u16) {
    let reason = match code {
        1 => GeolocationFailure::PermissionDenied,
        2 => GeolocationFailure::PositionUnavailable,
        3 => GeolocationFailure::Timeout,
        _ => GeolocationFailure::Unsupported,
    };
    dispatch(AppEvent::PositionFailed(reason));
}

#[wasm_bindgen]
pub fn style_loaded() {
    dispatch(AppEvent::StyleLoaded);
}

#[wasm_bindgen]
pub fn marker_dragged(lng: f64, lat: f64) {
    dispatch(AppEvent::MarkerDragged(LngLat::new(lng, lat)));
}

#[wasm_bindgen]
pub fn move_ended(lng: f64, lat: f64, zoom: f64) {
    dispatch(AppEvent::MoveEnded {
        center: LngLat::new(lng, lat),
        zoom,
    });
}

#[wasm_bindgen]
pub fn search_input(text: String) {
    dispatch(AppEvent::SearchInput { text, at: now() });
}

#[wasm_bindgen]
pub fn result_selected(id: &str) {
    dispatch(AppEvent::ResultSelected(PolygonId::new(id)));
}

#[wasm_bindgen]
pub fn frame_all() {
    dispatch(AppEvent::FrameAllRequested);
}

/// Sidebar state as JSON (`{"status": ..., "items": [...]}`).
#[wasm_bindgen]
pub fn sidebar_json() -> Result<String, JsValue> {
    let sidebar = SESSION
        .with(|s| s.with(|controller| controller.sidebar()))
        .ok_or_else(|| JsValue::from_str("no active session"))?;
    serde_json::to_string(&sidebar).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Unmount: pending search timers become no-ops and the session is dropped.
#[wasm_bindgen]
pub fn end_session() {
    if SESSION.with(|s| s.end()) {
        ON_COMMAND.with(|c| c.borrow_mut().take());
    }
}
