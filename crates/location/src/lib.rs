//! Resolves the map's starting position from the device, the remembered
//! permission answer, and a fixed fallback point.
//!
//! ```text
//! AwaitingPermissionDecision --allow--> Acquiring --position--> Resolved(device)
//!            |                              |
//!            +--deny/dismiss--+             +--failure/unsupported--+
//!                             v                                     v
//!                     Resolved(fallback)                  Resolved(fallback)
//! ```
//!
//! `Resolved` is terminal for the session.

use foundation::geo::LngLat;
use permissions::{ChoiceStore, LocationChoice, load_or_unset};
use serde::{Deserialize, Serialize};

/// Azadi Square, Tehran.
pub const AZADI_SQUARE: LngLat = LngLat::new(51.3380, 35.6997);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterSource {
    Device,
    Fallback,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub center: LngLat,
    pub source: CenterSource,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LocationState {
    AwaitingPermissionDecision,
    Acquiring,
    Resolved(Resolution),
}

/// Why the device position could not be used. All variants lead to the
/// fallback point; the reason is only logged.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeolocationFailure {
    Unsupported,
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum LocationEvent {
    Allow,
    Deny,
    Dismiss,
    PositionAcquired(LngLat),
    PositionFailed(GeolocationFailure),
}

/// Work the host has to perform for the controller.
#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationCommand {
    ShowPrompt,
    RequestPosition,
    Resolved(Resolution),
}

#[derive(Debug, Clone)]
pub struct LocationController {
    state: LocationState,
    fallback: LngLat,
}

impl LocationController {
    /// Enters the machine from the stored choice, skipping the prompt when
    /// the user already answered this session.
    pub fn start<S: ChoiceStore + ?Sized>(
        store: &S,
        fallback: LngLat,
    ) -> (Self, Vec<LocationCommand>) {
        let mut controller = Self {
            state: LocationState::AwaitingPermissionDecision,
            fallback,
        };
        let commands = match load_or_unset(store) {
            LocationChoice::Unset => {
                tracing::debug!("location: no stored choice, prompting");
                vec![LocationCommand::ShowPrompt]
            }
            LocationChoice::Allowed => controller.begin_acquiring(),
            LocationChoice::Denied => vec![controller.resolve_fallback("stored choice is denied")],
        };
        (controller, commands)
    }

    pub fn state(&self) -> LocationState {
        self.state
    }

    pub fn fallback(&self) -> LngLat {
        self.fallback
    }

    /// True until the machine reaches `Resolved`.
    pub fn is_loading(&self) -> bool {
        !matches!(self.state, LocationState::Resolved(_))
    }

    pub fn resolved(&self) -> Option<Resolution> {
        match self.state {
            LocationState::Resolved(r) => Some(r),
            _ => None,
        }
    }

    pub fn handle<S: ChoiceStore + ?Sized>(
        &mut self,
        event: LocationEvent,
        store: &mut S,
    ) -> Vec<LocationCommand> {
        match (self.state, event) {
            (LocationState::AwaitingPermissionDecision, LocationEvent::Allow) => {
                persist(store, LocationChoice::Allowed);
                self.begin_acquiring()
            }
            (
                LocationState::AwaitingPermissionDecision,
                LocationEvent::Deny | LocationEvent::Dismiss,
            ) => {
                persist(store, LocationChoice::Denied);
                vec![self.resolve_fallback("user declined location")]
            }
            (LocationState::Acquiring, LocationEvent::PositionAcquired(p)) if p.is_finite() => {
                let resolution = Resolution {
                    center: p,
                    source: CenterSource::Device,
                };
                tracing::info!(lng = p.lng, lat = p.lat, "location: device position acquired");
                self.state = LocationState::Resolved(resolution);
                vec![LocationCommand::Resolved(resolution)]
            }
            (LocationState::Acquiring, LocationEvent::PositionAcquired(p)) => {
                tracing::warn!(?p, "location: device returned a non-finite position");
                vec![self.resolve_fallback("non-finite device position")]
            }
            (LocationState::Acquiring, LocationEvent::PositionFailed(reason)) => {
                tracing::debug!(?reason, "location: device position failed");
                vec![self.resolve_fallback("device position failed")]
            }
            (state, event) => {
                tracing::debug!(?state, ?event, "location: event ignored");
                Vec::new()
            }
        }
    }

    fn begin_acquiring(&mut self) -> Vec<LocationCommand> {
        self.state = LocationState::Acquiring;
        vec![LocationCommand::RequestPosition]
    }

    fn resolve_fallback(&mut self, why: &str) -> LocationCommand {
        tracing::info!("location: using fallback ({why})");
        let resolution = Resolution {
            center: self.fallback,
            source: CenterSource::Fallback,
        };
        self.state = LocationState::Resolved(resolution);
        LocationCommand::Resolved(resolution)
    }
}

fn persist<S: ChoiceStore + ?Sized>(store: &mut S, choice: LocationChoice) {
    if let Err(err) = store.save(choice) {
        tracing::warn!("location: could not remember choice {choice:?}: {err}");
    }
}
