//! Re-entrant home for the one live session of a host.
//!
//! Engine calls made while an event is handled may call straight back into
//! the host (a map that settles synchronously fires its move-end before
//! `flyTo` returns). Such events are queued behind the one being handled and
//! drained by the outermost [`SessionSlot::dispatch`].

use std::cell::RefCell;
use std::fmt;

use engine::map::MapEngine;
use permissions::ChoiceStore;
use runtime::event_bus::EventBus;

use crate::controller::{AppCommand, AppEvent, DistrictsController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionBusy;

impl fmt::Display for SessionBusy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session is handling an event")
    }
}

impl std::error::Error for SessionBusy {}

pub struct SessionSlot<E: MapEngine, S: ChoiceStore> {
    controller: RefCell<Option<DistrictsController<E, S>>>,
    pending: RefCell<EventBus<AppEvent>>,
}

impl<E: MapEngine, S: ChoiceStore> Default for SessionSlot<E, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: MapEngine, S: ChoiceStore> SessionSlot<E, S> {
    pub const fn new() -> Self {
        Self {
            controller: RefCell::new(None),
            pending: RefCell::new(EventBus::new()),
        }
    }

    /// Starts a session in place of any previous one. The slot counts as
    /// busy while `start` runs, so events the map raises during startup are
    /// queued and handled before this returns.
    pub fn open<F>(&self, start: F) -> Result<Vec<AppCommand>, SessionBusy>
    where
        F: FnOnce() -> (DistrictsController<E, S>, Vec<AppCommand>),
    {
        let mut slot = self.controller.try_borrow_mut().map_err(|_| SessionBusy)?;
        if let Some(mut previous) = slot.take() {
            previous.teardown();
        }
        *self.pending.borrow_mut() = EventBus::new();
        let (controller, mut commands) = start();
        let controller = slot.insert(controller);
        commands.extend(self.drain(controller));
        Ok(commands)
    }

    /// Runs `f` against the session; `None` when there is none or it is busy.
    pub fn with<R>(&self, f: impl FnOnce(&DistrictsController<E, S>) -> R) -> Option<R> {
        let slot = self.controller.try_borrow().ok()?;
        slot.as_ref().map(f)
    }

    /// Handles `event` and everything queued behind it.
    ///
    /// A call made while another dispatch is running only queues the event
    /// and returns nothing; its commands come out of the outer call.
    pub fn dispatch(&self, event: AppEvent) -> Vec<AppCommand> {
        self.pending.borrow_mut().post(event);
        let Ok(mut slot) = self.controller.try_borrow_mut() else {
            tracing::trace!(queued = self.pending.borrow().len(), "session busy, event queued");
            return Vec::new();
        };
        let Some(controller) = slot.as_mut() else {
            self.pending.borrow_mut().clear();
            return Vec::new();
        };

        self.drain(controller)
    }

    fn drain(&self, controller: &mut DistrictsController<E, S>) -> Vec<AppCommand> {
        let mut commands = Vec::new();
        loop {
            let next = self.pending.borrow_mut().pop();
            let Some(event) = next else {
                break;
            };
            commands.extend(controller.dispatch(event));
        }
        commands
    }

    /// Tears the session down and drops it. Returns `false` if there was none
    /// or it is busy.
    pub fn end(&self) -> bool {
        let Ok(mut slot) = self.controller.try_borrow_mut() else {
            tracing::warn!("session end requested while an event is handled, ignored");
            return false;
        };
        let Some(mut controller) = slot.take() else {
            return false;
        };
        controller.teardown();
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        tracing::info!(
            events = pending.processed(),
            metrics = ?controller.metrics().snapshot(),
            "districts session ended"
        );
        true
    }
}
