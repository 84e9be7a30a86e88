use foundation::time::Millis;
use serde::{Deserialize, Serialize};

/// Identifies one scheduled emission. A host timer that fires with an
/// outdated ticket emits nothing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceTicket {
    pub generation: u64,
    pub due_at: Millis,
}

#[derive(Debug, Clone)]
struct Pending<T> {
    value: T,
    ticket: DebounceTicket,
}

/// Trailing-edge debouncer driven by host-supplied time.
///
/// Emits the last pushed value once no new value arrived for `delay_ms`.
/// Every push replaces the pending value and reschedules the deadline.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay_ms: u64,
    generation: u64,
    pending: Option<Pending<T>>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            generation: 0,
            pending: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn push(&mut self, value: T, now: Millis) -> DebounceTicket {
        self.generation = self.generation.wrapping_add(1);
        let ticket = DebounceTicket {
            generation: self.generation,
            due_at: now.saturating_add(self.delay_ms),
        };
        self.pending = Some(Pending { value, ticket });
        ticket
    }

    /// Emits the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Millis) -> Option<T> {
        let due = self.pending.as_ref()?.ticket.due_at;
        if now < due {
            return None;
        }
        self.pending.take().map(|p| p.value)
    }

    /// Timer callback for `ticket`: emits only if the ticket is still current
    /// and due.
    pub fn fire(&mut self, ticket: DebounceTicket, now: Millis) -> Option<T> {
        let current = self.pending.as_ref()?.ticket;
        if current.generation != ticket.generation {
            return None;
        }
        self.poll(now)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.pending.as_ref().map(|p| p.ticket.due_at)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            tracing::trace!("debounce: pending emission cancelled");
        }
    }
}
