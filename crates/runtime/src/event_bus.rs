use std::collections::VecDeque;

/// FIFO queue of discrete events, drained one at a time.
///
/// Every host callback (geolocation, network, timers, map gestures) becomes an
/// event; the owner pops and handles each to completion before the next one.
/// Handlers may post follow-up events, which run after everything already
/// queued.
#[derive(Debug)]
pub struct EventBus<E> {
    queue: VecDeque<E>,
    processed: u64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub const fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            processed: 0,
        }
    }

    pub fn post(&mut self, event: E) {
        self.queue.push_back(event);
    }

    pub fn pop(&mut self) -> Option<E> {
        let event = self.queue.pop_front()?;
        self.processed += 1;
        Some(event)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total events handed out by [`EventBus::pop`].
    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn pops_in_post_order() {
        let mut bus = EventBus::new();
        bus.post("a");
        bus.post("b");
        assert_eq!(bus.pop(), Some("a"));
        bus.post("c");
        assert_eq!(bus.pop(), Some("b"));
        assert_eq!(bus.pop(), Some("c"));
        assert_eq!(bus.pop(), None);
        assert_eq!(bus.processed(), 3);
    }

    #[test]
    fn clear_drops_pending_events() {
        let mut bus = EventBus::new();
        bus.post(1);
        bus.post(2);
        bus.clear();
        assert!(bus.is_empty());
        assert_eq!(bus.processed(), 0);
    }
}
