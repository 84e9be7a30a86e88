use foundation::time::Millis;
use runtime::debounce::{DebounceTicket, Debouncer};

/// The search box: `raw` follows every keystroke, `stable` only changes once
/// typing has paused for the debounce delay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub raw: String,
    pub stable: String,
}

#[derive(Debug, Clone)]
pub struct SearchBox {
    query: SearchQuery,
    debouncer: Debouncer<String>,
}

impl SearchBox {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            query: SearchQuery::default(),
            debouncer: Debouncer::new(delay_ms),
        }
    }

    pub fn query(&self) -> &SearchQuery {
        &self.query
    }

    pub fn input(&mut self, text: String, now: Millis) -> DebounceTicket {
        self.query.raw.clone_from(&text);
        self.debouncer.push(text, now)
    }

    /// Host timer for `ticket` went off.
    pub fn fire(&mut self, ticket: DebounceTicket, now: Millis) -> Option<String> {
        let settled = self.debouncer.fire(ticket, now)?;
        self.query.stable.clone_from(&settled);
        Some(settled)
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }
}
