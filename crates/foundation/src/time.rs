use serde::{Deserialize, Serialize};

/// Host-supplied timestamp in milliseconds.
///
/// Nothing in the core reads a wall clock; every timed operation takes the
/// current time as an argument so runs can be replayed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millis(pub u64);

impl Millis {
    pub fn saturating_add(self, ms: u64) -> Millis {
        Millis(self.0.saturating_add(ms))
    }

    pub fn since(self, earlier: Millis) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}
