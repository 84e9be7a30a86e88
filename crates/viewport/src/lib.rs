pub mod state;
pub mod sync;

pub use state::*;
pub use sync::*;
