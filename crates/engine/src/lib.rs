pub mod map;
pub mod recording;

pub use map::*;
pub use recording::*;
