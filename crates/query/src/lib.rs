pub mod params;
pub mod tracker;

pub use params::*;
pub use tracker::*;
