pub mod polygons;
pub mod symbology;

pub use polygons::*;
pub use symbology::*;
