pub mod geojson;
pub mod records;
pub mod wkt;

pub use geojson::*;
pub use records::*;
pub use wkt::*;
