//! Court locator map: wires location, query, polygon layers and viewport
//! behind one event dispatcher, with a browser shell on wasm.

pub mod config;
pub mod console_log;
pub mod controller;
pub mod search;
pub mod session;
pub mod sidebar;

#[cfg(target_arch = "wasm32")]
mod web;

pub use config::*;
pub use controller::*;
pub use search::*;
pub use session::*;
pub use sidebar::*;
