//! script-board: a browser board for laying out Python scripts and the
//! import relations between them.
//!
//! Scripts are analyzed by an external HTTP service; this crate owns the
//! board itself: placement, pan/zoom, connections and their rendering.

use log::{info, Level};

pub mod actions;
pub mod analyzer;
pub mod app;
pub mod board;
pub mod canvas;
pub mod components;
pub mod config;
pub mod connections;
pub mod error;
pub mod ingest;
pub mod interaction;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod state;
pub mod viewport;

pub use app::App;
pub use board::BoardState;
pub use error::{BoardError, Result};

/// Initialize logging and the panic hook for the WASM target.
pub fn init_logging() {
    let _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();
    info!("script-board: logging initialized");
}
