//! Browser glue for the Cayley graph model builder: loads a model and the shared
//! class prelude into the page, drives the SageMathCell widget and turns its
//! OpenSCAD output into an STL download via the server.

#![allow(async_fn_in_trait)]

pub mod cell;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod loader;
pub mod page;
pub mod transport;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(test)]
mod test_support;

pub use cell::{CellFactory, CellSlot};
pub use config::{CellOptions, SiteConfig, Variant};
pub use controller::{Controller, RefreshOutcome};
pub use error::{GlueError, Result};
pub use export::{Download, ExportOutcome, ExportState, ExportStrategy};
pub use loader::LoadedModel;
pub use page::Page;
pub use transport::Transport;

#[cfg(target_arch = "wasm32")]
pub use web::ModelPage;

// ── Web entry‑point ──
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    // Redirect `log` macros & panic messages to the browser console
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}
