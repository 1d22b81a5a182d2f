//! Communication Board Application
//!
//! The application shell: windowing, the library and control panels, asset
//! loading, canvas input and PNG export.

mod app;
pub mod assets;
pub mod config;
mod event_handler;
pub mod export;
mod shortcuts;
mod ui;

pub use app::{App, AppError};
pub use config::AppConfig;
pub use event_handler::{EventHandler, PressResult};
pub use shortcuts::{Shortcut, ShortcutRegistry};
pub use ui::{ExportView, UiAction, UiOutput, UiState, render_ui};

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::run_wasm;
