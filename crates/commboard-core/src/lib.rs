//! Communication Board Core Library
//!
//! Platform-agnostic model for the communication board editor: symbols and
//! their catalog, the board grid, library filtering, drag-and-drop, page
//! layout and the export pipeline.

pub mod board;
pub mod catalog;
pub mod config;
pub mod dnd;
pub mod editor;
pub mod export;
pub mod filter;
pub mod input;
pub mod layout;
pub mod symbol;

pub use board::{Board, BoardError, BoardResult, Slot};
pub use catalog::{AssetSource, BoxFuture, Catalog, CatalogError, CatalogResult, LoadOutcome};
pub use config::{BoardConfig, ConfigError, FontScaleRange, GridPreset};
pub use dnd::{DragPayload, DragSession, DropOutcome, DropTarget, PressTracker};
pub use editor::{Editor, LibraryStatus};
pub use export::{
    ExportBackend, ExportError, ExportPhase, ExportResult, ExportState, ExportSummary,
    ExportTarget, RasterImage, RasterOptions, run_export,
};
pub use filter::SymbolFilter;
pub use input::InputState;
pub use layout::{PageLayout, ViewTransform};
pub use symbol::Symbol;
