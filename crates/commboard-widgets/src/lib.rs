//! Reusable egui components for the communication board editor.
//!
//! - **Buttons**: toggle buttons, tag chips, action buttons
//! - **Tiles**: symbol tiles for the library grid
//! - **Panel**: panel and popup frames
//! - **Layout**: section labels, separators, shortcut rows

pub mod buttons;
pub mod layout;
pub mod panel;
pub mod tiles;

pub use buttons::{ActionButton, ActionKind, TagChip, ToggleButton};
pub use layout::{panel_title, section_label, separator, shortcut_row, status_text};
pub use panel::{panel_frame, popup_frame};
pub use tiles::{SymbolTile, TILE_SIZE, truncate_label};

/// Standard sizing constants used across widgets.
pub mod sizing {
    /// Standard corner radius
    pub const CORNER_RADIUS: u8 = 4;
    /// Panel corner radius
    pub const PANEL_RADIUS: u8 = 8;
    /// Width of the side panels
    pub const SIDE_PANEL_WIDTH: f32 = 300.0;
}

/// Standard colors used across widgets.
pub mod theme {
    use egui::Color32;

    /// Text color (dark gray)
    pub const TEXT: Color32 = Color32::from_rgb(60, 60, 60);
    /// Muted text color
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(120, 120, 120);
    /// Border color
    pub const BORDER: Color32 = Color32::from_rgb(220, 220, 220);
    /// Selection/active color (blue)
    pub const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);
    /// Pressed/hovered accent
    pub const ACCENT_DARK: Color32 = Color32::from_rgb(37, 99, 235);
    /// Errors and warnings
    pub const ERROR: Color32 = Color32::from_rgb(220, 38, 38);
    /// Hover background
    pub const HOVER_BG: Color32 = Color32::from_rgb(245, 245, 245);
    /// Selected background
    pub const SELECTED_BG: Color32 = Color32::from_rgb(235, 245, 255);
    /// Panel background
    pub const PANEL_BG: Color32 = Color32::from_rgba_premultiplied(250, 250, 252, 250);
}
