//! Renderer trait abstraction.

use crate::images::ImageCache;
use commboard_core::board::Board;
use commboard_core::dnd::DragSession;
use commboard_core::layout::{PageLayout, ViewTransform};
use kurbo::{Point, Rect, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RendererError {
    #[error("Initialization failed: {0}")]
    InitFailed(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Image decode failed: {0}")]
    Decode(String),
    #[error("Surface error: {0}")]
    Surface(String),
}

/// Space kept free around the page, in physical pixels.
pub const PAGE_MARGIN: f64 = 24.0;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Page colours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    /// Behind the page.
    pub background: Color,
    /// The page itself.
    pub page: Color,
    /// Cell outline.
    pub cell_border: Color,
    /// Every cell while a drag is in progress.
    pub drop_target: Color,
    /// The cell under the pointer while dragging.
    pub drop_hover: Color,
    /// Label text.
    pub label: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Color::from_rgba8(240, 242, 245, 255),
            page: Color::WHITE,
            cell_border: Color::from_rgba8(204, 204, 204, 255),
            drop_target: Color::from_rgba8(211, 211, 211, 255), // lightgrey
            drop_hover: Color::from_rgba8(173, 216, 230, 255),  // lightblue
            label: Color::from_rgba8(51, 51, 51, 255),
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The board to draw.
    pub board: &'a Board,
    /// Active drag, for highlights and the preview.
    pub drag: &'a DragSession,
    /// Decoded symbol images.
    pub images: &'a ImageCache,
    /// Grid geometry.
    pub layout: PageLayout,
    /// Where the page sits on screen.
    pub view: ViewTransform,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Colours.
    pub palette: Palette,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context with the page fitted into the viewport.
    pub fn new(
        board: &'a Board,
        drag: &'a DragSession,
        images: &'a ImageCache,
        viewport_size: Size,
    ) -> Self {
        Self {
            board,
            drag,
            images,
            layout: PageLayout::for_board(board),
            view: ViewTransform::fit(Rect::from_origin_size(Point::ZERO, viewport_size), PAGE_MARGIN),
            viewport_size,
            scale_factor: 1.0,
            palette: Palette::default(),
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the page placement.
    pub fn with_view(mut self, view: ViewTransform) -> Self {
        self.view = view;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.palette.background = color;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Build the scene for a frame.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.palette.background
    }
}
