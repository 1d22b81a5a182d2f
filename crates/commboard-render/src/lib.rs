//! Communication Board Render Library
//!
//! Renderer abstraction and image decoding for the board page.
//! The default implementation uses Vello for GPU-accelerated rendering.

pub mod images;
mod renderer;

#[cfg(feature = "vello-renderer")]
mod vello_impl;

pub use images::{ImageCache, ImageEntry, decode_image};
pub use renderer::{PAGE_MARGIN, Palette, RenderContext, RenderResult, Renderer, RendererError};

#[cfg(feature = "vello-renderer")]
pub use vello_impl::BoardRenderer;
