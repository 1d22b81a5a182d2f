//! Vello-based board renderer.

use crate::images::ImageCache;
use crate::renderer::{Palette, RenderContext, Renderer};
use commboard_core::board::Board;
use commboard_core::dnd::DragSession;
use commboard_core::layout::{CellParts, PageLayout, label_font_size, page_size};
use commboard_core::symbol::Symbol;
use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape as KurboShape, Size, Stroke};
use parley::layout::PositionedLayoutItem;
use parley::{FontContext, LayoutContext};
use peniko::{Brush, Color, Fill};
use vello::Scene;

/// Corner radius of a cell outline.
const CELL_RADIUS: f64 = 4.0;
/// Labels never shrink below this size.
const MIN_LABEL_SIZE: f32 = 6.0;
/// Font family used for labels.
const LABEL_FONT: &str = "sans-serif";

/// Font size that makes a label of `measured` width fit into `available`.
fn fitted_font_size(font_size: f32, measured: f32, available: f32) -> f32 {
    if measured <= available || measured <= 0.0 {
        return font_size;
    }
    (font_size * available / measured).max(MIN_LABEL_SIZE)
}

/// Scale and offset that contain-fit an image of `image` size into `bounds`.
fn contain_fit(image: Size, bounds: Rect) -> Affine {
    if image.width <= 0.0 || image.height <= 0.0 {
        return Affine::translate((bounds.x0, bounds.y0));
    }
    let scale = (bounds.width() / image.width).min(bounds.height() / image.height);
    let x = bounds.x0 + (bounds.width() - image.width * scale) / 2.0;
    let y = bounds.y0 + (bounds.height() - image.height * scale) / 2.0;
    Affine::translate((x, y)) * Affine::scale(scale)
}

/// Draws the A4 page, the grid and the symbols into a Vello scene.
pub struct BoardRenderer {
    /// The Vello scene being built.
    scene: Scene,
    /// Font context for labels.
    font_cx: FontContext,
    /// Layout context for labels.
    layout_cx: LayoutContext<Brush>,
}

impl Default for BoardRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardRenderer {
    /// Create a new board renderer using system fonts.
    pub fn new() -> Self {
        Self {
            scene: Scene::new(),
            font_cx: FontContext::new(),
            layout_cx: LayoutContext::new(),
        }
    }

    /// Get the built scene for rendering.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Take ownership of the scene (resets internal scene).
    pub fn take_scene(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    /// Build a scene of just the page for export: white background, no
    /// drag feedback, everything scaled by `scale`.
    ///
    /// Returns the scene and its size in output pixels.
    pub fn build_export_scene(
        &mut self,
        board: &Board,
        layout: &PageLayout,
        images: &ImageCache,
        scale: f64,
    ) -> (Scene, Size) {
        self.scene.reset();

        let page = page_size();
        let size = Size::new((page.width * scale).round(), (page.height * scale).round());
        let transform = Affine::scale(scale);

        self.scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            Color::WHITE,
            None,
            &Rect::from_origin_size(Point::ZERO, size),
        );

        let palette = Palette::default();
        for (index, cell) in layout.cells() {
            let symbol = board.slot(index).cloned();
            self.render_cell(cell, symbol.as_deref(), false, None, &palette, transform);
            if let Some(symbol) = symbol {
                let parts = layout.cell_parts(cell, board.font_scale());
                self.render_symbol(&symbol, parts, board.font_scale(), images, &palette, transform);
            }
        }

        log::debug!(
            "Built export scene {}x{} for {} symbols",
            size.width,
            size.height,
            board.occupied_count()
        );
        (std::mem::take(&mut self.scene), size)
    }

    /// Draw the page sheet with a soft drop shadow.
    fn render_page(&mut self, layout: &PageLayout, palette: &Palette, transform: Affine) {
        let page = layout.page_rect();
        for (offset, alpha) in [(6.0, 12), (3.0, 20), (1.0, 30)] {
            self.scene.fill(
                Fill::NonZero,
                transform,
                Color::from_rgba8(0, 0, 0, alpha),
                None,
                &(page + kurbo::Vec2::new(0.0, offset)),
            );
        }
        self.scene
            .fill(Fill::NonZero, transform, palette.page, None, &page);
    }

    /// Draw one cell: drop highlight, then the outline (dashed while empty).
    fn render_cell(
        &mut self,
        cell: Rect,
        symbol: Option<&Symbol>,
        dragging: bool,
        highlight: Option<Color>,
        palette: &Palette,
        transform: Affine,
    ) {
        let shape = RoundedRect::from_rect(cell, CELL_RADIUS);
        if let Some(color) = highlight {
            self.scene.fill(Fill::NonZero, transform, color, None, &shape);
        }

        let stroke = if symbol.is_none() && !dragging {
            Stroke::new(1.0).with_dashes(0.0, &[4.0, 4.0])
        } else {
            Stroke::new(1.0)
        };
        self.scene
            .stroke(&stroke, transform, palette.cell_border, None, &shape);
    }

    /// Draw a symbol's image and label into the parts of a cell.
    fn render_symbol(
        &mut self,
        symbol: &Symbol,
        parts: CellParts,
        font_scale: f32,
        images: &ImageCache,
        palette: &Palette,
        transform: Affine,
    ) {
        match images.get(&symbol.image_path) {
            Some(data) => self.render_image(data, parts.image, transform),
            None => self.render_image_placeholder(parts.image, transform),
        }
        self.render_label(
            &symbol.name,
            parts.label,
            label_font_size(font_scale) as f32,
            palette.label,
            transform,
        );
    }

    /// Contain-fit an image into `bounds`.
    fn render_image(&mut self, data: &peniko::ImageData, bounds: Rect, transform: Affine) {
        let size = Size::new(data.width as f64, data.height as f64);
        let image_transform = transform * contain_fit(size, bounds);
        self.scene.draw_image(&peniko::ImageBrush::from(data.clone()), image_transform);
    }

    /// Render a placeholder for images that couldn't be loaded.
    fn render_image_placeholder(&mut self, bounds: Rect, transform: Affine) {
        let rect_path = bounds.to_path(0.1);
        self.scene.fill(
            Fill::NonZero,
            transform,
            Color::from_rgba8(230, 230, 230, 255),
            None,
            &rect_path,
        );

        let stroke = Stroke::new(1.0);
        let mut x_path = BezPath::new();
        x_path.move_to(Point::new(bounds.x0, bounds.y0));
        x_path.line_to(Point::new(bounds.x1, bounds.y1));
        x_path.move_to(Point::new(bounds.x1, bounds.y0));
        x_path.line_to(Point::new(bounds.x0, bounds.y1));
        self.scene.stroke(
            &stroke,
            transform,
            Color::from_rgba8(170, 170, 170, 255),
            None,
            &x_path,
        );
        self.scene.stroke(
            &stroke,
            transform,
            Color::from_rgba8(150, 150, 150, 255),
            None,
            &rect_path,
        );
    }

    /// Lay out a label with Parley.
    fn layout_label(&mut self, text: &str, font_size: f32, brush: &Brush) -> parley::Layout<Brush> {
        use parley::StyleProperty;

        let mut builder = self
            .layout_cx
            .ranged_builder(&mut self.font_cx, text, 1.0, false);
        builder.push_default(StyleProperty::FontSize(font_size));
        builder.push_default(StyleProperty::Brush(brush.clone()));
        builder.push_default(StyleProperty::FontStack(parley::FontStack::Source(
            LABEL_FONT.into(),
        )));
        let mut layout = builder.build(text);
        layout.break_all_lines(None);
        layout.align(None, parley::Alignment::Start, parley::AlignmentOptions::default());
        layout
    }

    /// Draw a single-line label centred in `rect`, shrinking it to fit.
    fn render_label(&mut self, text: &str, rect: Rect, font_size: f32, color: Color, transform: Affine) {
        if text.is_empty() || rect.width() <= 0.0 {
            return;
        }
        let brush = Brush::Solid(color);

        let mut layout = self.layout_label(text, font_size, &brush);
        let fitted = fitted_font_size(font_size, layout.width(), rect.width() as f32);
        if fitted < font_size {
            layout = self.layout_label(text, fitted, &brush);
        }

        let x = rect.x0 + (rect.width() - layout.width() as f64).max(0.0) / 2.0;
        let y = rect.y0 + (rect.height() - layout.height() as f64).max(0.0) / 2.0;
        let text_transform = transform * Affine::translate((x, y));

        for line in layout.lines() {
            for item in line.items() {
                let PositionedLayoutItem::GlyphRun(glyph_run) = item else {
                    continue;
                };
                let mut x = glyph_run.offset();
                let y = glyph_run.baseline();
                let run = glyph_run.run();
                let font = run.font();
                let synthesis = run.synthesis();
                let glyph_xform = synthesis
                    .skew()
                    .map(|angle| Affine::skew(angle.to_radians().tan() as f64, 0.0));

                let glyphs: Vec<vello::Glyph> = glyph_run
                    .glyphs()
                    .map(|glyph| {
                        let gx = x + glyph.x;
                        let gy = y - glyph.y;
                        x += glyph.advance;
                        vello::Glyph {
                            id: glyph.id,
                            x: gx,
                            y: gy,
                        }
                    })
                    .collect();

                if !glyphs.is_empty() {
                    self.scene
                        .draw_glyphs(font)
                        .brush(&brush)
                        .hint(true)
                        .transform(text_transform)
                        .glyph_transform(glyph_xform)
                        .font_size(run.font_size())
                        .normalized_coords(run.normalized_coords())
                        .draw(Fill::NonZero, glyphs.into_iter());
                }
            }
        }
    }

    /// Draw the dragged symbol as a card following the pointer.
    fn render_drag_preview(&mut self, ctx: &RenderContext, drag: &DragSession) {
        let (Some(payload), Some(pointer)) = (drag.payload(), drag.pointer()) else {
            return;
        };
        let center = ctx.view.screen_to_page(pointer);
        let card = Rect::from_center_size(center, ctx.layout.cell);
        let transform = ctx.view.transform();

        self.scene.fill(
            Fill::NonZero,
            transform,
            Color::from_rgba8(0, 0, 0, 40),
            None,
            &RoundedRect::from_rect(card + kurbo::Vec2::new(2.0, 3.0), CELL_RADIUS),
        );
        let shape = RoundedRect::from_rect(card, CELL_RADIUS);
        self.scene
            .fill(Fill::NonZero, transform, Color::from_rgba8(255, 255, 255, 235), None, &shape);
        self.scene.stroke(
            &Stroke::new(1.0),
            transform,
            ctx.palette.cell_border,
            None,
            &shape,
        );

        let parts = ctx.layout.cell_parts(card, ctx.board.font_scale());
        let symbol = payload.symbol().clone();
        self.render_symbol(
            &symbol,
            parts,
            ctx.board.font_scale(),
            ctx.images,
            &ctx.palette,
            transform,
        );
    }
}

impl Renderer for BoardRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.scene.reset();

        let viewport = Rect::from_origin_size(Point::ZERO, ctx.viewport_size);
        self.scene.fill(
            Fill::NonZero,
            Affine::IDENTITY,
            ctx.palette.background,
            None,
            &viewport,
        );

        let transform = ctx.view.transform();
        self.render_page(&ctx.layout, &ctx.palette, transform);

        let dragging = ctx.drag.is_dragging();
        let hover = ctx.drag.hover();
        let origin = ctx.drag.payload().and_then(|p| p.origin());
        let font_scale = ctx.board.font_scale();

        for (index, cell) in ctx.layout.cells() {
            let highlight = if hover == Some(index) {
                Some(ctx.palette.drop_hover)
            } else if dragging {
                Some(ctx.palette.drop_target)
            } else {
                None
            };
            let symbol = ctx.board.slot(index).cloned();
            self.render_cell(
                cell,
                symbol.as_deref(),
                dragging,
                highlight,
                &ctx.palette,
                transform,
            );
            if let Some(symbol) = symbol {
                let parts = ctx.layout.cell_parts(cell, font_scale);
                self.render_symbol(&symbol, parts, font_scale, ctx.images, &ctx.palette, transform);
                if origin == Some(index) {
                    self.scene.fill(
                        Fill::NonZero,
                        transform,
                        Color::from_rgba8(255, 255, 255, 128),
                        None,
                        &RoundedRect::from_rect(cell, CELL_RADIUS),
                    );
                }
            }
        }

        if dragging {
            self.render_drag_preview(ctx, ctx.drag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commboard_core::dnd::DragPayload;
    use std::sync::Arc;

    fn board_with_symbols() -> Board {
        let mut board = Board::new(2, 2);
        board
            .place_at(Arc::new(Symbol::from_file_name("bath.png")), 0)
            .unwrap();
        board
            .place_at(Arc::new(Symbol::from_file_name("toilet.png")), 3)
            .unwrap();
        board
    }

    #[test]
    fn test_renderer_creation() {
        let renderer = BoardRenderer::new();
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_empty_board() {
        let mut renderer = BoardRenderer::new();
        let board = Board::default();
        let drag = DragSession::default();
        let images = ImageCache::new();
        let ctx = RenderContext::new(&board, &drag, &images, Size::new(800.0, 600.0));

        renderer.build_scene(&ctx);
        assert!(!renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_build_scene_while_dragging() {
        let mut renderer = BoardRenderer::new();
        let board = board_with_symbols();
        let mut drag = DragSession::default();
        drag.begin(
            DragPayload::Placed {
                symbol: board.slot(0).cloned().unwrap(),
                origin: 0,
            },
            Point::new(300.0, 200.0),
        );
        drag.drag_over(Some(1));
        let mut images = ImageCache::new();
        images.mark_failed("/assets/bath.png");
        let ctx = RenderContext::new(&board, &drag, &images, Size::new(800.0, 600.0));

        renderer.build_scene(&ctx);
        let scene = renderer.take_scene();
        assert!(!scene.encoding().is_empty());
        assert!(renderer.scene().encoding().is_empty());
    }

    #[test]
    fn test_export_scene_size() {
        let mut renderer = BoardRenderer::new();
        let board = board_with_symbols();
        let layout = PageLayout::for_board(&board);

        let (scene, size) = renderer.build_export_scene(&board, &layout, &ImageCache::new(), 4.0);
        assert_eq!(size, Size::new(3176.0, 4492.0));
        assert!(!scene.encoding().is_empty());
    }

    #[test]
    fn test_fitted_font_size() {
        assert_eq!(fitted_font_size(12.0, 40.0, 80.0), 12.0);
        assert_eq!(fitted_font_size(12.0, 160.0, 80.0), 6.0);
        assert!((fitted_font_size(12.0, 100.0, 80.0) - 9.6).abs() < 1e-4);
        assert_eq!(fitted_font_size(12.0, 1000.0, 80.0), MIN_LABEL_SIZE);
    }

    #[test]
    fn test_contain_fit_centres_image() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        let fit = contain_fit(Size::new(20.0, 20.0), bounds);
        let top_left = fit * Point::ZERO;
        let bottom_right = fit * Point::new(20.0, 20.0);
        assert_eq!(top_left, Point::new(25.0, 0.0));
        assert_eq!(bottom_right, Point::new(75.0, 50.0));
    }
}
