//! A4 page geometry, grid cell placement and the page-to-screen transform.

use crate::board::Board;
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// A4 width at 96 DPI, in page pixels.
pub const PAGE_WIDTH: f64 = 794.0;
/// A4 height at 96 DPI, in page pixels.
pub const PAGE_HEIGHT: f64 = 1123.0;
/// Widest a cell may get.
pub const MAX_CELL_WIDTH: f64 = 110.0;
/// Label font size at scale 1.0.
pub const BASE_LABEL_SIZE: f64 = 12.0;
/// Share of the cell width the symbol image may use.
pub const IMAGE_WIDTH_RATIO: f64 = 0.75;
/// Share of the cell height the symbol image may use.
pub const IMAGE_HEIGHT_RATIO: f64 = 0.65;

/// Size of the A4 page.
pub const fn page_size() -> Size {
    Size::new(PAGE_WIDTH, PAGE_HEIGHT)
}

/// Width of a cell for the given column count.
pub fn cell_width(cols: usize) -> f64 {
    let dynamic = (100.0 / cols.max(1) as f64 * 6.0).floor();
    MAX_CELL_WIDTH.min(dynamic)
}

/// Height of a cell: 8/7 of its width.
pub fn cell_height(width: f64) -> f64 {
    (width * 8.0 / 7.0).floor()
}

/// Gap between cells, smaller once cells shrink.
pub fn cell_gap(width: f64) -> f64 {
    if width < MAX_CELL_WIDTH { 10.0 } else { 15.0 }
}

/// Label font size for a board font scale.
pub fn label_font_size(font_scale: f32) -> f64 {
    BASE_LABEL_SIZE * font_scale as f64
}

/// Where the image and the label go inside a cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellParts {
    /// Box the image is contain-fitted into.
    pub image: Rect,
    /// Strip below the image for the label.
    pub label: Rect,
}

/// Geometry of the grid on the page, in page pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub rows: usize,
    pub cols: usize,
    /// Size of one cell.
    pub cell: Size,
    /// Space between cells.
    pub gap: f64,
    /// Top-left corner of the grid.
    pub origin: Point,
}

impl PageLayout {
    /// Lay out a `rows x cols` grid centred on the page.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);
        let width = cell_width(cols);
        let cell = Size::new(width, cell_height(width));
        let gap = cell_gap(width);

        let grid = Size::new(
            cols as f64 * cell.width + (cols - 1) as f64 * gap,
            rows as f64 * cell.height + (rows - 1) as f64 * gap,
        );
        let origin = Point::new(
            ((PAGE_WIDTH - grid.width) / 2.0).max(0.0),
            ((PAGE_HEIGHT - grid.height) / 2.0).max(0.0),
        );

        Self {
            rows,
            cols,
            cell,
            gap,
            origin,
        }
    }

    /// Lay out the grid of a board.
    pub fn for_board(board: &Board) -> Self {
        Self::new(board.rows(), board.cols())
    }

    /// The whole page.
    pub fn page_rect(&self) -> Rect {
        Rect::from_origin_size(Point::ZERO, page_size())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Check if the layout has no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bounds of the whole grid.
    pub fn grid_rect(&self) -> Rect {
        let width = self.cols as f64 * self.cell.width + (self.cols - 1) as f64 * self.gap;
        let height = self.rows as f64 * self.cell.height + (self.rows - 1) as f64 * self.gap;
        Rect::from_origin_size(self.origin, Size::new(width, height))
    }

    /// Bounds of the cell at `index`.
    pub fn cell_rect(&self, index: usize) -> Option<Rect> {
        if index >= self.len() {
            return None;
        }
        let row = index / self.cols;
        let col = index % self.cols;
        let x = self.origin.x + col as f64 * (self.cell.width + self.gap);
        let y = self.origin.y + row as f64 * (self.cell.height + self.gap);
        Some(Rect::from_origin_size(Point::new(x, y), self.cell))
    }

    /// Every cell index with its bounds.
    pub fn cells(&self) -> impl Iterator<Item = (usize, Rect)> + '_ {
        (0..self.len()).filter_map(|i| self.cell_rect(i).map(|r| (i, r)))
    }

    /// Split a cell into its image box and label strip.
    pub fn cell_parts(&self, cell: Rect, font_scale: f32) -> CellParts {
        let image_size = Size::new(
            cell.width() * IMAGE_WIDTH_RATIO,
            cell.height() * IMAGE_HEIGHT_RATIO,
        );
        let padding = (cell.height() * 0.05).round();
        let image = Rect::from_origin_size(
            Point::new(
                cell.x0 + (cell.width() - image_size.width) / 2.0,
                cell.y0 + padding,
            ),
            image_size,
        );
        let label_height = (label_font_size(font_scale) * 1.4).min(cell.y1 - image.y1);
        let label = Rect::new(cell.x0 + 2.0, image.y1, cell.x1 - 2.0, image.y1 + label_height);
        CellParts { image, label }
    }

    /// The cell containing a page-space point. Gaps hit nothing.
    pub fn hit_test(&self, point: Point) -> Option<usize> {
        let local = point - self.origin;
        if local.x < 0.0 || local.y < 0.0 {
            return None;
        }
        let col = (local.x / (self.cell.width + self.gap)).floor() as usize;
        let row = (local.y / (self.cell.height + self.gap)).floor() as usize;
        if col >= self.cols || row >= self.rows {
            return None;
        }
        let index = row * self.cols + col;
        self.cell_rect(index)
            .filter(|rect| rect.contains(point))
            .map(|_| index)
    }
}

/// Maps the page onto a screen viewport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    /// Screen position of the page's top-left corner.
    pub offset: Vec2,
    /// Screen pixels per page pixel.
    pub scale: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl ViewTransform {
    /// Fit the page inside `viewport`, keeping `margin` free on every side,
    /// and centre it.
    pub fn fit(viewport: Rect, margin: f64) -> Self {
        let page = page_size();
        let available = Size::new(
            (viewport.width() - margin * 2.0).max(1.0),
            (viewport.height() - margin * 2.0).max(1.0),
        );
        let scale = (available.width / page.width).min(available.height / page.height);
        let center = viewport.center();
        Self {
            offset: Vec2::new(
                center.x - page.width * scale / 2.0,
                center.y - page.height * scale / 2.0,
            ),
            scale,
        }
    }

    /// Page to screen.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.scale)
    }

    /// Screen to page.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to page coordinates.
    pub fn screen_to_page(&self, point: Point) -> Point {
        self.inverse_transform() * point
    }

    /// Convert a page point to screen coordinates.
    pub fn page_to_screen(&self, point: Point) -> Point {
        self.transform() * point
    }

    /// The page's bounds on screen.
    pub fn page_on_screen(&self) -> Rect {
        self.transform().transform_rect_bbox(Rect::from_origin_size(Point::ZERO, page_size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_size_formula() {
        assert_eq!(cell_width(3), 110.0);
        assert_eq!(cell_width(2), 110.0);
        assert_eq!(cell_width(6), 100.0);
        assert_eq!(cell_width(7), 85.0);
        assert_eq!(cell_height(110.0), 125.0);
        assert_eq!(cell_height(100.0), 114.0);
        assert_eq!(cell_gap(110.0), 15.0);
        assert_eq!(cell_gap(100.0), 10.0);
    }

    #[test]
    fn test_grid_is_centred() {
        let layout = PageLayout::new(4, 3);
        let grid = layout.grid_rect();
        // 3 * 110 + 2 * 15 wide, 4 * 125 + 3 * 15 high
        assert_eq!(grid.width(), 360.0);
        assert_eq!(grid.height(), 545.0);
        assert!((grid.center().x - PAGE_WIDTH / 2.0).abs() < 1e-9);
        assert!((grid.center().y - PAGE_HEIGHT / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_cell_rects() {
        let layout = PageLayout::new(3, 2);
        let first = layout.cell_rect(0).unwrap();
        let second = layout.cell_rect(1).unwrap();
        let third = layout.cell_rect(2).unwrap();

        assert_eq!(first.size(), Size::new(110.0, 125.0));
        assert_eq!(second.x0 - first.x1, 15.0);
        assert_eq!(third.y0 - first.y1, 15.0);
        assert_eq!(third.x0, first.x0);
        assert!(layout.cell_rect(6).is_none());
        assert_eq!(layout.cells().count(), 6);
    }

    #[test]
    fn test_hit_test() {
        let layout = PageLayout::new(4, 3);
        for (index, rect) in layout.cells() {
            assert_eq!(layout.hit_test(rect.center()), Some(index));
        }

        // gap between the first two cells
        let first = layout.cell_rect(0).unwrap();
        let gap_point = Point::new(first.x1 + layout.gap / 2.0, first.center().y);
        assert_eq!(layout.hit_test(gap_point), None);

        assert_eq!(layout.hit_test(Point::ZERO), None);
        assert_eq!(layout.hit_test(Point::new(PAGE_WIDTH - 1.0, PAGE_HEIGHT - 1.0)), None);
    }

    #[test]
    fn test_cell_parts() {
        let layout = PageLayout::new(4, 3);
        let cell = layout.cell_rect(0).unwrap();
        let parts = layout.cell_parts(cell, 1.0);

        assert!((parts.image.width() - 82.5).abs() < 1e-9);
        assert!((parts.image.height() - 81.25).abs() < 1e-9);
        assert!((parts.image.center().x - cell.center().x).abs() < 1e-9);
        assert_eq!(parts.label.y0, parts.image.y1);
        assert!(parts.label.y1 <= cell.y1);
    }

    #[test]
    fn test_label_font_size() {
        assert_eq!(label_font_size(1.0), 12.0);
        assert!((label_font_size(1.5) - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_transform_fit() {
        let viewport = Rect::new(0.0, 0.0, 1000.0, 1163.0);
        let view = ViewTransform::fit(viewport, 20.0);

        assert!((view.scale - 1.0).abs() < 1e-9);
        let page = view.page_on_screen();
        assert!((page.center().x - 500.0).abs() < 1e-9);
        assert!((page.y0 - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_transform_roundtrip() {
        let view = ViewTransform::fit(Rect::new(300.0, 0.0, 1200.0, 800.0), 24.0);
        let original = Point::new(123.0, 456.0);
        let back = view.screen_to_page(view.page_to_screen(original));
        assert!((back.x - original.x).abs() < 1e-9);
        assert!((back.y - original.y).abs() < 1e-9);
    }
}
