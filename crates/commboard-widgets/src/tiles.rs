//! Symbol tiles for the library grid.

use egui::{
    Align2, Color32, CornerRadius, CursorIcon, Image, ImageSource, Rect, Response, Sense, Stroke,
    StrokeKind, Ui, Vec2, vec2,
};

use crate::{sizing, theme};

/// Default tile edge length.
pub const TILE_SIZE: f32 = 84.0;

/// Shorten `label` to at most `max_chars` characters, ending in an ellipsis.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let kept: String = label.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", kept.trim_end())
}

/// A library tile: the symbol picture above its name.
///
/// The returned response senses both clicks and drags so the caller can
/// open a popup on click and start a drag-and-drop on drag.
pub struct SymbolTile<'a> {
    name: &'a str,
    image: Option<ImageSource<'a>>,
    size: Vec2,
    highlighted: bool,
}

impl<'a> SymbolTile<'a> {
    /// Create a tile with no picture yet.
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            image: None,
            size: vec2(TILE_SIZE, TILE_SIZE),
            highlighted: false,
        }
    }

    /// Set the picture.
    pub fn image(mut self, image: ImageSource<'a>) -> Self {
        self.image = Some(image);
        self
    }

    /// Set the tile size.
    pub fn size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    /// Draw with the selection outline.
    pub fn highlighted(mut self, highlighted: bool) -> Self {
        self.highlighted = highlighted;
        self
    }

    /// Show the tile.
    pub fn show(self, ui: &mut Ui) -> Response {
        let (rect, response) = ui.allocate_exact_size(self.size, Sense::click_and_drag());

        if ui.is_rect_visible(rect) {
            let radius = CornerRadius::same(sizing::CORNER_RADIUS);
            let fill = if response.hovered() {
                theme::HOVER_BG
            } else {
                Color32::WHITE
            };
            let border = if self.highlighted || response.hovered() {
                theme::ACCENT
            } else {
                theme::BORDER
            };
            ui.painter().rect_filled(rect, radius, fill);
            ui.painter()
                .rect_stroke(rect, radius, Stroke::new(1.0, border), StrokeKind::Inside);

            let label_height = 18.0;
            let picture = Rect::from_min_max(
                rect.min + vec2(8.0, 6.0),
                rect.max - vec2(8.0, label_height + 2.0),
            );
            match self.image {
                Some(source) => {
                    Image::new(source)
                        .fit_to_exact_size(picture.size())
                        .maintain_aspect_ratio(true)
                        .paint_at(ui, picture);
                }
                None => {
                    ui.painter()
                        .rect_filled(picture, radius, Color32::from_gray(235));
                }
            }

            let max_chars = ((rect.width() - 8.0) / 6.0).max(4.0) as usize;
            ui.painter().text(
                egui::pos2(rect.center().x, rect.bottom() - label_height / 2.0 - 2.0),
                Align2::CENTER_CENTER,
                truncate_label(self.name, max_chars),
                egui::FontId::proportional(11.0),
                theme::TEXT,
            );
        }

        response
            .on_hover_text(self.name)
            .on_hover_cursor(CursorIcon::Grab)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_label() {
        assert_eq!(truncate_label("Bath", 10), "Bath");
    }

    #[test]
    fn test_truncate_long_label() {
        assert_eq!(truncate_label("Bedtime Song", 8), "Bedtime…");
        assert_eq!(truncate_label("Brush Teeth", 7), "Brush…");
    }
}
