//! Button components: toggle buttons, tag chips and action buttons.

use egui::{Align2, Color32, CornerRadius, CursorIcon, Sense, Stroke, StrokeKind, Ui, vec2};

use crate::{sizing, theme};

/// A toggle button with text label.
/// Uses solid blue background when selected.
pub struct ToggleButton<'a> {
    label: &'a str,
    selected: bool,
    tooltip: Option<&'a str>,
    min_width: Option<f32>,
    height: f32,
    font_size: f32,
}

impl<'a> ToggleButton<'a> {
    /// Create a new toggle button.
    pub fn new(label: &'a str, selected: bool) -> Self {
        Self {
            label,
            selected,
            tooltip: None,
            min_width: None,
            height: 24.0,
            font_size: 11.0,
        }
    }

    /// Set minimum width.
    pub fn min_width(mut self, width: f32) -> Self {
        self.min_width = Some(width);
        self
    }

    /// Set the button height.
    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Set the font size.
    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    /// Text shown on hover.
    pub fn tooltip(mut self, tooltip: &'a str) -> Self {
        self.tooltip = Some(tooltip);
        self
    }

    /// Show the button and return true if clicked.
    pub fn show(self, ui: &mut Ui) -> bool {
        let font_id = egui::FontId::proportional(self.font_size);
        let galley = ui.painter().layout_no_wrap(
            self.label.to_string(),
            font_id.clone(),
            Color32::PLACEHOLDER,
        );
        let text_width = galley.size().x;
        let width = self.min_width.unwrap_or(0.0).max(text_width + 16.0);
        let size = vec2(width, self.height);

        let (rect, response) = ui.allocate_exact_size(size, Sense::click());

        if ui.is_rect_visible(rect) {
            let bg_color = if self.selected {
                theme::ACCENT
            } else if response.hovered() {
                Color32::from_gray(235)
            } else {
                Color32::from_gray(245)
            };

            let text_color = if self.selected {
                Color32::WHITE
            } else {
                Color32::from_gray(80)
            };

            ui.painter()
                .rect_filled(rect, CornerRadius::same(sizing::CORNER_RADIUS), bg_color);
            ui.painter().text(
                rect.center(),
                Align2::CENTER_CENTER,
                self.label,
                font_id,
                text_color,
            );
        }

        let clicked = response.clicked();
        let response = match self.tooltip {
            Some(tooltip) => response.on_hover_text(tooltip),
            None => response,
        };
        response.on_hover_cursor(CursorIcon::PointingHand);
        clicked
    }
}

/// A rounded tag filter chip.
pub struct TagChip<'a> {
    tag: &'a str,
    selected: bool,
    description: Option<&'a str>,
}

impl<'a> TagChip<'a> {
    /// Create a chip for a tag.
    pub fn new(tag: &'a str, selected: bool) -> Self {
        Self {
            tag,
            selected,
            description: None,
        }
    }

    /// What the tag means, shown on hover.
    pub fn description(mut self, description: &'a str) -> Self {
        self.description = Some(description);
        self
    }

    /// Show the chip and return true if clicked.
    pub fn show(self, ui: &mut Ui) -> bool {
        let font_id = egui::FontId::proportional(11.0);
        let galley = ui.painter().layout_no_wrap(
            self.tag.to_string(),
            font_id.clone(),
            Color32::PLACEHOLDER,
        );
        let size = vec2(galley.size().x + 18.0, 22.0);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());

        if ui.is_rect_visible(rect) {
            let radius = CornerRadius::same((size.y / 2.0) as u8);
            let (fill, stroke, text) = if self.selected {
                (theme::SELECTED_BG, theme::ACCENT, theme::ACCENT)
            } else if response.hovered() {
                (theme::HOVER_BG, theme::BORDER, theme::TEXT)
            } else {
                (Color32::WHITE, theme::BORDER, theme::TEXT_MUTED)
            };
            ui.painter().rect_filled(rect, radius, fill);
            ui.painter()
                .rect_stroke(rect, radius, Stroke::new(1.0, stroke), StrokeKind::Inside);
            ui.painter()
                .text(rect.center(), Align2::CENTER_CENTER, self.tag, font_id, text);
        }

        let clicked = response.clicked();
        let response = match self.description {
            Some(description) => response.on_hover_text(description),
            None => response,
        };
        response.on_hover_cursor(CursorIcon::PointingHand);
        clicked
    }
}

/// Visual weight of an [`ActionButton`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Solid accent fill.
    Primary,
    /// Outlined.
    Secondary,
}

/// A labelled command button that can be disabled.
pub struct ActionButton<'a> {
    label: &'a str,
    kind: ActionKind,
    enabled: bool,
    shortcut: Option<&'a str>,
}

impl<'a> ActionButton<'a> {
    /// A primary (filled) button.
    pub fn primary(label: &'a str) -> Self {
        Self {
            label,
            kind: ActionKind::Primary,
            enabled: true,
            shortcut: None,
        }
    }

    /// A secondary (outlined) button.
    pub fn secondary(label: &'a str) -> Self {
        Self {
            kind: ActionKind::Secondary,
            ..Self::primary(label)
        }
    }

    /// Enable or disable the button.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Keyboard shortcut shown in the hover tooltip.
    pub fn shortcut(mut self, shortcut: &'a str) -> Self {
        self.shortcut = Some(shortcut);
        self
    }

    /// Show the button and return true if clicked while enabled.
    pub fn show(self, ui: &mut Ui) -> bool {
        let font_id = egui::FontId::proportional(13.0);
        let galley = ui.painter().layout_no_wrap(
            self.label.to_string(),
            font_id.clone(),
            Color32::PLACEHOLDER,
        );
        let size = vec2((galley.size().x + 28.0).max(ui.available_width().min(180.0)), 32.0);
        let sense = if self.enabled { Sense::click() } else { Sense::hover() };
        let (rect, response) = ui.allocate_exact_size(size, sense);

        if ui.is_rect_visible(rect) {
            let radius = CornerRadius::same(sizing::CORNER_RADIUS);
            let hovered = self.enabled && response.hovered();
            let (fill, text) = match (self.kind, self.enabled) {
                (_, false) => (Color32::from_gray(225), Color32::from_gray(150)),
                (ActionKind::Primary, true) if hovered => (theme::ACCENT_DARK, Color32::WHITE),
                (ActionKind::Primary, true) => (theme::ACCENT, Color32::WHITE),
                (ActionKind::Secondary, true) if hovered => (theme::HOVER_BG, theme::TEXT),
                (ActionKind::Secondary, true) => (Color32::WHITE, theme::TEXT),
            };
            ui.painter().rect_filled(rect, radius, fill);
            if self.kind == ActionKind::Secondary {
                ui.painter().rect_stroke(
                    rect,
                    radius,
                    Stroke::new(1.0, theme::BORDER),
                    StrokeKind::Inside,
                );
            }
            ui.painter()
                .text(rect.center(), Align2::CENTER_CENTER, self.label, font_id, text);
        }

        let clicked = self.enabled && response.clicked();
        if let Some(shortcut) = self.shortcut {
            let response = response.on_hover_text(format!("{} ({})", self.label, shortcut));
            if self.enabled {
                response.on_hover_cursor(CursorIcon::PointingHand);
            }
        } else if self.enabled {
            response.on_hover_cursor(CursorIcon::PointingHand);
        }
        clicked
    }
}
