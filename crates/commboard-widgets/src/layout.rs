//! Layout helpers: separators, section labels, shortcut rows.

use egui::{Color32, Stroke, Ui};

use crate::theme;

/// Draw a horizontal separator line.
pub fn separator(ui: &mut Ui) {
    let rect = ui.available_rect_before_wrap();
    let y = rect.top() + 4.0;
    ui.painter().line_segment(
        [
            egui::Pos2::new(rect.left(), y),
            egui::Pos2::new(rect.right(), y),
        ],
        Stroke::new(1.0, Color32::from_gray(230)),
    );
    ui.add_space(8.0);
}

/// Draw a section label (small, muted text).
pub fn section_label(ui: &mut Ui, text: &str) {
    ui.label(
        egui::RichText::new(text)
            .size(10.0)
            .color(theme::TEXT_MUTED),
    );
}

/// Draw a panel title.
pub fn panel_title(ui: &mut Ui, text: &str) {
    ui.label(
        egui::RichText::new(text)
            .size(15.0)
            .strong()
            .color(theme::TEXT),
    );
    ui.add_space(4.0);
}

/// One line of shortcut help: the keys on the left, what they do on the right.
pub fn shortcut_row(ui: &mut Ui, keys: &str, description: &str) {
    ui.horizontal(|ui| {
        ui.label(
            egui::RichText::new(keys)
                .size(11.0)
                .monospace()
                .color(theme::TEXT),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                egui::RichText::new(description)
                    .size(11.0)
                    .color(theme::TEXT_MUTED),
            );
        });
    });
}

/// A small status line, coloured as an error when `is_error` is set.
pub fn status_text(ui: &mut Ui, text: &str, is_error: bool) {
    let color = if is_error { theme::ERROR } else { theme::TEXT_MUTED };
    ui.label(egui::RichText::new(text).size(11.0).color(color));
}
