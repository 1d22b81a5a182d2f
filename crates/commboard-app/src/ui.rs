//! UI panels using egui: the symbol library, the board controls, the add
//! popup and the export alert.

use std::collections::HashMap;

use commboard_core::editor::{Editor, LibraryStatus};
use commboard_core::symbol::tag_description;
use egui::load::SizedTexture;
use egui::{Align2, Color32, Context, ImageSource, Pos2, Rect, TextureHandle, Vec2};

use commboard_widgets::{
    ActionButton, SymbolTile, TILE_SIZE, TagChip, ToggleButton, panel_frame, panel_title,
    popup_frame, section_label, separator, shortcut_row, sizing, status_text, theme,
};

use crate::shortcuts::ShortcutRegistry;

/// Shown in the popup when there is no empty cell left.
pub const BOARD_FULL_MESSAGE: &str = "The board is full. Remove a symbol or pick a larger grid.";

/// UI state that lives across frames but is not part of the editor.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Search box contents.
    pub search: String,
    /// Symbol id the "Add Symbol?" popup is open for.
    pub popup: Option<String>,
    /// Inline error shown in the popup.
    pub popup_error: Option<String>,
    /// Blocking alert text.
    pub alert: Option<String>,
    /// Whether the shortcut help is expanded.
    pub show_shortcuts: bool,
}

impl UiState {
    /// Open the add popup for a symbol.
    pub fn open_popup(&mut self, id: &str) {
        self.popup = Some(id.to_string());
        self.popup_error = None;
    }

    /// Close the add popup.
    pub fn close_popup(&mut self) {
        self.popup = None;
        self.popup_error = None;
    }

    /// Check if a modal (popup or alert) is covering the canvas.
    pub fn is_modal_open(&self) -> bool {
        self.popup.is_some() || self.alert.is_some()
    }
}

/// Actions that can be triggered by the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    /// The search text changed.
    SetQuery(String),
    /// Toggle a tag filter.
    ToggleTag(String),
    /// Drop all filters.
    ClearFilter,
    /// A library tile was clicked.
    OpenPopup(String),
    /// Add a symbol to the first empty cell.
    AddSymbol(String),
    /// Close the add popup.
    ClosePopup,
    /// A library tile started being dragged.
    BeginDrag(String),
    /// Switch to the preset at this index of the configured presets.
    ApplyPreset(usize),
    /// Set the label font scale.
    SetFontScale(f32),
    /// Export the board as PNG.
    ExportPng,
    /// Dismiss the blocking alert.
    DismissAlert,
}

/// Export state as the controls panel sees it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportView<'a> {
    pub is_exporting: bool,
    pub status: Option<&'a str>,
}

/// What one UI pass produced.
#[derive(Debug, Clone)]
pub struct UiOutput {
    pub actions: Vec<UiAction>,
    /// Area left over for the page canvas, in points.
    pub canvas_rect: Rect,
}

/// Render all UI and return the triggered actions.
pub fn render_ui(
    ctx: &Context,
    ui_state: &mut UiState,
    editor: &Editor,
    textures: &HashMap<String, TextureHandle>,
    export: ExportView<'_>,
) -> UiOutput {
    let mut actions = Vec::new();

    render_library_panel(ctx, ui_state, editor, textures, &mut actions);
    render_controls_panel(ctx, ui_state, editor, export, &mut actions);
    let canvas_rect = ctx.available_rect();

    if ui_state.popup.is_some() {
        render_add_popup(ctx, ui_state, editor, textures, &mut actions);
    }
    if ui_state.alert.is_some() {
        render_alert(ctx, ui_state, &mut actions);
    }

    UiOutput {
        actions,
        canvas_rect,
    }
}

fn texture_for<'a>(
    textures: &'a HashMap<String, TextureHandle>,
    image_path: &str,
) -> Option<ImageSource<'a>> {
    textures
        .get(image_path)
        .map(|handle| ImageSource::Texture(SizedTexture::from_handle(handle)))
}

/// Left panel: search, tag chips and the symbol grid.
fn render_library_panel(
    ctx: &Context,
    ui_state: &mut UiState,
    editor: &Editor,
    textures: &HashMap<String, TextureHandle>,
    actions: &mut Vec<UiAction>,
) {
    egui::SidePanel::left("library")
        .resizable(false)
        .exact_width(sizing::SIDE_PANEL_WIDTH)
        .frame(panel_frame())
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                panel_title(ui, "Symbol Library");
                if *editor.library_status() == LibraryStatus::Loading {
                    ui.spinner();
                }
            });

            match editor.library_status() {
                LibraryStatus::Loading => status_text(ui, "Loading symbols...", false),
                LibraryStatus::Fallback(message) => status_text(ui, message, true),
                _ => {}
            }

            ui.add_space(6.0);
            let search = ui.add(
                egui::TextEdit::singleline(&mut ui_state.search)
                    .hint_text("Search symbols...")
                    .desired_width(f32::INFINITY),
            );
            if search.changed() {
                actions.push(UiAction::SetQuery(ui_state.search.clone()));
            }

            ui.add_space(6.0);
            section_label(ui, "Categories");
            ui.horizontal_wrapped(|ui| {
                ui.spacing_mut().item_spacing = Vec2::new(4.0, 4.0);
                for tag in editor.catalog.all_tags() {
                    let selected = editor.filter.is_selected(&tag);
                    let description = tag_description(&tag).unwrap_or(tag.as_str());
                    if TagChip::new(&tag, selected)
                        .description(description)
                        .show(ui)
                    {
                        actions.push(UiAction::ToggleTag(tag.clone()));
                    }
                }
            });
            if !editor.filter.is_empty()
                && ui
                    .small_button("Clear filters")
                    .on_hover_text("Show every symbol")
                    .clicked()
            {
                ui_state.search.clear();
                actions.push(UiAction::ClearFilter);
            }

            separator(ui);

            let visible = editor.visible_symbols();
            if visible.is_empty() {
                status_text(ui, "No symbols match.", false);
                return;
            }

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.spacing_mut().item_spacing = Vec2::new(6.0, 6.0);
                        for symbol in &visible {
                            let mut tile = SymbolTile::new(&symbol.name)
                                .size(Vec2::splat(TILE_SIZE))
                                .highlighted(ui_state.popup.as_deref() == Some(&symbol.id));
                            if let Some(image) = texture_for(textures, &symbol.image_path) {
                                tile = tile.image(image);
                            }
                            let response = tile.show(ui);
                            if response.drag_started() {
                                actions.push(UiAction::BeginDrag(symbol.id.clone()));
                            } else if response.clicked() {
                                actions.push(UiAction::OpenPopup(symbol.id.clone()));
                            }
                        }
                    });
                });
        });
}

/// Right panel: grid presets, font size, export and shortcut help.
fn render_controls_panel(
    ctx: &Context,
    ui_state: &mut UiState,
    editor: &Editor,
    export: ExportView<'_>,
    actions: &mut Vec<UiAction>,
) {
    egui::SidePanel::right("controls")
        .resizable(false)
        .exact_width(sizing::SIDE_PANEL_WIDTH)
        .frame(panel_frame())
        .show(ctx, |ui| {
            panel_title(ui, "Board");

            section_label(ui, "Grid size");
            ui.horizontal(|ui| {
                for (index, preset) in editor.config.presets.iter().enumerate() {
                    let description = preset.description();
                    if ToggleButton::new(&preset.label, editor.is_preset_active(preset))
                        .min_width(56.0)
                        .tooltip(&description)
                        .show(ui)
                    {
                        actions.push(UiAction::ApplyPreset(index));
                    }
                }
            });

            ui.add_space(8.0);
            section_label(ui, "Font size");
            let range = editor.config.font_scale;
            let mut scale = editor.board.font_scale();
            let slider = ui.add(
                egui::Slider::new(&mut scale, range.min..=range.max)
                    .step_by(range.step as f64)
                    .custom_formatter(|v, _| format!("{:.1}em", v)),
            );
            if slider.changed() {
                actions.push(UiAction::SetFontScale(scale));
            }

            separator(ui);

            section_label(ui, "Export");
            let enabled = editor.can_export() && !export.is_exporting;
            let label = if export.is_exporting {
                "Exporting..."
            } else {
                "Export PNG"
            };
            if ActionButton::primary(label)
                .enabled(enabled)
                .shortcut("Ctrl+E")
                .show(ui)
            {
                actions.push(UiAction::ExportPng);
            }
            if !editor.can_export() {
                status_text(ui, "Add a symbol to enable export.", false);
            }
            if let Some(status) = export.status {
                status_text(ui, status, status.starts_with("Error"));
            }

            separator(ui);

            let toggle = if ui_state.show_shortcuts {
                "Hide shortcuts"
            } else {
                "Show shortcuts"
            };
            if ui.small_button(toggle).clicked() {
                ui_state.show_shortcuts = !ui_state.show_shortcuts;
            }
            if ui_state.show_shortcuts {
                ui.add_space(4.0);
                for shortcut in ShortcutRegistry::all() {
                    shortcut_row(ui, &shortcut.format(), shortcut.description);
                }
            }
        });
}

/// Dimmed full-screen layer behind modals. Returns true when clicked.
fn backdrop(ctx: &Context, id: &str) -> bool {
    let mut clicked = false;
    egui::Area::new(egui::Id::new(id))
        .fixed_pos(Pos2::ZERO)
        .order(egui::Order::Middle)
        .show(ctx, |ui| {
            let screen_rect = ctx.input(|i| i.content_rect());
            let response = ui.allocate_rect(screen_rect, egui::Sense::click());
            ui.painter()
                .rect_filled(screen_rect, 0.0, Color32::from_black_alpha(80));
            clicked = response.clicked();
        });
    clicked
}

/// The "Add Symbol?" popup.
fn render_add_popup(
    ctx: &Context,
    ui_state: &mut UiState,
    editor: &Editor,
    textures: &HashMap<String, TextureHandle>,
    actions: &mut Vec<UiAction>,
) {
    let Some(symbol) = ui_state
        .popup
        .as_deref()
        .and_then(|id| editor.catalog.get(id))
        .cloned()
    else {
        actions.push(UiAction::ClosePopup);
        return;
    };

    if backdrop(ctx, "add_popup_backdrop") {
        actions.push(UiAction::ClosePopup);
    }

    egui::Area::new(egui::Id::new("add_popup"))
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            popup_frame().show(ui, |ui| {
                ui.set_width(280.0);
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("Add Symbol?")
                            .size(16.0)
                            .strong()
                            .color(theme::TEXT),
                    );
                    ui.add_space(8.0);
                    let mut tile = SymbolTile::new(&symbol.name).size(Vec2::splat(120.0));
                    if let Some(image) = texture_for(textures, &symbol.image_path) {
                        tile = tile.image(image);
                    }
                    tile.show(ui);
                    ui.add_space(8.0);
                    ui.label(
                        egui::RichText::new(format!(
                            "Add \"{}\" to the first empty cell?",
                            symbol.name
                        ))
                        .color(theme::TEXT_MUTED),
                    );
                    if let Some(error) = &ui_state.popup_error {
                        status_text(ui, error, true);
                    }
                });

                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ActionButton::secondary("Cancel").show(ui) {
                        actions.push(UiAction::ClosePopup);
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ActionButton::primary("Add to Page")
                            .enabled(!editor.board.is_full())
                            .show(ui)
                        {
                            actions.push(UiAction::AddSymbol(symbol.id.clone()));
                        }
                    });
                });
            });
        });
}

/// Blocking alert for export failures.
fn render_alert(ctx: &Context, ui_state: &UiState, actions: &mut Vec<UiAction>) {
    let Some(message) = ui_state.alert.as_deref() else {
        return;
    };
    backdrop(ctx, "alert_backdrop");

    egui::Area::new(egui::Id::new("alert"))
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
        .order(egui::Order::Foreground)
        .show(ctx, |ui| {
            popup_frame().show(ui, |ui| {
                ui.set_width(320.0);
                ui.label(
                    egui::RichText::new("Export failed")
                        .size(16.0)
                        .strong()
                        .color(theme::ERROR),
                );
                ui.add_space(8.0);
                ui.label(egui::RichText::new(message).color(theme::TEXT));
                ui.add_space(12.0);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ActionButton::primary("OK").show(ui) {
                        actions.push(UiAction::DismissAlert);
                    }
                });
            });
        });
}
