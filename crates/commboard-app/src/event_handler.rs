//! Pointer routing for the page canvas: presses, drags, drops and
//! double-clicks on cells.

use commboard_core::dnd::{DropOutcome, DropTarget};
use commboard_core::editor::Editor;
use commboard_core::input::InputState;
use commboard_core::layout::{PageLayout, ViewTransform};
use egui::CursorIcon;
use kurbo::Point;

/// What a canvas press did.
#[derive(Debug, Clone, PartialEq)]
pub enum PressResult {
    /// Nothing under the pointer.
    None,
    /// A press on an occupied cell is armed; moving far enough starts a drag.
    Armed(usize),
    /// A double-click removed the symbol in a cell.
    Removed(usize),
}

/// Maps screen positions onto cells and feeds the editor's drag state.
#[derive(Debug, Clone)]
pub struct EventHandler {
    layout: PageLayout,
    view: ViewTransform,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            layout: PageLayout::new(1, 1),
            view: ViewTransform::default(),
        }
    }

    /// Adopt the geometry of the frame just laid out.
    pub fn update_view(&mut self, layout: PageLayout, view: ViewTransform) {
        self.layout = layout;
        self.view = view;
    }

    /// Current page placement.
    pub fn view(&self) -> ViewTransform {
        self.view
    }

    /// The cell under a screen position.
    pub fn cell_at(&self, position: Point) -> Option<usize> {
        self.layout.hit_test(self.view.screen_to_page(position))
    }

    /// Drop targets under a screen position, innermost first. Nothing is a
    /// target while the pointer is over a panel.
    pub fn drop_targets(&self, position: Point, over_ui: bool) -> Vec<DropTarget> {
        if over_ui {
            return Vec::new();
        }
        let mut targets = Vec::with_capacity(2);
        if let Some(index) = self.cell_at(position) {
            targets.push(DropTarget::Cell(index));
        }
        if self.view.page_on_screen().contains(position) {
            targets.push(DropTarget::Page);
        }
        targets
    }

    /// Handle a primary-button press on the canvas.
    pub fn handle_press(
        &mut self,
        editor: &mut Editor,
        input: &InputState,
        position: Point,
    ) -> PressResult {
        let Some(index) = self.cell_at(position) else {
            editor.press.release();
            return PressResult::None;
        };
        if editor.board.slot(index).is_none() {
            editor.press.release();
            return PressResult::None;
        }

        if input.is_double_click() {
            return match editor.activate_twice(index) {
                Ok(Some(_)) => PressResult::Removed(index),
                Ok(None) => PressResult::None,
                Err(e) => {
                    log::warn!("Double-click on cell {} ignored: {}", index, e);
                    PressResult::None
                }
            };
        }

        editor.press.press(index, position);
        PressResult::Armed(index)
    }

    /// Handle pointer movement. Returns true if the canvas needs a redraw.
    pub fn handle_move(&mut self, editor: &mut Editor, position: Point, over_ui: bool) -> bool {
        if !editor.drag.is_dragging() {
            match editor.press.update(position) {
                Some(origin) => {
                    if !editor.begin_placed_drag(origin, position) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        editor.drag.update_pointer(position);
        let hover = if over_ui { None } else { self.cell_at(position) };
        editor.drag.drag_over(hover);
        true
    }

    /// Handle a primary-button release. Returns the drop outcome if a drag
    /// was in progress.
    pub fn handle_release(
        &mut self,
        editor: &mut Editor,
        position: Point,
        over_ui: bool,
    ) -> Option<DropOutcome> {
        if !editor.drag.is_dragging() {
            editor.press.release();
            return None;
        }
        let targets = self.drop_targets(position, over_ui);
        Some(editor.drop_on(&targets))
    }

    /// Abandon any press or drag. Returns true if a drag was cancelled.
    pub fn cancel(&mut self, editor: &mut Editor) -> bool {
        editor.press.release();
        editor.drag.cancel().is_some()
    }

    /// Cursor to show over the canvas.
    pub fn cursor_for(&self, editor: &Editor, position: Point) -> CursorIcon {
        if editor.drag.is_dragging() {
            return CursorIcon::Grabbing;
        }
        match self.cell_at(position) {
            Some(index) if editor.board.slot(index).is_some() => CursorIcon::Grab,
            _ => CursorIcon::Default,
        }
    }
}
