//! Top-level editor state shared by the panels and the canvas.

use crate::board::{Board, BoardError, BoardResult};
use crate::catalog::{Catalog, CatalogResult, LoadOutcome};
use crate::config::{BoardConfig, GridPreset};
use crate::dnd::{DragPayload, DragSession, DropOutcome, DropTarget, PressTracker, activate_twice};
use crate::filter::SymbolFilter;
use crate::symbol::Symbol;
use kurbo::Point;
use std::sync::Arc;

/// Message shown when the library had to fall back.
pub const FALLBACK_MESSAGE: &str = "Failed to load symbols. Using fallback list.";

/// Catalog loading progress as the library panel sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LibraryStatus {
    /// Showing the initial fallback list, nothing requested yet.
    #[default]
    Idle,
    /// A load is in flight.
    Loading,
    /// The last load succeeded.
    Ready,
    /// The last load fell back; the message is shown without blocking.
    Fallback(String),
}

/// The whole editing session: catalog, board, filter and drag state.
#[derive(Debug, Clone)]
pub struct Editor {
    pub config: BoardConfig,
    pub catalog: Catalog,
    pub board: Board,
    pub filter: SymbolFilter,
    pub drag: DragSession,
    pub press: PressTracker,
    library: LibraryStatus,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}

impl Editor {
    /// Start a session with the fallback catalog and an empty board.
    pub fn new(config: BoardConfig) -> Self {
        let mut board = Board::new(config.rows, config.cols);
        if let Err(e) = board.set_font_scale(config.font_scale.default) {
            log::warn!("Ignoring configured font scale: {}", e);
        }
        Self {
            config,
            catalog: Catalog::fallback(),
            board,
            filter: SymbolFilter::default(),
            drag: DragSession::default(),
            press: PressTracker::default(),
            library: LibraryStatus::Idle,
        }
    }

    /// Library loading status.
    pub fn library_status(&self) -> &LibraryStatus {
        &self.library
    }

    /// Mark a catalog load as started. Returns false if one is already
    /// running.
    pub fn begin_catalog_load(&mut self) -> bool {
        if self.library == LibraryStatus::Loading {
            return false;
        }
        self.library = LibraryStatus::Loading;
        true
    }

    /// Install a listing, falling back on failure, and re-point the board.
    pub fn finish_catalog_load(&mut self, listing: CatalogResult<Vec<Symbol>>) -> LoadOutcome {
        let outcome = self.catalog.apply_listing(listing);
        self.board.relink(&self.catalog);
        self.library = match &outcome {
            LoadOutcome::Loaded(_) => LibraryStatus::Ready,
            LoadOutcome::Fallback(_) => LibraryStatus::Fallback(FALLBACK_MESSAGE.to_string()),
        };
        outcome
    }

    /// Symbols the library shows under the current filter.
    pub fn visible_symbols(&self) -> Vec<Arc<Symbol>> {
        self.filter.apply(&self.catalog).into_iter().cloned().collect()
    }

    /// Add a library symbol to the first free cell.
    pub fn add_to_board(&mut self, id: &str) -> BoardResult<usize> {
        let Some(symbol) = self.catalog.get(id).cloned() else {
            log::warn!("add rejected: unknown symbol '{}'", id);
            return Err(BoardError::UnknownSymbol(id.to_string()));
        };
        self.board.add_first_empty(symbol)
    }

    /// Switch to a grid preset.
    pub fn apply_preset(&mut self, preset: &GridPreset) -> BoardResult<bool> {
        self.drag.cancel();
        self.board.resize(preset.rows, preset.cols)
    }

    /// Check if the board currently matches a preset.
    pub fn is_preset_active(&self, preset: &GridPreset) -> bool {
        self.board.rows() == preset.rows && self.board.cols() == preset.cols
    }

    /// Set the font scale, snapped onto the configured range.
    pub fn set_font_scale(&mut self, value: f32) -> BoardResult<()> {
        let snapped = self.config.font_scale.snap(value);
        self.board.set_font_scale(snapped)
    }

    /// Start dragging a library symbol.
    pub fn begin_catalog_drag(&mut self, id: &str, pointer: Point) -> bool {
        match self.catalog.get(id) {
            Some(symbol) => {
                self.drag
                    .begin(DragPayload::Catalog(Arc::clone(symbol)), pointer);
                true
            }
            None => false,
        }
    }

    /// Start dragging the symbol in a cell.
    pub fn begin_placed_drag(&mut self, origin: usize, pointer: Point) -> bool {
        match self.board.slot(origin) {
            Some(symbol) => {
                let symbol = Arc::clone(symbol);
                self.drag
                    .begin(DragPayload::Placed { symbol, origin }, pointer);
                true
            }
            None => false,
        }
    }

    /// Finish the active drag over the given targets.
    pub fn drop_on(&mut self, targets: &[DropTarget]) -> DropOutcome {
        self.press.release();
        self.drag.drop(targets, &mut self.board)
    }

    /// Double activation on a cell.
    pub fn activate_twice(&mut self, index: usize) -> BoardResult<Option<Arc<Symbol>>> {
        self.press.release();
        activate_twice(&mut self.board, index)
    }

    /// Whether there is anything to export.
    pub fn can_export(&self) -> bool {
        !self.board.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogError;

    fn editor() -> Editor {
        let mut editor = Editor::default();
        editor.finish_catalog_load(Ok(vec![
            Symbol::new("bath", "Bath", "/assets/bath.png", ["daily-activities"]),
            Symbol::new("car", "Car", "/assets/car.png", ["objects"]),
        ]));
        editor
    }

    #[test]
    fn test_catalog_load_status() {
        let mut editor = Editor::default();
        assert_eq!(editor.library_status(), &LibraryStatus::Idle);
        assert!(editor.begin_catalog_load());
        assert!(!editor.begin_catalog_load());

        let outcome = editor.finish_catalog_load(Err(CatalogError::Network("offline".into())));
        assert!(outcome.is_fallback());
        assert_eq!(
            editor.library_status(),
            &LibraryStatus::Fallback(FALLBACK_MESSAGE.to_string())
        );
        assert!(editor.catalog.contains("bath"));
    }

    #[test]
    fn test_reload_relinks_board() {
        let mut editor = editor();
        editor.add_to_board("car").unwrap();
        editor.add_to_board("bath").unwrap();

        editor.finish_catalog_load(Ok(vec![Symbol::from_file_name("car.png")]));

        assert_eq!(editor.board.slot(0).unwrap().id, "car");
        assert!(editor.board.slot(1).is_none());
    }

    #[test]
    fn test_visible_symbols_follow_filter() {
        let mut editor = editor();
        assert_eq!(editor.visible_symbols().len(), 2);
        editor.filter.toggle_tag("objects");
        let visible = editor.visible_symbols();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, "car");
    }

    #[test]
    fn test_add_to_board() {
        let mut editor = editor();
        assert_eq!(editor.add_to_board("bath"), Ok(0));
        assert_eq!(editor.add_to_board("car"), Ok(1));
        assert_eq!(
            editor.add_to_board("unicorn"),
            Err(BoardError::UnknownSymbol("unicorn".to_string()))
        );
        assert!(editor.can_export());
    }

    #[test]
    fn test_drag_from_library_and_between_cells() {
        let mut editor = editor();
        assert!(editor.begin_catalog_drag("bath", Point::ZERO));
        assert_eq!(
            editor.drop_on(&[DropTarget::Cell(0), DropTarget::Page]),
            DropOutcome::Placed { index: 0 }
        );

        assert!(!editor.begin_placed_drag(5, Point::ZERO));
        assert!(editor.begin_placed_drag(0, Point::ZERO));
        assert_eq!(
            editor.drop_on(&[DropTarget::Cell(5)]),
            DropOutcome::Moved { from: 0, to: 5 }
        );
        assert_eq!(editor.board.slot(5).unwrap().id, "bath");
    }

    #[test]
    fn test_presets_and_font_scale() {
        let mut editor = editor();
        editor.add_to_board("bath").unwrap();
        editor.begin_catalog_drag("car", Point::ZERO);

        let preset = editor.config.presets[0].clone();
        assert_eq!(editor.apply_preset(&preset), Ok(true));
        assert!(editor.is_preset_active(&preset));
        assert_eq!(editor.board.len(), 6);
        assert!(!editor.drag.is_dragging());

        editor.set_font_scale(1.46).unwrap();
        assert!((editor.board.font_scale() - 1.5).abs() < 1e-5);
        editor.set_font_scale(9.0).unwrap();
        assert_eq!(editor.board.font_scale(), 2.0);
    }

    #[test]
    fn test_activate_twice() {
        let mut editor = editor();
        editor.add_to_board("bath").unwrap();
        let removed = editor.activate_twice(0).unwrap();
        assert_eq!(removed.unwrap().id, "bath");
        assert!(!editor.can_export());
    }
}
