//! Board state: grid dimensions, slots and display settings.

use crate::catalog::Catalog;
use crate::symbol::Symbol;
use std::sync::Arc;
use thiserror::Error;

/// Default number of grid rows.
pub const DEFAULT_ROWS: usize = 4;
/// Default number of grid columns.
pub const DEFAULT_COLS: usize = 3;
/// Default label font scale.
pub const DEFAULT_FONT_SCALE: f32 = 1.0;
/// Largest row or column count a board accepts.
pub const MAX_GRID_DIMENSION: usize = 32;

/// Number of slots in a `rows` x `cols` grid, or `None` if either
/// dimension is zero or above [`MAX_GRID_DIMENSION`].
pub fn slot_count(rows: usize, cols: usize) -> Option<usize> {
    if rows == 0 || cols == 0 || rows > MAX_GRID_DIMENSION || cols > MAX_GRID_DIMENSION {
        return None;
    }
    rows.checked_mul(cols)
}

/// Rejected board operations. The board is left untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("Slot index {index} out of range (board has {len} slots)")]
    OutOfRange { index: usize, len: usize },
    #[error("Cannot move slot {0} onto itself")]
    SameSlot(usize),
    #[error("Board is full")]
    Full,
    #[error("Invalid grid size {rows}x{cols}")]
    InvalidSize { rows: usize, cols: usize },
    #[error("Invalid font scale {0}")]
    InvalidFontScale(f32),
    #[error("Unknown symbol '{0}'")]
    UnknownSymbol(String),
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// A single grid cell: empty or holding a catalog symbol.
pub type Slot = Option<Arc<Symbol>>;

/// The grid of placement slots.
///
/// Slots are row-major: `index = row * cols + col`, and there are always
/// exactly `rows * cols` of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    rows: usize,
    cols: usize,
    slots: Vec<Slot>,
    font_scale: f32,
}

impl Default for Board {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

impl Board {
    /// Create an empty board. Dimensions are clamped to
    /// `1..=MAX_GRID_DIMENSION`.
    pub fn new(rows: usize, cols: usize) -> Self {
        let rows = rows.clamp(1, MAX_GRID_DIMENSION);
        let cols = cols.clamp(1, MAX_GRID_DIMENSION);
        Self {
            rows,
            cols,
            slots: vec![None; rows * cols],
            font_scale: DEFAULT_FONT_SCALE,
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Label font scale.
    pub fn font_scale(&self) -> f32 {
        self.font_scale
    }

    /// Number of slots (`rows * cols`).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no slot holds a symbol.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Check if every slot holds a symbol.
    pub fn is_full(&self) -> bool {
        self.first_empty().is_none()
    }

    /// All slots in index order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// The symbol at `index`, if any.
    pub fn slot(&self, index: usize) -> Option<&Arc<Symbol>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Number of occupied slots.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Index of the first empty slot.
    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Slot index of a grid position.
    pub fn index_of(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    /// Grid position `(row, col)` of a slot index.
    pub fn position_of(&self, index: usize) -> Option<(usize, usize)> {
        (index < self.len()).then(|| (index / self.cols, index % self.cols))
    }

    fn check_index(&self, index: usize, op: &str) -> BoardResult<()> {
        if index < self.len() {
            Ok(())
        } else {
            let err = BoardError::OutOfRange {
                index,
                len: self.len(),
            };
            log::warn!("{} rejected: {}", op, err);
            Err(err)
        }
    }

    /// Put a symbol into a slot, replacing whatever was there.
    pub fn place_at(&mut self, symbol: Arc<Symbol>, index: usize) -> BoardResult<()> {
        self.check_index(index, "place")?;
        log::debug!("Placing '{}' at slot {}", symbol.id, index);
        self.slots[index] = Some(symbol);
        Ok(())
    }

    /// Swap the contents of two distinct slots.
    pub fn move_symbol(&mut self, from: usize, to: usize) -> BoardResult<()> {
        self.check_index(from, "move")?;
        self.check_index(to, "move")?;
        if from == to {
            log::warn!("move rejected: source and target are slot {}", from);
            return Err(BoardError::SameSlot(from));
        }
        log::debug!("Swapping slots {} and {}", from, to);
        self.slots.swap(from, to);
        Ok(())
    }

    /// Empty a slot. Removing from an empty slot succeeds and changes nothing.
    pub fn remove(&mut self, index: usize) -> BoardResult<Option<Arc<Symbol>>> {
        self.check_index(index, "remove")?;
        let removed = self.slots[index].take();
        if let Some(symbol) = &removed {
            log::debug!("Removed '{}' from slot {}", symbol.id, index);
        }
        Ok(removed)
    }

    /// Put a symbol into the first empty slot and return its index.
    pub fn add_first_empty(&mut self, symbol: Arc<Symbol>) -> BoardResult<usize> {
        let Some(index) = self.first_empty() else {
            log::warn!("add rejected: board is full");
            return Err(BoardError::Full);
        };
        log::debug!("Adding '{}' at slot {}", symbol.id, index);
        self.slots[index] = Some(symbol);
        Ok(index)
    }

    /// Change the grid dimensions.
    ///
    /// Slots are copied by linear index: slot `i` survives when
    /// `i < min(old_len, new_len)`, so symbols can land in a different
    /// row and column. New slots are empty. Returns `false` when the
    /// dimensions are unchanged.
    pub fn resize(&mut self, rows: usize, cols: usize) -> BoardResult<bool> {
        let Some(len) = slot_count(rows, cols) else {
            log::warn!("resize rejected: {}x{}", rows, cols);
            return Err(BoardError::InvalidSize { rows, cols });
        };
        if rows == self.rows && cols == self.cols {
            return Ok(false);
        }

        let mut slots: Vec<Slot> = vec![None; len];
        let keep = slots.len().min(self.slots.len());
        slots[..keep].clone_from_slice(&self.slots[..keep]);

        log::debug!(
            "Resizing board {}x{} -> {}x{}",
            self.rows,
            self.cols,
            rows,
            cols
        );
        self.rows = rows;
        self.cols = cols;
        self.slots = slots;
        Ok(true)
    }

    /// Set the label font scale.
    pub fn set_font_scale(&mut self, value: f32) -> BoardResult<()> {
        if !value.is_finite() || value <= 0.0 {
            log::warn!("font scale rejected: {}", value);
            return Err(BoardError::InvalidFontScale(value));
        }
        self.font_scale = value;
        Ok(())
    }

    /// Point every slot at the catalog's copy of its symbol.
    ///
    /// Slots whose symbol id is no longer in the catalog are emptied.
    /// Returns the number of cleared slots.
    pub fn relink(&mut self, catalog: &Catalog) -> usize {
        let mut cleared = 0;
        for slot in self.slots.iter_mut() {
            if let Some(symbol) = slot.as_ref() {
                match catalog.get(&symbol.id) {
                    Some(current) => *slot = Some(Arc::clone(current)),
                    None => {
                        *slot = None;
                        cleared += 1;
                    }
                }
            }
        }
        if cleared > 0 {
            log::info!("Cleared {} slots whose symbols left the catalog", cleared);
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(file: &str) -> Arc<Symbol> {
        Arc::new(Symbol::from_file_name(file))
    }

    fn ids(board: &Board) -> Vec<Option<&str>> {
        board
            .slots()
            .iter()
            .map(|s| s.as_ref().map(|s| s.id.as_str()))
            .collect()
    }

    #[test]
    fn test_default_board() {
        let board = Board::default();
        assert_eq!(board.rows(), 4);
        assert_eq!(board.cols(), 3);
        assert_eq!(board.len(), 12);
        assert!(board.is_empty());
        assert_eq!(board.font_scale(), 1.0);
    }

    #[test]
    fn test_place_at() {
        let mut board = Board::default();
        board.place_at(sym("car.png"), 5).unwrap();

        assert_eq!(board.slot(5).unwrap().id, "car");
        assert_eq!(board.occupied_count(), 1);

        // overwrite
        board.place_at(sym("bath.png"), 5).unwrap();
        assert_eq!(board.slot(5).unwrap().id, "bath");
    }

    #[test]
    fn test_place_out_of_range() {
        let mut board = Board::default();
        let before = board.clone();
        let result = board.place_at(sym("car.png"), 12);
        assert_eq!(result, Err(BoardError::OutOfRange { index: 12, len: 12 }));
        assert_eq!(board, before);
    }

    #[test]
    fn test_move_swaps() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        board.place_at(sym("car.png"), 1).unwrap();

        board.move_symbol(0, 1).unwrap();
        assert_eq!(ids(&board)[..2], [Some("car"), Some("bath")]);

        // swapping twice is the identity
        board.move_symbol(0, 1).unwrap();
        assert_eq!(ids(&board)[..2], [Some("bath"), Some("car")]);
    }

    #[test]
    fn test_move_into_empty() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        board.move_symbol(0, 7).unwrap();
        assert!(board.slot(0).is_none());
        assert_eq!(board.slot(7).unwrap().id, "bath");
    }

    #[test]
    fn test_move_rejections() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        let before = board.clone();

        assert_eq!(board.move_symbol(0, 0), Err(BoardError::SameSlot(0)));
        assert!(board.move_symbol(0, 99).is_err());
        assert!(board.move_symbol(99, 0).is_err());
        assert_eq!(board, before);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 3).unwrap();

        let removed = board.remove(3).unwrap();
        assert_eq!(removed.unwrap().id, "bath");
        assert!(board.slot(3).is_none());

        assert_eq!(board.remove(3), Ok(None));
        assert!(board.is_empty());
        assert!(board.remove(12).is_err());
    }

    #[test]
    fn test_add_first_empty() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        board.place_at(sym("car.png"), 2).unwrap();

        assert_eq!(board.add_first_empty(sym("toilet.png")), Ok(1));
        assert_eq!(board.add_first_empty(sym("stop.png")), Ok(3));
    }

    #[test]
    fn test_add_first_empty_when_full() {
        let mut board = Board::default();
        for i in 0..board.len() {
            board.place_at(sym("bath.png"), i).unwrap();
        }
        let before = board.clone();

        assert!(board.is_full());
        assert_eq!(board.add_first_empty(sym("car.png")), Err(BoardError::Full));
        assert_eq!(board, before);
    }

    #[test]
    fn test_resize_shrink_keeps_prefix() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        board.place_at(sym("car.png"), 5).unwrap();
        board.place_at(sym("toilet.png"), 11).unwrap();

        assert_eq!(board.resize(3, 2), Ok(true));
        assert_eq!(board.len(), 6);
        assert_eq!(board.rows(), 3);
        assert_eq!(board.cols(), 2);
        assert_eq!(
            ids(&board),
            vec![Some("bath"), None, None, None, None, Some("car")]
        );
    }

    #[test]
    fn test_resize_grow_pads_empty() {
        let mut board = Board::new(3, 2);
        board.place_at(sym("bath.png"), 4).unwrap();

        board.resize(4, 3).unwrap();
        assert_eq!(board.len(), 12);
        // linear remap: index 4 was (2, 0), now (1, 1)
        assert_eq!(board.slot(4).unwrap().id, "bath");
        assert_eq!(board.position_of(4), Some((1, 1)));
        assert!(board.slots()[6..].iter().all(Option::is_none));
    }

    #[test]
    fn test_resize_same_dims_is_noop() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        assert_eq!(board.resize(4, 3), Ok(false));
        assert_eq!(board.slot(0).unwrap().id, "bath");
    }

    #[test]
    fn test_resize_rejects_zero() {
        let mut board = Board::default();
        assert_eq!(
            board.resize(0, 3),
            Err(BoardError::InvalidSize { rows: 0, cols: 3 })
        );
        assert_eq!(board.len(), 12);
    }

    #[test]
    fn test_resize_rejects_huge_dimensions() {
        let mut board = Board::default();
        assert_eq!(
            board.resize(usize::MAX / 2, 3),
            Err(BoardError::InvalidSize {
                rows: usize::MAX / 2,
                cols: 3
            })
        );
        assert!(board.resize(3, MAX_GRID_DIMENSION + 1).is_err());
        assert_eq!((board.rows(), board.cols(), board.len()), (4, 3, 12));

        assert_eq!(board.resize(MAX_GRID_DIMENSION, MAX_GRID_DIMENSION), Ok(true));
        assert_eq!(board.len(), MAX_GRID_DIMENSION * MAX_GRID_DIMENSION);
    }

    #[test]
    fn test_new_clamps_dimensions() {
        let board = Board::new(0, usize::MAX);
        assert_eq!(board.rows(), 1);
        assert_eq!(board.cols(), MAX_GRID_DIMENSION);
        assert_eq!(board.len(), MAX_GRID_DIMENSION);
    }

    #[test]
    fn test_font_scale() {
        let mut board = Board::default();
        board.set_font_scale(1.5).unwrap();
        assert_eq!(board.font_scale(), 1.5);

        assert!(board.set_font_scale(0.0).is_err());
        assert!(board.set_font_scale(-1.0).is_err());
        assert!(board.set_font_scale(f32::NAN).is_err());
        assert_eq!(board.font_scale(), 1.5);
    }

    #[test]
    fn test_index_and_position() {
        let board = Board::new(3, 2);
        assert_eq!(board.index_of(1, 1), Some(3));
        assert_eq!(board.index_of(3, 0), None);
        assert_eq!(board.index_of(0, 2), None);
        assert_eq!(board.position_of(5), Some((2, 1)));
        assert_eq!(board.position_of(6), None);
    }

    #[test]
    fn test_relink() {
        let catalog = Catalog::new(vec![Symbol::from_file_name("car.png")]);
        let mut board = Board::default();
        board.place_at(sym("car.png"), 0).unwrap();
        board.place_at(sym("bath.png"), 1).unwrap();

        assert_eq!(board.relink(&catalog), 1);
        assert!(Arc::ptr_eq(board.slot(0).unwrap(), catalog.get("car").unwrap()));
        assert!(board.slot(1).is_none());
    }

    #[test]
    fn test_place_move_resize_scenario() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        board.place_at(sym("car.png"), 1).unwrap();
        board.move_symbol(0, 1).unwrap();
        board.resize(3, 2).unwrap();

        assert_eq!(
            ids(&board),
            vec![Some("car"), Some("bath"), None, None, None, None]
        );
    }
}
