//! Drag-and-drop placement state machine.

use crate::board::{Board, BoardError, BoardResult};
use crate::symbol::Symbol;
use kurbo::Point;
use std::sync::Arc;

/// Pointer travel (in screen pixels) before a press on a placed symbol
/// turns into a drag.
pub const DRAG_THRESHOLD: f64 = 4.0;

/// What is being dragged.
#[derive(Debug, Clone, PartialEq)]
pub enum DragPayload {
    /// A new symbol from the library.
    Catalog(Arc<Symbol>),
    /// A symbol already on the board, picked up from `origin`.
    Placed { symbol: Arc<Symbol>, origin: usize },
}

impl DragPayload {
    /// The dragged symbol.
    pub fn symbol(&self) -> &Arc<Symbol> {
        match self {
            Self::Catalog(symbol) | Self::Placed { symbol, .. } => symbol,
        }
    }

    /// Source slot for placed symbols.
    pub fn origin(&self) -> Option<usize> {
        match self {
            Self::Catalog(_) => None,
            Self::Placed { origin, .. } => Some(*origin),
        }
    }
}

/// Something under the pointer that may receive a drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A grid cell.
    Cell(usize),
    /// The page around the grid. Never accepts drops.
    Page,
}

impl DropTarget {
    fn accepts(&self) -> Option<usize> {
        match self {
            Self::Cell(index) => Some(*index),
            Self::Page => None,
        }
    }
}

/// How a drag gesture ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    /// A library symbol was written into a cell.
    Placed { index: usize },
    /// Two cells were swapped.
    Moved { from: usize, to: usize },
    /// A placed symbol was dropped back on its own cell.
    SameCell(usize),
    /// Nothing under the pointer accepted the drop.
    NoTarget,
    /// The accepting cell rejected the operation.
    Rejected(BoardError),
}

impl DropOutcome {
    /// Whether the board changed.
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Placed { .. } | Self::Moved { .. })
    }
}

/// State of the current drag gesture.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragSession {
    /// No drag in progress.
    #[default]
    Idle,
    /// A payload is following the pointer.
    Dragging {
        payload: DragPayload,
        /// Cell currently under the pointer (highlight only).
        hover: Option<usize>,
        /// Pointer position in screen coordinates.
        pointer: Point,
    },
}

impl DragSession {
    /// Start dragging. Any previous gesture is abandoned.
    pub fn begin(&mut self, payload: DragPayload, pointer: Point) {
        if self.is_dragging() {
            log::debug!("Abandoning previous drag");
        }
        log::debug!("Drag started: '{}'", payload.symbol().id);
        *self = Self::Dragging {
            payload,
            hover: None,
            pointer,
        };
    }

    /// Check if a drag is in progress.
    pub fn is_dragging(&self) -> bool {
        matches!(self, Self::Dragging { .. })
    }

    /// The dragged payload.
    pub fn payload(&self) -> Option<&DragPayload> {
        match self {
            Self::Idle => None,
            Self::Dragging { payload, .. } => Some(payload),
        }
    }

    /// The hovered cell.
    pub fn hover(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Dragging { hover, .. } => *hover,
        }
    }

    /// The pointer position while dragging.
    pub fn pointer(&self) -> Option<Point> {
        match self {
            Self::Idle => None,
            Self::Dragging { pointer, .. } => Some(*pointer),
        }
    }

    /// Track the pointer.
    pub fn update_pointer(&mut self, position: Point) {
        if let Self::Dragging { pointer, .. } = self {
            *pointer = position;
        }
    }

    /// Update the hovered cell. Returns true if it changed.
    pub fn drag_over(&mut self, target: Option<usize>) -> bool {
        match self {
            Self::Dragging { hover, .. } if *hover != target => {
                *hover = target;
                true
            }
            _ => false,
        }
    }

    /// Abandon the gesture without touching the board.
    pub fn cancel(&mut self) -> Option<DragPayload> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::Dragging { payload, .. } => {
                log::debug!("Drag cancelled");
                Some(payload)
            }
        }
    }

    /// Finish the gesture over `targets`, innermost first.
    ///
    /// Only the first target that accepts the drop applies it; every outer
    /// target sees the drop as consumed and does nothing. The session is
    /// idle afterwards.
    pub fn drop(&mut self, targets: &[DropTarget], board: &mut Board) -> DropOutcome {
        let Some(payload) = self.cancel() else {
            return DropOutcome::NoTarget;
        };

        let mut outcome = None;
        for target in targets {
            if outcome.is_some() {
                // already handled by an inner target
                continue;
            }
            if let Some(index) = target.accepts() {
                outcome = Some(apply_drop(&payload, index, board));
            }
        }

        let outcome = outcome.unwrap_or(DropOutcome::NoTarget);
        log::debug!("Drop finished: {:?}", outcome);
        outcome
    }
}

fn apply_drop(payload: &DragPayload, index: usize, board: &mut Board) -> DropOutcome {
    let result = match payload {
        DragPayload::Catalog(symbol) => board
            .place_at(Arc::clone(symbol), index)
            .map(|()| DropOutcome::Placed { index }),
        DragPayload::Placed { origin, .. } if *origin == index => {
            return DropOutcome::SameCell(index);
        }
        DragPayload::Placed { origin, .. } => board
            .move_symbol(*origin, index)
            .map(|()| DropOutcome::Moved {
                from: *origin,
                to: index,
            }),
    };
    result.unwrap_or_else(DropOutcome::Rejected)
}

/// Double activation on a cell: removes its symbol if there is one.
pub fn activate_twice(board: &mut Board, index: usize) -> BoardResult<Option<Arc<Symbol>>> {
    if board.slot(index).is_none() {
        return Ok(None);
    }
    board.remove(index)
}

/// Turns a press on a placed symbol into a drag once the pointer has moved
/// far enough, so plain clicks and double-clicks stay clicks.
#[derive(Debug, Clone, Default)]
pub struct PressTracker {
    pressed: Option<(usize, Point)>,
}

impl PressTracker {
    /// Create an idle tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press on the cell at `index`.
    pub fn press(&mut self, index: usize, position: Point) {
        self.pressed = Some((index, position));
    }

    /// Feed a pointer move. Returns the pressed cell once the threshold is
    /// crossed; the tracker then resets.
    pub fn update(&mut self, position: Point) -> Option<usize> {
        let (index, start) = self.pressed?;
        if start.distance(position) > DRAG_THRESHOLD {
            self.pressed = None;
            Some(index)
        } else {
            None
        }
    }

    /// Forget the press.
    pub fn release(&mut self) {
        self.pressed = None;
    }

    /// Check if a press is pending.
    pub fn is_pressed(&self) -> bool {
        self.pressed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(file: &str) -> Arc<Symbol> {
        Arc::new(Symbol::from_file_name(file))
    }

    fn id_at(board: &Board, index: usize) -> Option<&str> {
        board.slot(index).map(|s| s.id.as_str())
    }

    #[test]
    fn test_catalog_drop_places() {
        let mut board = Board::default();
        let mut session = DragSession::default();
        session.begin(DragPayload::Catalog(sym("bath.png")), Point::ZERO);
        assert!(session.is_dragging());

        let outcome = session.drop(&[DropTarget::Cell(4), DropTarget::Page], &mut board);

        assert_eq!(outcome, DropOutcome::Placed { index: 4 });
        assert_eq!(id_at(&board, 4), Some("bath"));
        assert_eq!(session, DragSession::Idle);
    }

    #[test]
    fn test_catalog_drop_overwrites() {
        let mut board = Board::default();
        board.place_at(sym("car.png"), 0).unwrap();

        let mut session = DragSession::default();
        session.begin(DragPayload::Catalog(sym("bath.png")), Point::ZERO);
        session.drop(&[DropTarget::Cell(0)], &mut board);

        assert_eq!(id_at(&board, 0), Some("bath"));
        assert_eq!(board.occupied_count(), 1);
    }

    #[test]
    fn test_placed_drop_swaps() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        board.place_at(sym("car.png"), 1).unwrap();

        let mut session = DragSession::default();
        session.begin(
            DragPayload::Placed {
                symbol: sym("bath.png"),
                origin: 0,
            },
            Point::ZERO,
        );
        let outcome = session.drop(&[DropTarget::Cell(1)], &mut board);

        assert_eq!(outcome, DropOutcome::Moved { from: 0, to: 1 });
        assert_eq!(id_at(&board, 0), Some("car"));
        assert_eq!(id_at(&board, 1), Some("bath"));
    }

    #[test]
    fn test_placed_drop_on_origin_is_noop() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 2).unwrap();
        let before = board.clone();

        let mut session = DragSession::default();
        session.begin(
            DragPayload::Placed {
                symbol: sym("bath.png"),
                origin: 2,
            },
            Point::ZERO,
        );
        let outcome = session.drop(&[DropTarget::Cell(2)], &mut board);

        assert_eq!(outcome, DropOutcome::SameCell(2));
        assert!(!outcome.mutated());
        assert_eq!(board, before);
    }

    #[test]
    fn test_innermost_target_consumes_drop() {
        let mut board = Board::default();
        let mut session = DragSession::default();
        session.begin(DragPayload::Catalog(sym("bath.png")), Point::ZERO);

        let outcome = session.drop(
            &[DropTarget::Cell(3), DropTarget::Cell(7), DropTarget::Page],
            &mut board,
        );

        assert_eq!(outcome, DropOutcome::Placed { index: 3 });
        assert_eq!(board.occupied_count(), 1);
        assert!(board.slot(7).is_none());
    }

    #[test]
    fn test_drop_outside_targets() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 0).unwrap();
        let before = board.clone();

        let mut session = DragSession::default();
        session.begin(
            DragPayload::Placed {
                symbol: sym("bath.png"),
                origin: 0,
            },
            Point::ZERO,
        );
        assert_eq!(
            session.drop(&[DropTarget::Page], &mut board),
            DropOutcome::NoTarget
        );
        assert_eq!(board, before);

        // no payload at all
        assert_eq!(
            session.drop(&[DropTarget::Cell(0)], &mut board),
            DropOutcome::NoTarget
        );
    }

    #[test]
    fn test_stale_origin_is_rejected() {
        let mut board = Board::new(3, 2);
        let before = board.clone();
        let mut session = DragSession::default();
        session.begin(
            DragPayload::Placed {
                symbol: sym("bath.png"),
                origin: 9,
            },
            Point::ZERO,
        );

        let outcome = session.drop(&[DropTarget::Cell(1)], &mut board);
        assert!(matches!(
            outcome,
            DropOutcome::Rejected(BoardError::OutOfRange { index: 9, .. })
        ));
        assert_eq!(board, before);
    }

    #[test]
    fn test_hover_and_pointer() {
        let mut session = DragSession::default();
        assert!(!session.drag_over(Some(1)));

        session.begin(DragPayload::Catalog(sym("bath.png")), Point::new(1.0, 2.0));
        assert!(session.drag_over(Some(1)));
        assert!(!session.drag_over(Some(1)));
        assert_eq!(session.hover(), Some(1));

        session.update_pointer(Point::new(5.0, 6.0));
        assert_eq!(session.pointer(), Some(Point::new(5.0, 6.0)));

        assert!(session.cancel().is_some());
        assert_eq!(session.hover(), None);
        assert!(session.cancel().is_none());
    }

    #[test]
    fn test_activate_twice_removes() {
        let mut board = Board::default();
        board.place_at(sym("bath.png"), 5).unwrap();

        let removed = activate_twice(&mut board, 5).unwrap();
        assert_eq!(removed.unwrap().id, "bath");
        assert!(board.is_empty());

        assert_eq!(activate_twice(&mut board, 5), Ok(None));
    }

    #[test]
    fn test_press_tracker_threshold() {
        let mut tracker = PressTracker::new();
        assert_eq!(tracker.update(Point::new(100.0, 100.0)), None);

        tracker.press(3, Point::new(10.0, 10.0));
        assert_eq!(tracker.update(Point::new(12.0, 11.0)), None);
        assert!(tracker.is_pressed());
        assert_eq!(tracker.update(Point::new(20.0, 10.0)), Some(3));
        assert!(!tracker.is_pressed());

        tracker.press(1, Point::ZERO);
        tracker.release();
        assert_eq!(tracker.update(Point::new(50.0, 50.0)), None);
    }
}
