//! The interactive board controller: turns clicks and drag-and-drop gestures
//! into moves, keeps track of the selected piece and decides which squares
//! should be highlighted.
//!
//! The controller holds exactly one position and no history. Every accepted
//! move replaces the position with the one produced by the rules engine, every
//! rejected move leaves it untouched and only resets the transient state
//! (selection and drag targets).

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{Move, Player, Square};
use crate::chess::position::{GameStatus, IllegalMove, Position};
use crate::rules::Rules;
use crate::view::{self, Effects, Orientation};

/// The piece picked up by a click together with the squares it can move to.
/// The targets are computed once, when the piece is selected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    #[allow(missing_docs)]
    pub square: Square,
    #[allow(missing_docs)]
    pub targets: Bitboard,
}

/// Origin and destination of the most recently applied move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LastMove {
    #[allow(missing_docs)]
    pub from: Square,
    #[allow(missing_docs)]
    pub to: Square,
}

/// Legal targets of the piece being dragged, shown while the drag is in
/// progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DragState {
    #[allow(missing_docs)]
    pub from: Square,
    #[allow(missing_docs)]
    pub targets: Bitboard,
}

/// What a click did to the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A piece of the side to move is now selected.
    Selected,
    /// The selected square was clicked again and the selection is gone.
    Deselected,
    /// The click completed a move.
    Moved(LastMove),
    /// The click targeted a highlighted square but the rules rejected the
    /// move. The selection is cleared.
    Rejected(IllegalMove),
    /// Nothing changed.
    Ignored,
}

/// Interactive chessboard state machine. Generic over the rules engine so
/// that the interaction logic does not depend on how the moves are computed.
#[derive(Clone, Debug)]
pub struct Controller<P: Rules = Position> {
    position: P,
    selection: Option<Selection>,
    drag: Option<DragState>,
    last_move: Option<LastMove>,
    orientation: Orientation,
}

impl<P: Rules> Default for Controller<P> {
    fn default() -> Self {
        Self::new(P::starting())
    }
}

impl<P: Rules> Controller<P> {
    /// Creates a controller showing the given position with White at the
    /// bottom and nothing highlighted.
    #[must_use]
    pub fn new(position: P) -> Self {
        Self {
            position,
            selection: None,
            drag: None,
            last_move: None,
            orientation: Orientation::WhiteBottom,
        }
    }

    /// Restores the board from a FEN string, e.g. one produced by
    /// [`Controller::fen`] before a page refresh.
    ///
    /// # Errors
    ///
    /// If the FEN is malformed or describes an illegal position.
    pub fn from_fen(fen: &str) -> anyhow::Result<Self> {
        Ok(Self::new(P::from_fen(fen)?))
    }

    /// Sets the initial orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn position(&self) -> &P {
        &self.position
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// The player whose turn it is, shown in the turn indicator.
    #[must_use]
    pub fn side_to_move(&self) -> Player {
        self.position.side_to_move()
    }

    /// Current position in Forsyth-Edwards Notation.
    #[must_use]
    pub fn fen(&self) -> String {
        self.position.fen()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// Visual effects of all highlighted squares for the current state.
    #[must_use]
    pub fn highlights(&self) -> BTreeMap<Square, Effects> {
        view::highlights(
            &self.position,
            self.last_move,
            self.selection.as_ref(),
            self.drag.as_ref(),
        )
    }

    /// Handles a click on a square:
    ///
    /// 1. Clicking the selected square again clears the selection.
    /// 2. Clicking a piece of the side to move selects it (replacing any
    ///    previous selection).
    /// 3. Clicking one of the selected piece's targets plays the move. The
    ///    selection is cleared whether the move is accepted or not.
    /// 4. Any other click is ignored and the selection stays.
    pub fn select_square(&mut self, square: Square) -> SelectOutcome {
        if let Some(selection) = self.selection {
            if selection.square == square {
                debug!(%square, "selection cleared");
                self.selection = None;
                return SelectOutcome::Deselected;
            }
        }
        if self
            .position
            .piece_at(square)
            .is_some_and(|piece| piece.owner == self.position.side_to_move())
        {
            let targets = self.position.legal_targets(square);
            debug!(%square, targets = targets.count(), "piece selected");
            self.selection = Some(Selection { square, targets });
            return SelectOutcome::Selected;
        }
        match self.selection {
            Some(selection) if selection.targets.contains(square) => {
                self.selection = None;
                match self.attempt(selection.square, square) {
                    Ok(last_move) => SelectOutcome::Moved(last_move),
                    Err(error) => SelectOutcome::Rejected(error),
                }
            },
            _ => {
                debug!(%square, "click ignored");
                SelectOutcome::Ignored
            },
        }
    }

    /// Starts dragging the piece on `square` and returns the squares it can be
    /// dropped on. Dragging an empty square or a piece of the player who is
    /// not on move yields no targets. The selection is not affected.
    pub fn begin_drag(&mut self, square: Square) -> Bitboard {
        let targets = self.position.legal_targets(square);
        debug!(%square, targets = targets.count(), "drag started");
        self.drag = Some(DragState {
            from: square,
            targets,
        });
        targets
    }

    /// Ends the drag without dropping the piece anywhere.
    pub fn end_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            debug!(from = %drag.from, "drag ended");
        }
    }

    /// Drops the piece dragged from `from` onto `to`. A pawn reaching the last
    /// rank is promoted to a queen. Selection and drag state are cleared
    /// regardless of the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMove`] if the rules reject the move; the position stays
    /// the same and the dragged piece should snap back.
    pub fn drop_piece(&mut self, from: Square, to: Square) -> Result<LastMove, IllegalMove> {
        self.selection = None;
        self.drag = None;
        self.attempt(from, to)
    }

    /// Turns the board around. Selection and drag state are cleared.
    pub fn flip_orientation(&mut self) -> Orientation {
        self.orientation = self.orientation.flipped();
        self.selection = None;
        self.drag = None;
        debug!(orientation = %self.orientation, "board flipped");
        self.orientation
    }

    fn attempt(&mut self, from: Square, to: Square) -> Result<LastMove, IllegalMove> {
        let next_move = Move::with_auto_queen(self.position.piece_at(from), from, to);
        match self.position.play(next_move) {
            Ok(position) => {
                self.position = position;
                let last_move = LastMove { from, to };
                self.last_move = Some(last_move);
                info!(%next_move, fen = %self.position.fen(), "move played");
                Ok(last_move)
            },
            Err(error) => {
                debug!(%error, "move rejected");
                Err(error)
            },
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chess::position::Rejection;

    fn square(name: &str) -> Square {
        Square::try_from(name).unwrap()
    }

    #[test]
    fn click_to_move() {
        let mut controller = Controller::<Position>::default();
        assert_eq!(controller.select_square(square("e2")), SelectOutcome::Selected);
        assert_eq!(
            controller.selection(),
            Some(&Selection {
                square: Square::E2,
                targets: Bitboard::from_squares(&[Square::E3, Square::E4]),
            })
        );
        let last_move = LastMove {
            from: Square::E2,
            to: Square::E4,
        };
        assert_eq!(
            controller.select_square(square("e4")),
            SelectOutcome::Moved(last_move)
        );
        assert_eq!(controller.selection(), None);
        assert_eq!(controller.last_move(), Some(last_move));
        assert_eq!(controller.side_to_move(), Player::Black);
        assert_eq!(
            controller.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
        assert_eq!(
            controller.highlights(),
            BTreeMap::from([
                (Square::E2, Effects::RECENT_MOVE),
                (Square::E4, Effects::RECENT_MOVE),
            ])
        );
    }

    #[test]
    fn click_same_square_deselects() {
        let mut controller = Controller::<Position>::default();
        assert_eq!(controller.select_square(Square::G1), SelectOutcome::Selected);
        assert_eq!(controller.select_square(Square::G1), SelectOutcome::Deselected);
        assert_eq!(controller.selection(), None);
        assert!(controller.highlights().is_empty());
    }

    #[test]
    fn click_opponent_piece_is_ignored() {
        let mut controller = Controller::<Position>::default();
        let _ = controller.select_square(Square::E2);
        let before = *controller.position();
        assert_eq!(controller.select_square(Square::A7), SelectOutcome::Ignored);
        assert_eq!(
            controller.selection().map(|selection| selection.square),
            Some(Square::E2)
        );
        assert_eq!(*controller.position(), before);
        // Without a selection, clicks on opponent pieces and empty squares do
        // nothing either.
        let mut controller = Controller::<Position>::default();
        assert_eq!(controller.select_square(Square::A7), SelectOutcome::Ignored);
        assert_eq!(controller.select_square(Square::E4), SelectOutcome::Ignored);
        assert_eq!(controller.selection(), None);
    }

    #[test]
    fn click_another_piece_switches_selection() {
        let mut controller = Controller::<Position>::default();
        let _ = controller.select_square(Square::E2);
        assert_eq!(controller.select_square(Square::B1), SelectOutcome::Selected);
        assert_eq!(
            controller.selection(),
            Some(&Selection {
                square: Square::B1,
                targets: Bitboard::from_squares(&[Square::A3, Square::C3]),
            })
        );
        // A square that is not a target keeps the selection.
        assert_eq!(controller.select_square(Square::B3), SelectOutcome::Ignored);
        assert_eq!(
            controller.selection().map(|selection| selection.square),
            Some(Square::B1)
        );
    }

    #[test]
    fn illegal_drop_keeps_position() {
        let mut controller = Controller::<Position>::default();
        let _ = controller.select_square(Square::D2);
        let before = controller.fen();
        let error = controller.drop_piece(Square::E2, Square::E5).unwrap_err();
        assert_eq!(error.reason, Rejection::Unreachable);
        assert_eq!(controller.fen(), before);
        assert_eq!(controller.selection(), None);
        assert_eq!(controller.drag(), None);
        assert_eq!(controller.last_move(), None);
        assert_eq!(controller.side_to_move(), Player::White);
    }

    #[test]
    fn drag_and_drop() {
        let mut controller = Controller::<Position>::default();
        let _ = controller.select_square(Square::E2);
        assert_eq!(
            controller.begin_drag(Square::G1),
            Bitboard::from_squares(&[Square::F3, Square::H3])
        );
        // Drag does not touch the selection.
        assert_eq!(
            controller.selection().map(|selection| selection.square),
            Some(Square::E2)
        );
        assert_eq!(
            controller.drop_piece(Square::G1, Square::F3),
            Ok(LastMove {
                from: Square::G1,
                to: Square::F3,
            })
        );
        assert_eq!(controller.selection(), None);
        assert_eq!(controller.drag(), None);
        assert_eq!(controller.side_to_move(), Player::Black);
        assert_eq!(
            controller.highlights(),
            BTreeMap::from([
                (Square::G1, Effects::RECENT_MOVE),
                (Square::F3, Effects::RECENT_MOVE),
            ])
        );
    }

    #[test]
    fn rejected_move_keeps_last_move() {
        let mut controller = Controller::<Position>::default();
        let played = controller.drop_piece(Square::E2, Square::E4).unwrap();
        assert_eq!(
            controller.drop_piece(Square::E4, Square::E5).unwrap_err().reason,
            Rejection::NotYourTurn
        );
        let _ = controller.select_square(Square::D7);
        assert_eq!(controller.select_square(Square::D4), SelectOutcome::Ignored);
        assert_eq!(controller.last_move(), Some(played));
        assert_eq!(
            controller.highlights().get(&Square::E4),
            Some(&Effects::RECENT_MOVE)
        );
    }

    #[test]
    fn drag_without_targets() {
        let mut controller = Controller::<Position>::default();
        assert!(controller.begin_drag(Square::E4).is_empty());
        assert!(controller.begin_drag(Square::E7).is_empty());
        assert!(controller.highlights().is_empty());
        controller.end_drag();
        assert_eq!(controller.drag(), None);
    }

    #[test]
    fn flip_clears_transient_state() {
        let mut controller = Controller::<Position>::default();
        let _ = controller.select_square(Square::E2);
        let _ = controller.begin_drag(Square::G1);
        assert_eq!(controller.flip_orientation(), Orientation::BlackBottom);
        assert_eq!(controller.selection(), None);
        assert_eq!(controller.drag(), None);
        assert_eq!(controller.flip_orientation(), Orientation::WhiteBottom);
        assert_eq!(
            controller.fen(),
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn auto_queen() {
        let mut controller =
            Controller::<Position>::from_fen("8/1P3k2/8/8/8/8/5K2/8 w - - 0 1").unwrap();
        let _ = controller.select_square(Square::B7);
        assert!(matches!(
            controller.select_square(Square::B8),
            SelectOutcome::Moved(_)
        ));
        assert_eq!(controller.fen(), "1Q6/5k2/8/8/8/8/5K2/8 b - - 0 1");
    }

    #[test]
    fn castling_by_drag() {
        let mut controller =
            Controller::<Position>::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        assert!(controller.begin_drag(Square::E1).contains(Square::G1));
        assert!(controller.drop_piece(Square::E1, Square::G1).is_ok());
        assert_eq!(controller.fen(), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1");
        assert!(controller.drop_piece(Square::E8, Square::C8).is_ok());
        assert_eq!(controller.fen(), "2kr3r/8/8/8/8/8/8/R4RK1 w - - 2 2");
    }

    #[test]
    fn game_over() {
        let mut controller = Controller::<Position>::default();
        for (from, to) in [
            (Square::F2, Square::F3),
            (Square::E7, Square::E5),
            (Square::G2, Square::G4),
            (Square::D8, Square::H4),
        ] {
            assert!(controller.drop_piece(from, to).is_ok());
        }
        assert_eq!(
            controller.status(),
            GameStatus::Checkmate {
                winner: Player::Black
            }
        );
        // No piece has anywhere to go.
        assert_eq!(controller.select_square(Square::E1), SelectOutcome::Selected);
        assert!(controller
            .selection()
            .is_some_and(|selection| selection.targets.is_empty()));
    }

    #[test]
    fn invalid_fen() {
        assert!(Controller::<Position>::from_fen("not a position").is_err());
        assert!(Controller::<Position>::from_fen("8/8/8/8/8/8/8/8 w - - 0 1").is_err());
    }
}
