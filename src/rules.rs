//! Interface between the board controller and the chess rules implementation.
//! The controller never inspects the board itself: it asks the rules which
//! squares a piece can reach and hands moves over to be played.

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{Move, Piece, Player, Square};
use crate::chess::position::{GameStatus, IllegalMove, Position};

/// Rules engine contract. Implementors are immutable values: playing a move
/// returns a new position and leaves the receiver untouched, including on
/// rejection.
pub trait Rules: Sized {
    /// The standard starting position.
    fn starting() -> Self;

    /// Parses the position from Forsyth-Edwards Notation.
    ///
    /// # Errors
    ///
    /// If the input is not a valid FEN of a legal position.
    fn from_fen(fen: &str) -> anyhow::Result<Self>;

    /// Serializes the position to Forsyth-Edwards Notation.
    fn fen(&self) -> String;

    #[allow(missing_docs)]
    fn side_to_move(&self) -> Player;

    #[allow(missing_docs)]
    fn piece_at(&self, square: Square) -> Option<Piece>;

    /// Squares the piece on `from` can legally move to. Empty if there is no
    /// piece of the side to move on `from`.
    fn legal_targets(&self, from: Square) -> Bitboard;

    /// Produces the position after the move.
    ///
    /// # Errors
    ///
    /// If the move is not legal in this position.
    fn play(&self, next_move: Move) -> Result<Self, IllegalMove>;

    #[allow(missing_docs)]
    fn status(&self) -> GameStatus;
}

impl Rules for Position {
    fn starting() -> Self {
        Self::starting()
    }

    fn from_fen(fen: &str) -> anyhow::Result<Self> {
        Self::try_from(fen)
    }

    fn fen(&self) -> String {
        self.fen()
    }

    fn side_to_move(&self) -> Player {
        self.us()
    }

    fn piece_at(&self, square: Square) -> Option<Piece> {
        self.at(square)
    }

    fn legal_targets(&self, from: Square) -> Bitboard {
        self.legal_targets(from)
    }

    fn play(&self, next_move: Move) -> Result<Self, IllegalMove> {
        self.make_move(next_move)
    }

    fn status(&self) -> GameStatus {
        self.status()
    }
}
