//! Implementation of chess environment, its rules and specifics: the rules
//! engine the board controller consults for legal moves and new positions.

pub mod attacks;
pub mod bitboard;
pub mod core;
pub mod position;

pub use crate::chess::core::{Move, Piece, PieceKind, Player, Promotion, Square};
pub use crate::chess::position::{GameStatus, IllegalMove, Position, Rejection};
