//! Square sets and piece placement backing
//! [`crate::chess::position::Position`].
//!
//! A [Bitboard] packs one bit per square into a `u64`, so set operations on
//! squares (attacks, occupancy, legal targets of a selected piece) are single
//! integer instructions.
//!
//! [Bitboard]: https://www.chessprogramming.org/Bitboards

use std::fmt::{self, Write};
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, Not, Sub, SubAssign};

use itertools::Itertools;

use crate::chess::core::{
    Direction,
    File,
    Piece,
    PieceKind,
    Player,
    Rank,
    Square,
    BOARD_SIZE,
    BOARD_WIDTH,
};

/// A set of squares stored as a [u64] mask.
///
/// Bit `i` is set when the square with index `i` is in the set, so bit 0 is
/// A1 and bit 63 is H8, the same order as [`Square`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Bitboard {
    bits: u64,
}

impl Bitboard {
    /// Wraps raw bits without any checks.
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self { bits }
    }

    /// No squares.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_bits(0)
    }

    /// Every square of the board.
    #[must_use]
    pub const fn full() -> Self {
        Self::from_bits(u64::MAX)
    }

    /// Returns raw bits.
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.bits
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn from_squares(squares: &[Square]) -> Self {
        squares.iter().copied().collect()
    }

    /// Adds given square to the set.
    pub fn extend(&mut self, square: Square) {
        *self |= Self::from(square);
    }

    /// Whether `square` is in the set.
    #[must_use]
    pub const fn contains(self, square: Square) -> bool {
        (self.bits & (1u64 << square as u8)) != 0
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.bits.count_ones()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn has_any(self) -> bool {
        !self.is_empty()
    }

    /// Returns the least significant set square, if any. Convenient for
    /// bitboards known to hold a single square (e.g. the king).
    #[must_use]
    pub fn first(self) -> Option<Square> {
        self.iter().next()
    }

    /// Squares in the set, from A1 towards H8.
    #[must_use]
    pub const fn iter(self) -> BitboardIterator {
        BitboardIterator { bits: self.bits }
    }

    /// All eight squares of `rank`.
    #[must_use]
    pub const fn rank_mask(rank: Rank) -> Self {
        match rank {
            Rank::One => Self::from_bits(0x0000_0000_0000_00FF),
            Rank::Two => Self::from_bits(0x0000_0000_0000_FF00),
            Rank::Three => Self::from_bits(0x0000_0000_00FF_0000),
            Rank::Four => Self::from_bits(0x0000_0000_FF00_0000),
            Rank::Five => Self::from_bits(0x0000_00FF_0000_0000),
            Rank::Six => Self::from_bits(0x0000_FF00_0000_0000),
            Rank::Seven => Self::from_bits(0x00FF_0000_0000_0000),
            Rank::Eight => Self::from_bits(0xFF00_0000_0000_0000),
        }
    }

    /// All eight squares of `file`.
    #[must_use]
    pub const fn file_mask(file: File) -> Self {
        Self::from_bits(0x0101_0101_0101_0101 << file as u8)
    }

    /// All light squares of the board (h1 is light).
    #[must_use]
    pub const fn light_squares() -> Self {
        Self::from_bits(0x55AA_55AA_55AA_55AA)
    }

    /// Moves every square of the set one step in the given direction. Squares
    /// that would leave the board are dropped.
    #[must_use]
    pub fn shift(self, direction: Direction) -> Self {
        self.iter().filter_map(|square| square.shift(direction)).collect()
    }
}

impl fmt::Debug for Bitboard {
    /// Dumps the set as an 8x8 grid: '1' for squares in the set, '.' for the
    /// rest, rank 8 at the top.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dump = Rank::iter()
            .rev()
            .map(|rank| {
                File::iter()
                    .map(|file| {
                        if self.contains(Square::new(file, rank)) {
                            '1'
                        } else {
                            '.'
                        }
                    })
                    .join(SQUARE_SEPARATOR)
            })
            .join(LINE_SEPARATOR);
        f.write_str(&dump)
    }
}

impl BitOr for Bitboard {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitor(rhs.bits))
    }
}

impl BitOrAssign for Bitboard {
    fn bitor_assign(&mut self, rhs: Self) {
        self.bits.bitor_assign(rhs.bits);
    }
}

impl BitAnd for Bitboard {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitand(rhs.bits))
    }
}

impl BitAndAssign for Bitboard {
    fn bitand_assign(&mut self, rhs: Self) {
        self.bits.bitand_assign(rhs.bits);
    }
}

impl BitXor for Bitboard {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.bits.bitxor(rhs.bits))
    }
}

impl Sub for Bitboard {
    type Output = Self;

    /// Squares of `self` that are not in `rhs`.
    fn sub(self, rhs: Self) -> Self::Output {
        self & !rhs
    }
}

impl SubAssign for Bitboard {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Not for Bitboard {
    type Output = Self;

    /// Squares that are not in the set.
    fn not(self) -> Self::Output {
        Self::from_bits(!self.bits)
    }
}

impl From<Square> for Bitboard {
    fn from(square: Square) -> Self {
        Self::from_bits(1u64 << square as u8)
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        let mut result = Self::empty();
        for square in iter {
            result.extend(square);
        }
        result
    }
}

impl IntoIterator for Bitboard {
    type IntoIter = BitboardIterator;
    type Item = Square;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Yields the squares of a [Bitboard] in index order using a forward
/// [BitScan].
///
/// [BitScan]: https://www.chessprogramming.org/BitScan
pub struct BitboardIterator {
    bits: u64,
}

impl Iterator for BitboardIterator {
    type Item = Square;

    fn next(&mut self) -> Option<Self::Item> {
        if self.bits == 0 {
            return None;
        }
        // Pop the lowest set bit.
        let next_index = self.bits.trailing_zeros();
        self.bits ^= 1 << next_index;
        // trailing_zeros() of a non-zero u64 is always within 0..BOARD_SIZE.
        Some(Square::ALL[next_index as usize])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.bits.count_ones() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for BitboardIterator {}

/// Squares of one player's material, one [Bitboard] per piece kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(super) struct Pieces {
    pub(super) king: Bitboard,
    pub(super) queens: Bitboard,
    pub(super) rooks: Bitboard,
    pub(super) bishops: Bitboard,
    pub(super) knights: Bitboard,
    pub(super) pawns: Bitboard,
}

impl Pieces {
    pub(super) const fn empty() -> Self {
        Self {
            king: Bitboard::empty(),
            queens: Bitboard::empty(),
            rooks: Bitboard::empty(),
            bishops: Bitboard::empty(),
            knights: Bitboard::empty(),
            pawns: Bitboard::empty(),
        }
    }

    pub(super) fn new_white() -> Self {
        Self {
            king: Square::E1.into(),
            queens: Square::D1.into(),
            rooks: Bitboard::from_squares(&[Square::A1, Square::H1]),
            bishops: Bitboard::from_squares(&[Square::C1, Square::F1]),
            knights: Bitboard::from_squares(&[Square::B1, Square::G1]),
            pawns: Bitboard::rank_mask(Rank::Two),
        }
    }

    pub(super) fn new_black() -> Self {
        Self {
            king: Square::E8.into(),
            queens: Square::D8.into(),
            rooks: Bitboard::from_squares(&[Square::A8, Square::H8]),
            bishops: Bitboard::from_squares(&[Square::C8, Square::F8]),
            knights: Bitboard::from_squares(&[Square::B8, Square::G8]),
            pawns: Bitboard::rank_mask(Rank::Seven),
        }
    }

    pub(super) fn all(&self) -> Bitboard {
        self.king | self.queens | self.rooks | self.bishops | self.knights | self.pawns
    }

    pub(super) const fn bitboard_for(&self, kind: PieceKind) -> Bitboard {
        match kind {
            PieceKind::King => self.king,
            PieceKind::Queen => self.queens,
            PieceKind::Rook => self.rooks,
            PieceKind::Bishop => self.bishops,
            PieceKind::Knight => self.knights,
            PieceKind::Pawn => self.pawns,
        }
    }

    pub(super) fn bitboard_for_mut(&mut self, kind: PieceKind) -> &mut Bitboard {
        match kind {
            PieceKind::King => &mut self.king,
            PieceKind::Queen => &mut self.queens,
            PieceKind::Rook => &mut self.rooks,
            PieceKind::Bishop => &mut self.bishops,
            PieceKind::Knight => &mut self.knights,
            PieceKind::Pawn => &mut self.pawns,
        }
    }

    pub(super) fn at(&self, square: Square) -> Option<PieceKind> {
        PieceKind::ALL
            .into_iter()
            .find(|kind| self.bitboard_for(*kind).contains(square))
    }

    /// Removes whatever piece stands on the square.
    pub(super) fn clear(&mut self, square: Square) {
        let mask = Bitboard::from(square);
        for kind in PieceKind::ALL {
            *self.bitboard_for_mut(kind) -= mask;
        }
    }

    /// Iterates over piece kinds and the squares they occupy.
    pub(super) fn iter(&self) -> impl Iterator<Item = (PieceKind, Bitboard)> + '_ {
        PieceKind::ALL
            .into_iter()
            .map(|kind| (kind, self.bitboard_for(kind)))
    }
}

/// Piece-centric implementation of the chess board. The square-centric
/// queries (`at`) are slower than with a mailbox representation but the board
/// only needs them once per rendered square.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub(super) struct Board {
    pub(super) white_pieces: Pieces,
    pub(super) black_pieces: Pieces,
}

impl Board {
    #[must_use]
    pub(super) fn starting() -> Self {
        Self {
            white_pieces: Pieces::new_white(),
            black_pieces: Pieces::new_black(),
        }
    }

    // Filled square by square while parsing piece placement.
    #[must_use]
    pub(super) const fn empty() -> Self {
        Self {
            white_pieces: Pieces::empty(),
            black_pieces: Pieces::empty(),
        }
    }

    #[must_use]
    pub(super) const fn player_pieces(&self, player: Player) -> &Pieces {
        match player {
            Player::White => &self.white_pieces,
            Player::Black => &self.black_pieces,
        }
    }

    pub(super) fn player_pieces_mut(&mut self, player: Player) -> &mut Pieces {
        match player {
            Player::White => &mut self.white_pieces,
            Player::Black => &mut self.black_pieces,
        }
    }

    #[must_use]
    pub(super) fn occupied(&self) -> Bitboard {
        self.white_pieces.all() | self.black_pieces.all()
    }

    #[must_use]
    pub(super) fn at(&self, square: Square) -> Option<Piece> {
        if let Some(kind) = self.white_pieces.at(square) {
            return Some(Piece::new(Player::White, kind));
        }
        self.black_pieces
            .at(square)
            .map(|kind| Piece::new(Player::Black, kind))
    }

    pub(super) fn put(&mut self, square: Square, piece: Piece) {
        self.player_pieces_mut(piece.owner)
            .bitboard_for_mut(piece.kind)
            .extend(square);
    }
}

impl fmt::Display for Board {
    /// Piece placement field of FEN.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            let mut empty_squares = 0i32;
            for file in File::iter() {
                let square = Square::new(file, rank);
                if let Some(piece) = self.at(square) {
                    if empty_squares != 0 {
                        write!(f, "{empty_squares}")?;
                        empty_squares = 0;
                    }
                    write!(f, "{piece}")?;
                } else {
                    empty_squares += 1;
                }
            }
            if empty_squares != 0 {
                write!(f, "{empty_squares}")?;
            }
            if rank != Rank::One {
                const RANK_SEPARATOR: char = '/';
                f.write_char(RANK_SEPARATOR)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    /// Eight lines of FEN piece symbols, `.` for empty squares, rank 8 first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                match self.at(Square::new(file, rank)) {
                    Some(piece) => write!(f, "{piece}"),
                    None => f.write_char('.'),
                }?;
                if file != File::H {
                    f.write_str(SQUARE_SEPARATOR)?;
                }
            }
            if rank != Rank::One {
                f.write_str(LINE_SEPARATOR)?;
            }
        }
        Ok(())
    }
}

const LINE_SEPARATOR: &str = "\n";
const SQUARE_SEPARATOR: &str = " ";

const _: () = assert!(BOARD_SIZE == BOARD_WIDTH * BOARD_WIDTH);
