//! Mappings of occupied squares to the attacked squares for each piece. Leaper
//! attacks (king, knight, pawn) are pre-calculated at compile time, slider
//! attacks are computed by walking the rays until the first blocker.

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{Direction, Player, Square, BOARD_SIZE};

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
];

const WHITE_PAWN_DELTAS: [(i8, i8); 2] = [(-1, 1), (1, 1)];
const BLACK_PAWN_DELTAS: [(i8, i8); 2] = [(-1, -1), (1, -1)];

const fn leaper_attacks<const N: usize>(deltas: [(i8, i8); N]) -> [Bitboard; BOARD_SIZE as usize] {
    let mut result = [Bitboard::empty(); BOARD_SIZE as usize];
    let mut index = 0;
    while index < BOARD_SIZE as usize {
        let mut bits = 0u64;
        let mut delta = 0;
        while delta < N {
            if let Some(target) = Square::ALL[index].offset(deltas[delta].0, deltas[delta].1) {
                bits |= 1u64 << target as u8;
            }
            delta += 1;
        }
        result[index] = Bitboard::from_bits(bits);
        index += 1;
    }
    result
}

/// Pre-calculated attacks of a knight from each square.
pub(super) const KNIGHT_ATTACKS: [Bitboard; BOARD_SIZE as usize] = leaper_attacks(KNIGHT_DELTAS);
/// Pre-calculated attacks of a king from each square.
pub(super) const KING_ATTACKS: [Bitboard; BOARD_SIZE as usize] = leaper_attacks(KING_DELTAS);
const WHITE_PAWN_ATTACKS: [Bitboard; BOARD_SIZE as usize] = leaper_attacks(WHITE_PAWN_DELTAS);
const BLACK_PAWN_ATTACKS: [Bitboard; BOARD_SIZE as usize] = leaper_attacks(BLACK_PAWN_DELTAS);

/// Squares a pawn of `player` standing on `square` attacks (captures to).
pub(super) const fn pawn_attacks(square: Square, player: Player) -> Bitboard {
    match player {
        Player::White => WHITE_PAWN_ATTACKS[square as usize],
        Player::Black => BLACK_PAWN_ATTACKS[square as usize],
    }
}

const BISHOP_DIRECTIONS: [Direction; 4] = [
    Direction::UpLeft,
    Direction::UpRight,
    Direction::DownLeft,
    Direction::DownRight,
];

const ROOK_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

fn ray_attacks(square: Square, occupancy: Bitboard, directions: [Direction; 4]) -> Bitboard {
    let mut attacks = Bitboard::empty();
    for direction in directions {
        let mut current = square;
        while let Some(next) = current.shift(direction) {
            attacks.extend(next);
            if occupancy.contains(next) {
                break;
            }
            current = next;
        }
    }
    attacks
}

/// Squares a bishop on `square` attacks given the board occupancy. The first
/// blocker in each direction is included.
pub(super) fn bishop_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    ray_attacks(square, occupancy, BISHOP_DIRECTIONS)
}

/// Squares a rook on `square` attacks given the board occupancy.
pub(super) fn rook_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    ray_attacks(square, occupancy, ROOK_DIRECTIONS)
}

pub(super) fn queen_attacks(square: Square, occupancy: Bitboard) -> Bitboard {
    bishop_attacks(square, occupancy) | rook_attacks(square, occupancy)
}

/// Squares strictly between the king and the rook that must be empty for the
/// castle, and the squares the king walks through (including the destination)
/// that must not be attacked.
#[derive(Clone, Copy)]
pub(super) struct CastleWalk {
    pub(super) king_from: Square,
    pub(super) king_to: Square,
    pub(super) rook_from: Square,
    pub(super) rook_to: Square,
    pub(super) must_be_empty: Bitboard,
    pub(super) must_be_safe: Bitboard,
}

pub(super) const WHITE_SHORT_CASTLE: CastleWalk = CastleWalk {
    king_from: Square::E1,
    king_to: Square::G1,
    rook_from: Square::H1,
    rook_to: Square::F1,
    must_be_empty: Bitboard::from_bits(0b0110_0000),
    must_be_safe: Bitboard::from_bits(0b0110_0000),
};

pub(super) const WHITE_LONG_CASTLE: CastleWalk = CastleWalk {
    king_from: Square::E1,
    king_to: Square::C1,
    rook_from: Square::A1,
    rook_to: Square::D1,
    must_be_empty: Bitboard::from_bits(0b0000_1110),
    must_be_safe: Bitboard::from_bits(0b0000_1100),
};

pub(super) const BLACK_SHORT_CASTLE: CastleWalk = CastleWalk {
    king_from: Square::E8,
    king_to: Square::G8,
    rook_from: Square::H8,
    rook_to: Square::F8,
    must_be_empty: Bitboard::from_bits(0b0110_0000 << 56),
    must_be_safe: Bitboard::from_bits(0b0110_0000 << 56),
};

pub(super) const BLACK_LONG_CASTLE: CastleWalk = CastleWalk {
    king_from: Square::E8,
    king_to: Square::C8,
    rook_from: Square::A8,
    rook_to: Square::D8,
    must_be_empty: Bitboard::from_bits(0b0000_1110 << 56),
    must_be_safe: Bitboard::from_bits(0b0000_1100 << 56),
};
