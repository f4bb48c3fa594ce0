//! Derives what the board should look like from the controller state. Nothing
//! here is stored: the highlights are recomputed from scratch for every
//! render, so they can never go out of sync with the position.

use std::collections::BTreeMap;
use std::fmt::{self, Write};
use std::str::FromStr;

use anyhow::bail;
use itertools::Itertools;

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{File, Rank, Square};
use crate::controller::{DragState, LastMove, Selection};
use crate::rules::Rules;

bitflags::bitflags! {
    /// Visual layers applied to a single square. Several layers can be active
    /// at once, e.g. the last move landed on the square that is now selected.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Effects : u8 {
        /// The square is the origin or the destination of the last move.
        const RECENT_MOVE = 0b0001;
        /// The square holds the selected piece.
        const SELECTED = 0b0010;
        /// The selected or dragged piece can capture on this square.
        const CAPTURE_TARGET = 0b0100;
        /// The selected or dragged piece can move to this empty square.
        const QUIET_TARGET = 0b1000;
    }
}

impl fmt::Display for Effects {
    /// Compact descriptor such as `recent+selected`, `-` when no layer is
    /// active.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_char('-');
        }
        let names = [
            (Self::RECENT_MOVE, "recent"),
            (Self::SELECTED, "selected"),
            (Self::CAPTURE_TARGET, "capture"),
            (Self::QUIET_TARGET, "quiet"),
        ]
        .into_iter()
        .filter(|(flag, _)| self.contains(*flag))
        .map(|(_, name)| name)
        .join("+");
        f.write_str(&names)
    }
}

/// Which side of the board is drawn at the bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    /// White pieces start at the bottom, rank 1 is the last row.
    #[default]
    WhiteBottom,
    /// Black pieces start at the bottom, rank 8 is the last row.
    BlackBottom,
}

impl Orientation {
    /// The opposite orientation.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::WhiteBottom => Self::BlackBottom,
            Self::BlackBottom => Self::WhiteBottom,
        }
    }

    /// Ranks in the order they are drawn, top to bottom.
    pub fn ranks(self) -> impl Iterator<Item = Rank> {
        let mut ranks = Rank::ALL;
        if self == Self::WhiteBottom {
            ranks.reverse();
        }
        ranks.into_iter()
    }

    /// Files in the order they are drawn, left to right.
    pub fn files(self) -> impl Iterator<Item = File> {
        let mut files = File::ALL;
        if self == Self::BlackBottom {
            files.reverse();
        }
        files.into_iter()
    }
}

impl FromStr for Orientation {
    type Err = anyhow::Error;

    /// Accepts the color at the bottom of the board: `white` or `black`.
    fn from_str(input: &str) -> anyhow::Result<Self> {
        match input {
            "white" => Ok(Self::WhiteBottom),
            "black" => Ok(Self::BlackBottom),
            _ => bail!("orientation should be 'white' or 'black', got '{input}'"),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WhiteBottom => "white",
            Self::BlackBottom => "black",
        })
    }
}

/// Marks every target square as a capture if a piece of the other player
/// stands on it, and as a quiet move otherwise.
fn mark_targets<P: Rules>(
    position: &P,
    from: Square,
    targets: Bitboard,
    highlights: &mut BTreeMap<Square, Effects>,
) {
    let Some(moving) = position.piece_at(from) else {
        return;
    };
    for target in targets.iter() {
        let effect = match position.piece_at(target) {
            Some(occupant) if occupant.owner != moving.owner => Effects::CAPTURE_TARGET,
            _ => Effects::QUIET_TARGET,
        };
        *highlights.entry(target).or_insert(Effects::empty()) |= effect;
    }
}

/// Computes the visual effect of each highlighted square. Squares without any
/// effect are absent from the result.
#[must_use]
pub fn highlights<P: Rules>(
    position: &P,
    last_move: Option<LastMove>,
    selection: Option<&Selection>,
    drag: Option<&DragState>,
) -> BTreeMap<Square, Effects> {
    let mut highlights = BTreeMap::new();
    if let Some(last_move) = last_move {
        for square in [last_move.from, last_move.to] {
            *highlights.entry(square).or_insert(Effects::empty()) |= Effects::RECENT_MOVE;
        }
    }
    if let Some(selection) = selection {
        *highlights
            .entry(selection.square)
            .or_insert(Effects::empty()) |= Effects::SELECTED;
        mark_targets(position, selection.square, selection.targets, &mut highlights);
    }
    if let Some(drag) = drag {
        mark_targets(position, drag.from, drag.targets, &mut highlights);
    }
    highlights
}

/// Draws the board as text with rank and file labels. Pieces use FEN symbols,
/// `.` is an empty square. The selected square is wrapped in `[]`, the last
/// move in `()`, capture targets are prefixed with `x` and quiet targets are
/// drawn as `*`.
#[must_use]
pub fn render<P: Rules>(
    position: &P,
    orientation: Orientation,
    highlights: &BTreeMap<Square, Effects>,
) -> String {
    let mut rows = orientation
        .ranks()
        .map(|rank| {
            let cells: String = orientation
                .files()
                .map(|file| {
                    let square = Square::new(file, rank);
                    let effects = highlights.get(&square).copied().unwrap_or(Effects::empty());
                    render_square(position, square, effects)
                })
                .collect();
            format!("{rank} {cells}").trim_end().to_string()
        })
        .collect::<Vec<_>>();
    let labels: String = orientation.files().map(|file| format!(" {file} ")).collect();
    rows.push(format!("  {labels}").trim_end().to_string());
    rows.join("\n")
}

fn render_square<P: Rules>(position: &P, square: Square, effects: Effects) -> String {
    let symbol = match position.piece_at(square) {
        Some(piece) => piece.to_string(),
        None if effects.contains(Effects::QUIET_TARGET) => "*".to_string(),
        None => ".".to_string(),
    };
    let (left, right) = if effects.contains(Effects::SELECTED) {
        ('[', ']')
    } else if effects.contains(Effects::CAPTURE_TARGET) {
        ('x', ' ')
    } else if effects.contains(Effects::RECENT_MOVE) {
        ('(', ')')
    } else {
        (' ', ' ')
    };
    format!("{left}{symbol}{right}")
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chess::position::Position;

    fn selection(position: &Position, square: Square) -> Selection {
        Selection {
            square,
            targets: position.legal_targets(square),
        }
    }

    #[test]
    fn effects_display() {
        assert_eq!(Effects::empty().to_string(), "-");
        assert_eq!(Effects::QUIET_TARGET.to_string(), "quiet");
        assert_eq!(
            (Effects::RECENT_MOVE | Effects::SELECTED).to_string(),
            "recent+selected"
        );
    }

    #[test]
    fn orientation() {
        assert_eq!(
            Orientation::WhiteBottom.ranks().collect::<Vec<_>>(),
            Rank::iter().rev().collect::<Vec<_>>()
        );
        assert_eq!(
            Orientation::BlackBottom.files().collect::<Vec<_>>(),
            File::iter().rev().collect::<Vec<_>>()
        );
        assert_eq!(Orientation::WhiteBottom.flipped(), Orientation::BlackBottom);
        assert_eq!(
            Orientation::BlackBottom.flipped().flipped(),
            Orientation::BlackBottom
        );
        assert_eq!("black".parse::<Orientation>().unwrap(), Orientation::BlackBottom);
        assert!("south".parse::<Orientation>().is_err());
    }

    #[test]
    fn no_highlights() {
        assert!(highlights(&Position::starting(), None, None, None).is_empty());
    }

    #[test]
    fn selection_highlights() {
        let position = Position::starting();
        let selected = selection(&position, Square::E2);
        assert_eq!(
            highlights(&position, None, Some(&selected), None),
            BTreeMap::from([
                (Square::E2, Effects::SELECTED),
                (Square::E3, Effects::QUIET_TARGET),
                (Square::E4, Effects::QUIET_TARGET),
            ])
        );
    }

    #[test]
    fn captures_and_recent_move() {
        // 1. e4 d5: the e4 pawn can capture on d5 or push to e5.
        let position =
            Position::try_from("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
                .unwrap();
        let last_move = LastMove {
            from: Square::D7,
            to: Square::D5,
        };
        let selected = selection(&position, Square::E4);
        assert_eq!(
            highlights(&position, Some(last_move), Some(&selected), None),
            BTreeMap::from([
                (Square::D7, Effects::RECENT_MOVE),
                (Square::D5, Effects::RECENT_MOVE | Effects::CAPTURE_TARGET),
                (Square::E4, Effects::SELECTED),
                (Square::E5, Effects::QUIET_TARGET),
            ])
        );
    }

    #[test]
    fn drag_highlights() {
        let position = Position::starting();
        let drag = DragState {
            from: Square::G1,
            targets: position.legal_targets(Square::G1),
        };
        assert_eq!(
            highlights(&position, None, None, Some(&drag)),
            BTreeMap::from([
                (Square::F3, Effects::QUIET_TARGET),
                (Square::H3, Effects::QUIET_TARGET),
            ])
        );
    }

    #[test]
    fn render_starting_position() {
        let position = Position::starting();
        assert_eq!(
            render(&position, Orientation::WhiteBottom, &BTreeMap::new()),
            "8  r  n  b  q  k  b  n  r\n\
             7  p  p  p  p  p  p  p  p\n\
             6  .  .  .  .  .  .  .  .\n\
             5  .  .  .  .  .  .  .  .\n\
             4  .  .  .  .  .  .  .  .\n\
             3  .  .  .  .  .  .  .  .\n\
             2  P  P  P  P  P  P  P  P\n\
             1  R  N  B  Q  K  B  N  R\n   \
             a  b  c  d  e  f  g  h"
        );
        assert_eq!(
            render(&position, Orientation::BlackBottom, &BTreeMap::new()),
            "1  R  N  B  K  Q  B  N  R\n\
             2  P  P  P  P  P  P  P  P\n\
             3  .  .  .  .  .  .  .  .\n\
             4  .  .  .  .  .  .  .  .\n\
             5  .  .  .  .  .  .  .  .\n\
             6  .  .  .  .  .  .  .  .\n\
             7  p  p  p  p  p  p  p  p\n\
             8  r  n  b  k  q  b  n  r\n   \
             h  g  f  e  d  c  b  a"
        );
    }

    #[test]
    fn render_highlights() {
        let position = Position::starting();
        let selected = selection(&position, Square::E2);
        let board = render(
            &position,
            Orientation::WhiteBottom,
            &highlights(&position, None, Some(&selected), None),
        );
        let lines = board.lines().collect::<Vec<_>>();
        assert_eq!(lines[4], "4  .  .  .  .  *  .  .  .");
        assert_eq!(lines[5], "3  .  .  .  .  *  .  .  .");
        assert_eq!(lines[6], "2  P  P  P  P [P] P  P  P");
    }
}
