//! Line-oriented commands accepted by the board shell. Each command is one of
//! the gestures the board understands or a query about the current state.

use crate::chess::core::Square;

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Command {
    /// Click on a square.
    Click(Square),
    /// Pick up the piece on a square.
    Drag(Square),
    /// Release the dragged piece outside of the board.
    EndDrag,
    /// Drop the piece dragged from one square onto another.
    Drop { from: Square, to: Square },
    Flip,
    Fen,
    Turn,
    Status,
    /// Draw the board with highlights.
    Display,
    /// List all legal moves in UCI notation.
    Moves,
    Quit,
    Unknown(String),
}

fn parse_square(token: Option<&&str>) -> Option<Square> {
    token.and_then(|token| Square::try_from(*token).ok())
}

impl Command {
    /// Parses a single line of input. Malformed commands (missing or invalid
    /// squares, extra tokens) are [`Command::Unknown`].
    pub(super) fn parse(input: &str) -> Self {
        let input = input.trim();
        let parts = input.split_whitespace().collect::<Vec<_>>();
        let unknown = || Self::Unknown(input.to_string());

        let Some(&name) = parts.first() else {
            return unknown();
        };
        let command = match (name, parts.len()) {
            ("click", 2) => parse_square(parts.get(1)).map(Self::Click),
            ("drag", 2) => parse_square(parts.get(1)).map(Self::Drag),
            ("enddrag", 1) => Some(Self::EndDrag),
            ("drop", 3) => parse_square(parts.get(1))
                .zip(parse_square(parts.get(2)))
                .map(|(from, to)| Self::Drop { from, to }),
            ("flip", 1) => Some(Self::Flip),
            ("fen", 1) => Some(Self::Fen),
            ("turn", 1) => Some(Self::Turn),
            ("status", 1) => Some(Self::Status),
            ("d", 1) => Some(Self::Display),
            ("moves", 1) => Some(Self::Moves),
            ("quit", 1) => Some(Self::Quit),
            _ => None,
        };
        command.unwrap_or_else(unknown)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_gestures() {
        assert_eq!(Command::parse("click e2"), Command::Click(Square::E2));
        assert_eq!(Command::parse("  click   h8 \n"), Command::Click(Square::H8));
        assert_eq!(Command::parse("drag g1"), Command::Drag(Square::G1));
        assert_eq!(Command::parse("enddrag"), Command::EndDrag);
        assert_eq!(
            Command::parse("drop e2 e4"),
            Command::Drop {
                from: Square::E2,
                to: Square::E4
            }
        );
        assert_eq!(Command::parse("flip"), Command::Flip);
    }

    #[test]
    fn parse_queries() {
        assert_eq!(Command::parse("fen"), Command::Fen);
        assert_eq!(Command::parse("turn"), Command::Turn);
        assert_eq!(Command::parse("status"), Command::Status);
        assert_eq!(Command::parse("d"), Command::Display);
        assert_eq!(Command::parse("moves"), Command::Moves);
    }

    #[test]
    fn parse_quit() {
        assert_eq!(Command::parse("quit\n"), Command::Quit);
    }

    #[test]
    fn malformed() {
        assert_eq!(
            Command::parse("click e9"),
            Command::Unknown("click e9".to_string())
        );
        assert_eq!(Command::parse("click"), Command::Unknown("click".to_string()));
        assert_eq!(
            Command::parse("drop e2"),
            Command::Unknown("drop e2".to_string())
        );
        assert_eq!(
            Command::parse("flip now"),
            Command::Unknown("flip now".to_string())
        );
        assert_eq!(Command::parse(""), Command::Unknown(String::new()));
    }

    #[test]
    fn unknown() {
        assert_eq!(
            Command::parse("go depth 10"),
            Command::Unknown("go depth 10".to_string())
        );
    }
}
