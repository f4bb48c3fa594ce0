//! Text front-end of the board. The shell reads gestures and queries from the
//! input stream, forwards them to the [`Controller`] and reports what
//! happened, so that the board can be driven by hand or by a script.
//!
//! [`Shell::run`] is the main loop: it stops on `quit` or at the end of the
//! input.

use std::io::{BufRead, Write};

use anyhow::Context;
use itertools::Itertools;

use crate::chess::bitboard::Bitboard;
use crate::chess::core::{Player, Square};
use crate::chess::position::Position;
use crate::controller::{Controller, LastMove, SelectOutcome};
use crate::rules::Rules;
use crate::shell::command::Command;
use crate::view;

mod command;

/// Connects the controller to the I/O streams.
pub struct Shell<'a, R: BufRead, W: Write, P: Rules = Position> {
    controller: Controller<P>,
    input: &'a mut R,
    output: &'a mut W,
}

fn player_name(player: Player) -> &'static str {
    match player {
        Player::White => "white",
        Player::Black => "black",
    }
}

fn squares(targets: Bitboard) -> String {
    if targets.is_empty() {
        return "-".to_string();
    }
    targets.iter().join(" ")
}

impl<'a, R: BufRead, W: Write, P: Rules> Shell<'a, R, W, P> {
    /// Creates a shell driving the given controller.
    #[must_use]
    pub fn new(controller: Controller<P>, input: &'a mut R, output: &'a mut W) -> Self {
        Self {
            controller,
            input,
            output,
        }
    }

    #[allow(missing_docs)]
    pub const fn controller(&self) -> &Controller<P> {
        &self.controller
    }

    /// Reads the input line by line and executes the commands until `quit` is
    /// sent or the input is exhausted. Malformed commands are reported and
    /// skipped.
    ///
    /// # Errors
    ///
    /// If reading the input or writing the output fails.
    pub fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("reading shell input")?;
            if read == 0 {
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            match Command::parse(&line) {
                Command::Click(square) => self.handle_click(square)?,
                Command::Drag(square) => {
                    let targets = self.controller.begin_drag(square);
                    writeln!(self.output, "targets: {}", squares(targets))?;
                },
                Command::EndDrag => {
                    self.controller.end_drag();
                    writeln!(self.output, "drag ended")?;
                },
                Command::Drop { from, to } => match self.controller.drop_piece(from, to) {
                    Ok(last_move) => self.report_move(last_move)?,
                    Err(error) => writeln!(self.output, "{error}")?,
                },
                Command::Flip => {
                    let orientation = self.controller.flip_orientation();
                    writeln!(self.output, "orientation: {orientation}")?;
                },
                Command::Fen => writeln!(self.output, "{}", self.controller.fen())?,
                Command::Turn => writeln!(
                    self.output,
                    "{}",
                    player_name(self.controller.side_to_move())
                )?,
                Command::Status => writeln!(self.output, "{}", self.controller.status())?,
                Command::Display => self.handle_display()?,
                Command::Moves => self.handle_moves()?,
                Command::Quit => break,
                Command::Unknown(command) => {
                    writeln!(self.output, "info string Unsupported command: {command}")?;
                },
            }
        }
        Ok(())
    }

    fn handle_click(&mut self, square: Square) -> anyhow::Result<()> {
        match self.controller.select_square(square) {
            SelectOutcome::Selected => {
                let targets = self
                    .controller
                    .selection()
                    .map_or_else(Bitboard::empty, |selection| selection.targets);
                writeln!(self.output, "selected {square}, targets: {}", squares(targets))?;
            },
            SelectOutcome::Deselected => writeln!(self.output, "deselected {square}")?,
            SelectOutcome::Moved(last_move) => self.report_move(last_move)?,
            SelectOutcome::Rejected(error) => writeln!(self.output, "{error}")?,
            SelectOutcome::Ignored => writeln!(self.output, "ignored {square}")?,
        }
        Ok(())
    }

    fn report_move(&mut self, last_move: LastMove) -> anyhow::Result<()> {
        writeln!(self.output, "moved {}{}", last_move.from, last_move.to)?;
        let status = self.controller.status();
        if status.is_over() {
            writeln!(self.output, "game over: {status}")?;
        }
        Ok(())
    }

    /// Prints the board followed by the effects of every highlighted square.
    fn handle_display(&mut self) -> anyhow::Result<()> {
        let highlights = self.controller.highlights();
        writeln!(
            self.output,
            "{}",
            view::render(
                self.controller.position(),
                self.controller.orientation(),
                &highlights
            )
        )?;
        for (square, effects) in &highlights {
            writeln!(self.output, "{square}: {effects}")?;
        }
        Ok(())
    }

    fn handle_moves(&mut self) -> anyhow::Result<()> {
        let position = self.controller.position();
        let us = position.side_to_move();
        let moves = Square::iter()
            .filter(|&square| position.piece_at(square).is_some_and(|piece| piece.owner == us))
            .flat_map(|from| {
                position
                    .legal_targets(from)
                    .iter()
                    .map(move |to| format!("{from}{to}"))
            })
            .join(" ");
        writeln!(self.output, "{moves}")?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    fn run(controller: Controller, script: &str) -> (String, Controller) {
        let mut input = script.as_bytes();
        let mut output = Vec::new();
        let mut shell = Shell::new(controller, &mut input, &mut output);
        shell.run().unwrap();
        let controller = shell.controller().clone();
        (String::from_utf8(output).unwrap(), controller)
    }

    #[test]
    fn click_path() {
        let (output, controller) = run(Controller::default(), "click e2\nclick e4\nfen\nturn\n");
        assert_eq!(
            output,
            "selected e2, targets: e3 e4\n\
             moved e2e4\n\
             rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1\n\
             black\n"
        );
        assert_eq!(
            controller.last_move(),
            Some(LastMove {
                from: Square::E2,
                to: Square::E4
            })
        );
    }

    #[test]
    fn ignored_click_keeps_selection() {
        let (output, controller) = run(Controller::default(), "click e2\nclick a7\n");
        assert_eq!(output, "selected e2, targets: e3 e4\nignored a7\n");
        assert_eq!(controller.selection().map(|s| s.square), Some(Square::E2));
    }

    #[test]
    fn drag_and_drop() {
        let (output, _) = run(
            Controller::default(),
            "drag g1\ndrop g1 f3\ndrag e7\nenddrag\ndrop e7 e4\n",
        );
        assert_eq!(
            output,
            "targets: f3 h3\n\
             moved g1f3\n\
             targets: e5 e6\n\
             drag ended\n\
             illegal move e7e4: the piece can not legally reach the target square\n"
        );
    }

    #[test]
    fn display_and_flip() {
        let (output, _) = run(Controller::default(), "click e2\nflip\nd\n");
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(lines[1], "orientation: black");
        // Flipping drops the selection, so nothing is highlighted.
        assert_eq!(lines[2], "1  R  N  B  K  Q  B  N  R");
        assert_eq!(lines.len(), 2 + 9);
    }

    #[test]
    fn highlights_listing() {
        let (output, _) = run(Controller::default(), "click g1\nd\n");
        let lines = output.lines().collect::<Vec<_>>();
        assert_eq!(&lines[lines.len() - 3..], ["g1: selected", "f3: quiet", "h3: quiet"]);
    }

    #[test]
    fn game_over() {
        let (output, _) = run(
            Controller::from_fen("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2")
                .unwrap(),
            "drop d8 h4\nstatus\nmoves\n",
        );
        assert_eq!(
            output,
            "moved d8h4\n\
             game over: checkmate, black wins\n\
             checkmate, black wins\n\
             \n"
        );
    }

    #[test]
    fn moves_and_unknown() {
        let (output, _) = run(
            Controller::from_fen("7k/8/8/8/8/8/8/K7 w - - 0 1").unwrap(),
            "moves\n\ngo depth 10\nquit\nfen\n",
        );
        assert_eq!(
            output,
            "a1b1 a1a2 a1b2\n\
             info string Unsupported command: go depth 10\n"
        );
    }
}
