use chessboard::chess::core::{Move, Square};
use chessboard::chess::position::{Position, Rejection};
use chessboard::controller::{LastMove, SelectOutcome};
use chessboard::view::{Effects, Orientation};
use chessboard::Controller;
use itertools::Itertools;
use pretty_assertions::assert_eq;
use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, Position as ShakmatyPosition};

fn square(name: &str) -> Square {
    Square::try_from(name).unwrap()
}

// A few positions from different game phases, including promotions, castling
// and en passant.
const POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1",
    "2n4k/1PP5/6K1/3Pp1Q1/3N4/3P4/P3R3/8 w - e6 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
];

fn controllers() -> impl Iterator<Item = Controller> {
    POSITIONS
        .iter()
        .map(|fen| Controller::from_fen(fen).unwrap())
}

fn own_pieces(position: &Position) -> Vec<Square> {
    Square::iter()
        .filter(|&square| {
            position
                .at(square)
                .is_some_and(|piece| piece.owner == position.us())
        })
        .collect()
}

#[test]
fn click_path_scenario() {
    let mut controller: Controller = Controller::default();
    assert_eq!(controller.select_square(square("e2")), SelectOutcome::Selected);
    assert_eq!(
        controller
            .selection()
            .map(|selection| selection.targets.iter().collect::<Vec<_>>()),
        Some(vec![Square::E3, Square::E4])
    );
    let expected = LastMove {
        from: Square::E2,
        to: Square::E4,
    };
    assert_eq!(
        controller.select_square(square("e4")),
        SelectOutcome::Moved(expected)
    );
    assert_eq!(controller.last_move(), Some(expected));
    assert_eq!(controller.selection(), None);
    assert_eq!(
        controller.fen(),
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
    );
}

#[test]
fn opponent_click_scenario() {
    let mut controller: Controller = Controller::default();
    let _ = controller.select_square(square("e2"));
    let before = controller.selection().copied();
    assert_eq!(controller.select_square(square("a7")), SelectOutcome::Ignored);
    assert_eq!(controller.selection().copied(), before);
    assert_eq!(controller.position(), &Position::starting());
}

#[test]
fn illegal_drop_scenario() {
    let mut controller: Controller = Controller::default();
    let _ = controller.begin_drag(square("e2"));
    let error = controller
        .drop_piece(square("e2"), square("e5"))
        .unwrap_err();
    assert_eq!(error.reason, Rejection::Unreachable);
    assert_eq!(controller.position(), &Position::starting());
    assert_eq!(controller.last_move(), None);
    assert!(controller.highlights().is_empty());
}

fn reference_targets(fen: &str, from: Square) -> Vec<Square> {
    let setup: Fen = fen.parse().unwrap();
    let position: Chess = setup.into_position(CastlingMode::Standard).unwrap();
    position
        .legal_moves()
        .iter()
        .map(|m| m.to_uci(CastlingMode::Standard).to_string())
        .filter(|uci| uci[..2] == from.to_string())
        .map(|uci| square(&uci[2..4]))
        .sorted()
        .dedup()
        .collect()
}

#[test]
fn selection_targets_match_rules() {
    for fen in POSITIONS {
        let mut controller: Controller = Controller::from_fen(fen).unwrap();
        let position = *controller.position();
        for from in own_pieces(&position) {
            assert_eq!(controller.select_square(from), SelectOutcome::Selected);
            let targets = controller
                .selection()
                .map(|selection| selection.targets.iter().collect::<Vec<_>>());
            assert_eq!(targets, Some(reference_targets(fen, from)), "{fen}: {from}");
        }
    }
}

#[test]
fn legal_moves_become_last_move() {
    for controller in controllers() {
        let position = *controller.position();
        for from in own_pieces(&position) {
            for to in position.legal_targets(from).iter() {
                let expected = LastMove { from, to };

                let mut dropped = controller.clone();
                assert_eq!(dropped.drop_piece(from, to), Ok(expected), "{position}");
                assert_eq!(dropped.last_move(), Some(expected));
                let highlights = dropped.highlights();
                for square in [from, to] {
                    assert!(
                        highlights
                            .get(&square)
                            .is_some_and(|effects| effects.contains(Effects::RECENT_MOVE)),
                        "{position}: {from}{to}"
                    );
                }

                let mut clicked = controller.clone();
                assert_eq!(clicked.select_square(from), SelectOutcome::Selected);
                assert_eq!(clicked.select_square(to), SelectOutcome::Moved(expected));
                assert_eq!(clicked.last_move(), Some(expected));
                assert_eq!(clicked.position(), dropped.position());
            }
        }
    }
}

#[test]
fn rejections_keep_last_move() {
    for mut controller in controllers() {
        let position = *controller.position();
        let first_move = position.generate_moves()[0];
        let played = controller
            .drop_piece(first_move.from(), first_move.to())
            .unwrap();
        let position = *controller.position();
        for from in Square::iter() {
            let targets = position.legal_targets(from);
            for to in Square::iter().filter(|&to| !targets.contains(to)) {
                let mut controller = controller.clone();
                assert!(controller.drop_piece(from, to).is_err(), "{position}: {from}{to}");
                assert_eq!(controller.last_move(), Some(played));
                assert_eq!(controller.position(), &position);
                assert!(controller
                    .highlights()
                    .get(&played.to)
                    .is_some_and(|effects| effects.contains(Effects::RECENT_MOVE)));
            }
        }
    }
}

#[test]
fn drops_follow_rules() {
    for controller in controllers() {
        let position = *controller.position();
        for from in Square::iter() {
            let targets = position.legal_targets(from);
            for to in Square::iter() {
                let mut controller = controller.clone();
                let result = controller.drop_piece(from, to);
                if targets.contains(to) {
                    let expected = position
                        .make_move(Move::with_auto_queen(position.at(from), from, to))
                        .unwrap();
                    assert_eq!(result, Ok(LastMove { from, to }));
                    assert_eq!(controller.position(), &expected);
                    assert_eq!(controller.last_move(), Some(LastMove { from, to }));
                } else {
                    assert!(result.is_err(), "{position}: {from}{to}");
                    assert_eq!(controller.position(), &position);
                    assert_eq!(controller.last_move(), None);
                }
            }
        }
    }
}

#[test]
fn reselecting_toggles_selection() {
    for mut controller in controllers() {
        let position = *controller.position();
        for from in own_pieces(&position) {
            assert_eq!(controller.select_square(from), SelectOutcome::Selected);
            assert_eq!(controller.select_square(from), SelectOutcome::Deselected);
            assert_eq!(controller.selection(), None);
            assert_eq!(controller.position(), &position);
        }
    }
}

#[test]
fn flip_is_an_involution() {
    for mut controller in controllers() {
        let position = *controller.position();
        for from in own_pieces(&position).into_iter().take(3) {
            let original = controller.orientation();
            let _ = controller.select_square(from);
            let _ = controller.begin_drag(from);
            assert_eq!(controller.flip_orientation(), original.flipped());
            assert_eq!(controller.selection(), None);
            assert_eq!(controller.drag(), None);
            assert_eq!(controller.flip_orientation(), original);
            assert_eq!(controller.selection(), None);
        }
        assert_eq!(controller.orientation(), Orientation::WhiteBottom);
    }
}

#[test]
fn full_game_by_clicks() {
    // Scholar's mate.
    let mut controller: Controller = Controller::default();
    for (from, to) in [
        ("e2", "e4"),
        ("e7", "e5"),
        ("f1", "c4"),
        ("b8", "c6"),
        ("d1", "h5"),
        ("g8", "f6"),
    ] {
        assert_eq!(controller.select_square(square(from)), SelectOutcome::Selected);
        assert!(matches!(
            controller.select_square(square(to)),
            SelectOutcome::Moved(_)
        ));
    }
    assert!(controller.drop_piece(square("h5"), square("f7")).is_ok());
    assert_eq!(controller.status().to_string(), "checkmate, white wins");
    assert_eq!(controller.select_square(square("e8")), SelectOutcome::Selected);
    assert!(controller
        .selection()
        .is_some_and(|selection| selection.targets.is_empty()));
}
