#![no_main]
use chessboard::chess::core::Square;
use chessboard::chess::position::Position;
use chessboard::Controller;
use libfuzzer_sys::fuzz_target;

// Every pair of bytes is a gesture: the top bits of the first byte pick the
// kind, the rest are squares.
fuzz_target!(|data: &[u8]| {
    let mut controller: Controller = Controller::default();
    for chunk in data.chunks_exact(2) {
        let Ok(square) = Square::try_from(chunk[0] & 0b11_1111) else {
            return;
        };
        let Ok(other) = Square::try_from(chunk[1] & 0b11_1111) else {
            return;
        };
        let before: Position = *controller.position();
        match chunk[0] >> 6 {
            0 => {
                let _ = controller.select_square(square);
            },
            1 => {
                let _ = controller.begin_drag(square);
            },
            2 => {
                if controller.drop_piece(square, other).is_err() {
                    assert_eq!(controller.position(), &before);
                }
            },
            _ => {
                let _ = controller.flip_orientation();
                assert!(controller.selection().is_none());
            },
        }
        if let Some(selection) = controller.selection() {
            let piece = controller.position().at(selection.square);
            assert!(piece.is_some_and(|piece| piece.owner == controller.side_to_move()));
        }
    }
});
