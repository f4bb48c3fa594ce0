//! The rules engine: a complete [Chess Position] with castling rights, en
//! passant and move counters, plus legal move generation and game status.
//!
//! Making a move never mutates a [`Position`]: it produces a new one, which is
//! what the board controller swaps in after each accepted gesture.
//!
//! [Chess Position]: https://www.chessprogramming.org/Chess_Position

use std::fmt;
use std::num::NonZeroU16;

use anyhow::{bail, Context};

use crate::chess::attacks::{self, CastleWalk};
use crate::chess::bitboard::{Bitboard, Board, Pieces};
use crate::chess::core::{
    CastleRights,
    Move,
    MoveList,
    Piece,
    PieceKind,
    Player,
    Promotion,
    Rank,
    Square,
    BOARD_WIDTH,
};

/// Everything a [Forsyth-Edwards Notation] string records about a game, and
/// nothing more: every position prints to exactly one FEN and parses back.
///
/// Use [`Position::try_from()`] for user input. It trims surrounding
/// whitespace and also takes four-field [EPD] lines, which leave out both
/// move counters.
///
/// [Forsyth-Edwards Notation]: https://www.chessprogramming.org/Forsyth-Edwards_Notation
/// [EPD]: https://www.chessprogramming.org/Extended_Position_Description
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    board: Board,
    castling: CastleRights,
    side_to_move: Player,
    /// Plies since the last capture or pawn move. The game is drawn once it
    /// reaches 100.
    halfmove_clock: u8,
    fullmove_counter: NonZeroU16,
    en_passant_square: Option<Square>,
}

/// Outcome of the game as far as the rules are concerned. Draws by repetition
/// are not tracked because positions do not carry history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameStatus {
    /// The side to move has at least one legal move.
    Ongoing,
    #[allow(missing_docs)]
    Checkmate { winner: Player },
    /// The side to move has no legal moves and is not in check.
    Stalemate,
    /// A hundred half-moves were made without a capture or a pawn move.
    FiftyMoveRule,
    /// Neither side can deliver a checkmate.
    InsufficientMaterial,
}

impl GameStatus {
    /// Returns true if no more moves can be made.
    #[must_use]
    pub const fn is_over(self) -> bool {
        !matches!(self, Self::Ongoing)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ongoing => f.write_str("ongoing"),
            Self::Checkmate {
                winner: Player::White,
            } => f.write_str("checkmate, white wins"),
            Self::Checkmate {
                winner: Player::Black,
            } => f.write_str("checkmate, black wins"),
            Self::Stalemate => f.write_str("stalemate"),
            Self::FiftyMoveRule => f.write_str("draw by the fifty-move rule"),
            Self::InsufficientMaterial => f.write_str("draw by insufficient material"),
        }
    }
}

/// The reason a move was not applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Rejection {
    #[allow(missing_docs)]
    #[error("there is no piece on the origin square")]
    EmptySquare,
    #[allow(missing_docs)]
    #[error("the piece does not belong to the side to move")]
    NotYourTurn,
    /// The pawn reaches the last rank but no piece to promote to was given.
    #[error("the move needs a promotion")]
    MissingPromotion,
    /// The piece can not get to the target square without breaking the rules
    /// (including leaving its own king in check).
    #[error("the piece can not legally reach the target square")]
    Unreachable,
}

/// Error returned when a move is rejected by the rules. The position it was
/// attempted in stays unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("illegal move {attempted}: {reason}")]
pub struct IllegalMove {
    #[allow(missing_docs)]
    pub attempted: Move,
    #[allow(missing_docs)]
    pub reason: Rejection,
}

impl Position {
    /// The position every game begins from.
    ///
    /// ```
    /// use chessboard::chess::position::Position;
    ///
    /// assert_eq!(
    ///     Position::starting().to_string(),
    ///     "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
    /// );
    /// ```
    #[must_use]
    pub fn starting() -> Self {
        Self {
            board: Board::starting(),
            castling: CastleRights::all(),
            ..Self::empty()
        }
    }

    /// Creates an empty board to be filled by parser.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            board: Board::empty(),
            castling: CastleRights::empty(),
            side_to_move: Player::White,
            halfmove_clock: 0,
            fullmove_counter: NonZeroU16::MIN,
            en_passant_square: None,
        }
    }

    /// The player whose turn it is.
    #[must_use]
    pub const fn us(&self) -> Player {
        self.side_to_move
    }

    #[must_use]
    pub(super) const fn they(&self) -> Player {
        self.us().opponent()
    }

    /// Returns the piece standing on the square, if any.
    #[must_use]
    pub fn at(&self, square: Square) -> Option<Piece> {
        self.board.at(square)
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn halfmove_clock(&self) -> u8 {
        self.halfmove_clock
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn fullmove_counter(&self) -> u16 {
        self.fullmove_counter.get()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn castling(&self) -> CastleRights {
        self.castling
    }

    #[allow(missing_docs)]
    #[must_use]
    pub const fn en_passant_square(&self) -> Option<Square> {
        self.en_passant_square
    }

    /// Serializes the position in Forsyth-Edwards Notation.
    #[must_use]
    pub fn fen(&self) -> String {
        self.to_string()
    }

    const fn pieces(&self, player: Player) -> &Pieces {
        self.board.player_pieces(player)
    }

    fn king(&self, player: Player) -> Option<Square> {
        self.pieces(player).king.first()
    }

    /// Pieces of `attacker` attacking the given square.
    fn attackers(&self, square: Square, attacker: Player) -> Bitboard {
        let occupancy = self.board.occupied();
        let pieces = self.pieces(attacker);
        (attacks::KING_ATTACKS[square as usize] & pieces.king)
            | (attacks::KNIGHT_ATTACKS[square as usize] & pieces.knights)
            | (attacks::pawn_attacks(square, attacker.opponent()) & pieces.pawns)
            | (attacks::bishop_attacks(square, occupancy) & (pieces.bishops | pieces.queens))
            | (attacks::rook_attacks(square, occupancy) & (pieces.rooks | pieces.queens))
    }

    fn is_attacked(&self, square: Square, attacker: Player) -> bool {
        self.attackers(square, attacker).has_any()
    }

    /// Returns true if the king of `player` is not attacked. Boards without a
    /// king (e.g. [`Position::empty`]) are never in check.
    fn king_is_safe(&self, player: Player) -> bool {
        self.king(player)
            .map_or(true, |king| !self.is_attacked(king, player.opponent()))
    }

    /// Returns true if the side to move is in check.
    #[must_use]
    pub fn in_check(&self) -> bool {
        !self.king_is_safe(self.us())
    }

    /// Squares the piece on `from` attacks or can push to, ignoring whether
    /// the move leaves the king in check. Castling is handled separately.
    fn reachable(&self, from: Square, kind: PieceKind) -> Bitboard {
        let us = self.us();
        let occupancy = self.board.occupied();
        let ours = self.pieces(us).all();
        match kind {
            PieceKind::King => attacks::KING_ATTACKS[from as usize] - ours,
            PieceKind::Queen => attacks::queen_attacks(from, occupancy) - ours,
            PieceKind::Rook => attacks::rook_attacks(from, occupancy) - ours,
            PieceKind::Bishop => attacks::bishop_attacks(from, occupancy) - ours,
            PieceKind::Knight => attacks::KNIGHT_ATTACKS[from as usize] - ours,
            PieceKind::Pawn => {
                let mut capturable = self.pieces(self.they()).all();
                if let Some(en_passant_square) = self.en_passant_square {
                    capturable.extend(en_passant_square);
                }
                let mut targets = attacks::pawn_attacks(from, us) & capturable;
                if let Some(single_push) = from.shift(us.push_direction()) {
                    if !occupancy.contains(single_push) {
                        targets.extend(single_push);
                        if from.rank() == Rank::pawns_starting(us) {
                            if let Some(double_push) = single_push.shift(us.push_direction()) {
                                if !occupancy.contains(double_push) {
                                    targets.extend(double_push);
                                }
                            }
                        }
                    }
                }
                targets
            },
        }
    }

    const fn castle_walks(player: Player) -> [(CastleRights, CastleWalk); 2] {
        match player {
            Player::White => [
                (CastleRights::WHITE_SHORT, attacks::WHITE_SHORT_CASTLE),
                (CastleRights::WHITE_LONG, attacks::WHITE_LONG_CASTLE),
            ],
            Player::Black => [
                (CastleRights::BLACK_SHORT, attacks::BLACK_SHORT_CASTLE),
                (CastleRights::BLACK_LONG, attacks::BLACK_LONG_CASTLE),
            ],
        }
    }

    /// Castles available to the side to move: the right is still there, the
    /// squares between the king and the rook are empty and the king is not
    /// in check and does not walk through attacked squares.
    fn castles(&self) -> impl Iterator<Item = Move> + '_ {
        let us = self.us();
        let in_check = self.in_check();
        Self::castle_walks(us)
            .into_iter()
            .filter(move |(right, walk)| {
                !in_check
                    && self.castling.contains(*right)
                    && self.pieces(us).king.contains(walk.king_from)
                    && self.pieces(us).rooks.contains(walk.rook_from)
                    && (self.board.occupied() & walk.must_be_empty).is_empty()
                    && walk
                        .must_be_safe
                        .iter()
                        .all(|square| !self.is_attacked(square, self.they()))
            })
            .map(|(_, walk)| Move::new(walk.king_from, walk.king_to, None))
    }

    fn push_if_legal(&self, moves: &mut MoveList, candidate: Move) {
        if self.apply_unchecked(candidate).king_is_safe(self.us()) {
            moves.push(candidate);
        }
    }

    /// Moves of the side to move that do not leave its own king attacked. Pawns reaching the last rank produce one move per
    /// promotion kind.
    ///
    /// Each candidate is played on a copy of the position and dropped if the
    /// king of the moving side ends up attacked. This covers pins, checks and
    /// the en passant corner cases without dedicated logic.
    #[must_use]
    pub fn generate_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        let us = self.us();
        let promotion_rank = Rank::backrank(us.opponent());
        for (kind, bitboard) in self.pieces(us).iter() {
            for from in bitboard.iter() {
                for to in self.reachable(from, kind).iter() {
                    if kind == PieceKind::Pawn && to.rank() == promotion_rank {
                        for promotion in Promotion::ALL {
                            self.push_if_legal(&mut moves, Move::new(from, to, Some(promotion)));
                        }
                    } else {
                        self.push_if_legal(&mut moves, Move::new(from, to, None));
                    }
                }
            }
        }
        for castle in self.castles() {
            self.push_if_legal(&mut moves, castle);
        }
        moves
    }

    /// Returns the set of squares the piece on `from` can legally move to. The
    /// set is empty if the square is empty or holds a piece of the player who
    /// is not on move.
    #[must_use]
    pub fn legal_targets(&self, from: Square) -> Bitboard {
        self.generate_moves()
            .iter()
            .filter(|candidate| candidate.from() == from)
            .map(Move::to)
            .collect()
    }

    /// Plays the move without checking it against the rules. The move has to
    /// originate from a square holding a piece of the side to move.
    fn apply_unchecked(&self, next_move: Move) -> Self {
        let mut next = *self;
        let (us, they) = (self.us(), self.they());
        let Some(piece) = self.at(next_move.from) else {
            return next;
        };
        let captured = self.at(next_move.to);
        next.board.player_pieces_mut(us).clear(next_move.from);
        next.board.player_pieces_mut(they).clear(next_move.to);
        if piece.kind == PieceKind::Pawn && self.en_passant_square == Some(next_move.to) {
            if let Some(pushed_pawn) = next_move.to.shift(they.push_direction()) {
                next.board.player_pieces_mut(they).clear(pushed_pawn);
            }
        }
        let landed = next_move.promotion.map_or(piece.kind, PieceKind::from);
        next.board.put(next_move.to, Piece::new(us, landed));
        if piece.kind == PieceKind::King
            && (next_move.from.file() as u8).abs_diff(next_move.to.file() as u8) == 2
        {
            if let Some((_, walk)) = Self::castle_walks(us)
                .into_iter()
                .find(|(_, walk)| walk.king_to == next_move.to)
            {
                next.board.player_pieces_mut(us).clear(walk.rook_from);
                next.board
                    .put(walk.rook_to, Piece::new(us, PieceKind::Rook));
            }
        }
        next.castling
            .remove(CastleRights::touched_by(next_move.from) | CastleRights::touched_by(next_move.to));
        next.en_passant_square = if piece.kind == PieceKind::Pawn
            && (next_move.from as u8).abs_diff(next_move.to as u8) == 2 * BOARD_WIDTH
        {
            next_move.from.shift(us.push_direction())
        } else {
            None
        };
        next.halfmove_clock = if piece.kind == PieceKind::Pawn || captured.is_some() {
            0
        } else {
            self.halfmove_clock.saturating_add(1)
        };
        if us == Player::Black {
            next.fullmove_counter = self.fullmove_counter.saturating_add(1);
        }
        next.side_to_move = they;
        next
    }

    /// Produces the position after the move. The current position is left
    /// untouched regardless of the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMove`] if the move is not among
    /// [`Position::generate_moves`].
    pub fn make_move(&self, next_move: Move) -> Result<Self, IllegalMove> {
        let reject = |reason| IllegalMove {
            attempted: next_move,
            reason,
        };
        match self.at(next_move.from) {
            None => return Err(reject(Rejection::EmptySquare)),
            Some(piece) if piece.owner != self.us() => return Err(reject(Rejection::NotYourTurn)),
            Some(_) => (),
        }
        let moves = self.generate_moves();
        if moves.contains(&next_move) {
            return Ok(self.apply_unchecked(next_move));
        }
        if next_move.promotion.is_none()
            && moves
                .iter()
                .any(|candidate| candidate.from == next_move.from && candidate.to == next_move.to)
        {
            return Err(reject(Rejection::MissingPromotion));
        }
        Err(reject(Rejection::Unreachable))
    }

    /// Returns true if neither side has enough material to checkmate: no
    /// pawns, rooks or queens and either a single minor piece or bishops all
    /// standing on squares of the same color.
    #[must_use]
    pub fn has_insufficient_material(&self) -> bool {
        let (white, black) = (&self.board.white_pieces, &self.board.black_pieces);
        let heavy = white.pawns | white.rooks | white.queens | black.pawns | black.rooks | black.queens;
        if heavy.has_any() {
            return false;
        }
        let knights = white.knights | black.knights;
        let bishops = white.bishops | black.bishops;
        if (knights | bishops).count() <= 1 {
            return true;
        }
        let light = Bitboard::light_squares();
        knights.is_empty() && ((bishops & light).is_empty() || (bishops - light).is_empty())
    }

    /// Returns the status of the game: checkmate and stalemate take priority
    /// over the draw rules.
    #[must_use]
    pub fn status(&self) -> GameStatus {
        if self.generate_moves().is_empty() {
            return if self.in_check() {
                GameStatus::Checkmate {
                    winner: self.they(),
                }
            } else {
                GameStatus::Stalemate
            };
        }
        if self.halfmove_clock >= 100 {
            return GameStatus::FiftyMoveRule;
        }
        if self.has_insufficient_material() {
            return GameStatus::InsufficientMaterial;
        }
        GameStatus::Ongoing
    }

    /// Checks that the position could occur in a game: one king per side,
    /// plausible material, no pawns on the back ranks, castling rights and
    /// en passant square consistent with the board and the side that is not
    /// on move is not in check.
    fn validate(&self) -> anyhow::Result<()> {
        for player in [Player::White, Player::Black] {
            let pieces = self.pieces(player);
            if pieces.king.count() != 1 {
                bail!(
                    "expected exactly one {player:?} king, got {}",
                    pieces.king.count()
                );
            }
            if pieces.pawns.count() > 8 {
                bail!(
                    "expected at most 8 {player:?} pawns, got {}",
                    pieces.pawns.count()
                );
            }
            let promoted = pieces.queens.count().saturating_sub(1)
                + pieces.rooks.count().saturating_sub(2)
                + pieces.bishops.count().saturating_sub(2)
                + pieces.knights.count().saturating_sub(2);
            if promoted + pieces.pawns.count() > 8 {
                bail!("too much material for {player:?}");
            }
        }
        let backranks = Bitboard::rank_mask(Rank::One) | Bitboard::rank_mask(Rank::Eight);
        if ((self.board.white_pieces.pawns | self.board.black_pieces.pawns) & backranks).has_any() {
            bail!("pawns can not be placed on backranks");
        }
        for player in [Player::White, Player::Black] {
            for (right, walk) in Self::castle_walks(player) {
                if self.castling.contains(right)
                    && !(self.pieces(player).king.contains(walk.king_from)
                        && self.pieces(player).rooks.contains(walk.rook_from))
                {
                    bail!("castling rights {} do not match the board", self.castling);
                }
            }
        }
        if let Some(en_passant_square) = self.en_passant_square {
            self.validate_en_passant(en_passant_square)?;
        }
        if !self.king_is_safe(self.they()) {
            bail!("the side that is not on move can not be in check");
        }
        let checkers = self
            .king(self.us())
            .map_or(0, |king| self.attackers(king, self.they()).count());
        if checkers > 2 {
            bail!("the king can not be checked by {checkers} pieces at once");
        }
        Ok(())
    }

    /// The en passant square has to be right behind a pawn of the opponent
    /// that has just been pushed two squares forward. Taking the push back
    /// must leave our king out of check: otherwise the opponent moved while
    /// giving a check.
    fn validate_en_passant(&self, en_passant_square: Square) -> anyhow::Result<()> {
        let expected_rank = match self.us() {
            Player::White => Rank::Six,
            Player::Black => Rank::Three,
        };
        if en_passant_square.rank() != expected_rank {
            bail!("en passant square should be on rank {expected_rank}, got {en_passant_square}");
        }
        let (Some(pushed_pawn), Some(original_square)) = (
            en_passant_square.shift(self.they().push_direction()),
            en_passant_square.shift(self.us().push_direction()),
        ) else {
            bail!("en passant square {en_passant_square} is on the edge of the board");
        };
        if !self.pieces(self.they()).pawns.contains(pushed_pawn) {
            bail!("en passant square {en_passant_square} is not behind a pushed pawn");
        }
        let occupancy = self.board.occupied();
        if occupancy.contains(en_passant_square) || occupancy.contains(original_square) {
            bail!("the pawn could not have been pushed through {en_passant_square}");
        }
        let mut before_push = *self;
        let pawn = Piece::new(self.they(), PieceKind::Pawn);
        before_push
            .board
            .player_pieces_mut(self.they())
            .clear(pushed_pawn);
        before_push.board.put(original_square, pawn);
        if !before_push.king_is_safe(self.us()) {
            bail!("the check could not have been delivered by the double push");
        }
        Ok(())
    }

    /// Reads six space-separated fields: placement, side to move, castling
    /// rights, en passant square, halfmove clock and fullmove counter. The two
    /// counters may be left out together, in which case they are "0 1".
    ///
    /// Fields must be separated by exactly one space with nothing around them;
    /// [`Position::try_from`] trims untrusted input first.
    ///
    /// # Errors
    ///
    /// If the input is malformed or describes a position that can not occur
    /// in a game.
    pub fn from_fen(input: &str) -> anyhow::Result<Self> {
        let mut parts = input.split(' ');
        // Placement.
        let mut result = Self::empty();
        let Some(pieces_placement) = parts.next() else {
            bail!("incorrect FEN: missing pieces placement");
        };
        let mut rank_id = BOARD_WIDTH;
        for rank_fen in pieces_placement.split('/') {
            if rank_id == 0 {
                bail!("incorrect FEN: expected 8 ranks, got {pieces_placement}");
            }
            rank_id -= 1;
            let rank = Rank::try_from(rank_id)?;
            let mut file: u8 = 0;
            for symbol in rank_fen.chars() {
                if file >= BOARD_WIDTH {
                    bail!("incorrect FEN: rank {rank_fen} exceeds {BOARD_WIDTH} squares");
                }
                match symbol {
                    '0' => bail!("increment can not be 0"),
                    '1'..='9' => {
                        file += symbol as u8 - b'0';
                        continue;
                    },
                    _ => (),
                }
                let piece = Piece::try_from(symbol)?;
                result.board.put(Square::new(file.try_into()?, rank), piece);
                file += 1;
            }
            if file != BOARD_WIDTH {
                bail!("incorrect FEN: rank size should be exactly {BOARD_WIDTH}, got {rank_fen} of length {file}");
            }
        }
        if rank_id != 0 {
            bail!("incorrect FEN: there should be 8 ranks, got {pieces_placement}");
        }
        result.side_to_move = match parts.next() {
            Some(value) => value.try_into()?,
            None => bail!("incorrect FEN: missing side to move"),
        };
        result.castling = match parts.next() {
            Some(value) => value.try_into()?,
            None => bail!("incorrect FEN: missing castling rights"),
        };
        result.en_passant_square = match parts.next() {
            Some("-") => None,
            Some(value) => Some(value.try_into()?),
            None => bail!("incorrect FEN: missing en passant square"),
        };
        match (parts.next(), parts.next()) {
            // This is a correct EPD: the clocks keep their defaults.
            (None, _) => (),
            (Some(halfmove_clock), Some(fullmove_counter)) => {
                if !halfmove_clock.bytes().all(|c| c.is_ascii_digit()) {
                    bail!("halfmove clock can not contain anything other than digits");
                }
                result.halfmove_clock = halfmove_clock.parse::<u8>().with_context(|| {
                    format!("incorrect FEN: halfmove clock can not be parsed {halfmove_clock}")
                })?;
                if !fullmove_counter.bytes().all(|c| c.is_ascii_digit()) {
                    bail!("fullmove counter can not contain anything other than digits");
                }
                result.fullmove_counter =
                    fullmove_counter.parse::<NonZeroU16>().with_context(|| {
                        format!("incorrect FEN: fullmove counter can not be parsed {fullmove_counter}")
                    })?;
            },
            (Some(_), None) => bail!("incorrect FEN: missing fullmove counter"),
        }
        if parts.next().is_some() {
            bail!("trailing symbols are not allowed in FEN");
        }
        result
            .validate()
            .with_context(|| format!("illegal position: {input}"))?;
        Ok(result)
    }
}

impl TryFrom<&str> for Position {
    type Error = anyhow::Error;

    /// Cleans up the input (surrounding whitespace, `fen`/`epd` prefixes) and
    /// parses the position.
    fn try_from(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        for prefix in ["fen ", "epd "] {
            if let Some(stripped) = input.strip_prefix(prefix) {
                return Self::from_fen(stripped);
            }
        }
        Self::from_fen(input)
    }
}

impl fmt::Display for Position {
    /// FEN with all six fields.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", &self.board)?;
        write!(f, "{} ", &self.side_to_move)?;
        write!(f, "{} ", &self.castling)?;
        match self.en_passant_square {
            Some(square) => write!(f, "{square} "),
            None => write!(f, "- "),
        }?;
        write!(f, "{} ", &self.halfmove_clock)?;
        write!(f, "{}", &self.fullmove_counter)?;
        Ok(())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:?}", &self.board)?;
        writeln!(f, "Player to move: {:?}", &self.side_to_move)?;
        writeln!(f, "Fullmove counter: {:?}", &self.fullmove_counter)?;
        writeln!(f, "En Passant: {:?}", &self.en_passant_square)?;
        // Castling in FEN letters rather than flag names.
        writeln!(f, "Castling rights: {}", &self.castling)?;
        writeln!(f, "FEN: {self}")?;
        Ok(())
    }
}
