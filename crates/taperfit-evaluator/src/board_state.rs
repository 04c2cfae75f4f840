//! Board positions and the per-position facts the evaluator reads.
//!
//! Positions come from FEN strings and are parsed with `shakmaty` without legality
//! validation: only the piece placement and the side to move matter to the evaluator.

use shakmaty::{Bitboard, Board, Color, Piece, Role, Square, fen::Fen};

pub use shakmaty::fen::ParseFenError;

use crate::weights::{BISHOP, KING, KNIGHT, PAWN, QUEEN, ROOK};

/// Piece placement and side to move of one position.
#[derive(Debug, Clone)]
pub struct BoardState {
    board: Board,
    turn: Color,
}

impl BoardState {
    /// Parses a FEN string.
    ///
    /// Castling rights, en passant square and move counters are parsed but not kept.
    pub fn from_fen(fen: &str) -> Result<Self, ParseFenError> {
        let fen: Fen = fen.parse()?;
        let setup = fen.into_setup();
        Ok(Self {
            board: setup.board,
            turn: setup.turn,
        })
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn turn(&self) -> Color {
        self.turn
    }
}

/// Evaluation inputs derived from a [`BoardState`].
///
/// Built once per evaluated position and dropped afterwards.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    board: &'a Board,
    turn: Color,
    white_king_attacks: Bitboard,
    black_king_attacks: Bitboard,
}

impl<'a> EvaluationContext<'a> {
    #[must_use]
    pub fn new(state: &'a BoardState) -> Self {
        let board = &state.board;
        let king_attacks = |color| {
            board
                .king_of(color)
                .map_or(Bitboard::EMPTY, |king| board.attacks_from(king))
        };
        Self {
            board,
            turn: state.turn,
            white_king_attacks: king_attacks(Color::White),
            black_king_attacks: king_attacks(Color::Black),
        }
    }

    #[must_use]
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Occupied squares with their pieces, in ascending square order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.board
            .occupied()
            .into_iter()
            .filter_map(|square| self.board.piece_at(square).map(|piece| (square, piece)))
    }

    #[must_use]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.board.by_color(color)
    }

    /// Squares attacked by the piece on `square`, given the current occupancy.
    #[must_use]
    pub fn attacks(&self, square: Square) -> Bitboard {
        self.board.attacks_from(square)
    }

    /// Squares attacked by the king of `color`; empty when that king is missing.
    #[must_use]
    pub fn king_attacks(&self, color: Color) -> Bitboard {
        match color {
            Color::White => self.white_king_attacks,
            Color::Black => self.black_king_attacks,
        }
    }

    #[must_use]
    pub fn bishop_count(&self, color: Color) -> usize {
        (self.board.bishops() & self.board.by_color(color)).count()
    }
}

/// Maps a piece role to its index in the weight tables.
#[must_use]
pub fn piece_index(role: Role) -> usize {
    match role {
        Role::Pawn => PAWN,
        Role::Knight => KNIGHT,
        Role::Bishop => BISHOP,
        Role::Rook => ROOK,
        Role::Queen => QUEEN,
        Role::King => KING,
    }
}
