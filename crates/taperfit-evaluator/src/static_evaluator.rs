//! Tapered static evaluation, as computed by the target engine.
//!
//! # How It Works
//!
//! Every piece contributes to a middlegame score and an endgame score:
//!
//! 1. **Material** - `mat_mg[piece]` / `mat_eg[piece]`
//! 2. **Piece-square tables** - indexed with the rank-mirrored square for white and the raw
//!    square for black
//! 3. **Mobility** - `mob_bonus[phase][piece]` times the number of attacked squares not
//!    occupied by the piece's own side
//! 4. **King attacks** - `king_atk_bonus[phase][piece]` times the number of those squares
//!    that are also attacked by the opposing king
//!
//! White contributions are added and black contributions subtracted. The two scores are
//! blended by a phase value summed from [`PHASE_VALUES`] and clamped at [`START_PHASE`]:
//!
//! ```text
//! score = (mg * phase + eg * (256 - phase)) >> 8
//! ```
//!
//! The bishop pair and side-to-move bonuses are added untapered, and the final score is
//! negated when black is to move so that it is always relative to the side to move.
//!
//! Only bishops, rooks, queens and kings have mobility. Pawns and knights are given an
//! empty attack set, so they contribute neither mobility nor king-attack terms.

use std::fmt;

use shakmaty::{Bitboard, Color};

use crate::{
    board_state::{BoardState, EvaluationContext, piece_index},
    weights::{BISHOP, ENDGAME, EvalWeights, MIDDLEGAME, PIECE_COUNT},
};

/// Phase weight of each piece type.
pub const PHASE_VALUES: [i32; PIECE_COUNT] = [0, 10, 10, 22, 44, 0];
/// Phase value of a full middlegame; larger sums are clamped to it.
pub const START_PHASE: i32 = 256;

/// Scores positions from the side to move's perspective.
pub trait PositionEvaluator: fmt::Debug + Send + Sync {
    fn evaluate(&self, state: &BoardState) -> i32;
}

/// Linear, phase-tapered evaluator driven by [`EvalWeights`].
#[derive(Debug, Clone)]
pub struct TaperedEvaluator {
    weights: EvalWeights,
}

impl TaperedEvaluator {
    #[must_use]
    pub fn new(weights: EvalWeights) -> Self {
        Self { weights }
    }

    #[must_use]
    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    /// Evaluates the position from white's perspective.
    #[must_use]
    pub fn evaluate_white(&self, state: &BoardState) -> i32 {
        let w = &self.weights;
        let ctx = EvaluationContext::new(state);
        let mut score = 0;

        for color in [Color::White, Color::Black] {
            if ctx.bishop_count(color) > 1 {
                score += sign(color) * w.bishop_pair_bonus;
            }
        }
        score += sign(ctx.turn()) * w.stm_bonus;

        let mut score_mg = 0;
        let mut score_eg = 0;
        let mut phase = 0;
        for (square, piece) in ctx.pieces() {
            let p = piece_index(piece.role);
            let attacks = if p >= BISHOP {
                ctx.attacks(square) & !ctx.occupancy(piece.color)
            } else {
                Bitboard::EMPTY
            };
            let mobility = popcount(attacks);
            let king_attacks = popcount(attacks & ctx.king_attacks(!piece.color));
            let pst_square = match piece.color {
                Color::White => square.flip_vertical() as usize,
                Color::Black => square as usize,
            };

            let s = sign(piece.color);
            score_mg += s
                * (w.mat_mg[p]
                    + w.pst_mg[p][pst_square]
                    + w.mob_bonus[MIDDLEGAME][p] * mobility
                    + w.king_atk_bonus[MIDDLEGAME][p] * king_attacks);
            score_eg += s
                * (w.mat_eg[p]
                    + w.pst_eg[p][pst_square]
                    + w.mob_bonus[ENDGAME][p] * mobility
                    + w.king_atk_bonus[ENDGAME][p] * king_attacks);
            phase += PHASE_VALUES[p];
        }

        score + tapered_score(score_mg, score_eg, phase)
    }
}

impl PositionEvaluator for TaperedEvaluator {
    fn evaluate(&self, state: &BoardState) -> i32 {
        let score = self.evaluate_white(state);
        match state.turn() {
            Color::White => score,
            Color::Black => -score,
        }
    }
}

/// Blends middlegame and endgame scores by `phase`, clamped to [`START_PHASE`].
#[must_use]
pub fn tapered_score(score_mg: i32, score_eg: i32, phase: i32) -> i32 {
    let phase = phase.min(START_PHASE);
    (score_mg * phase + score_eg * (START_PHASE - phase)) >> 8
}

fn sign(color: Color) -> i32 {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn popcount(bb: Bitboard) -> i32 {
    bb.count() as i32
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg64;

    use super::*;
    use crate::weights::{KING, KNIGHT, PAWN, QUEEN, ROOK, WEIGHT_COUNT, WeightVector};

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn state(fen: &str) -> BoardState {
        BoardState::from_fen(fen).unwrap()
    }

    /// Flips the board vertically, swaps piece colors and the side to move.
    fn mirror_fen(fen: &str) -> String {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        let swap_case = |s: &str| {
            s.chars()
                .map(|c| {
                    if c.is_ascii_uppercase() {
                        c.to_ascii_lowercase()
                    } else {
                        c.to_ascii_uppercase()
                    }
                })
                .collect::<String>()
        };
        let board = fields[0]
            .split('/')
            .rev()
            .map(swap_case)
            .collect::<Vec<_>>()
            .join("/");
        let turn = if fields[1] == "w" { "b" } else { "w" };
        format!("{board} {turn} - - 0 1")
    }

    fn random_weights(seed: u64) -> EvalWeights {
        let mut rng = Pcg64::seed_from_u64(seed);
        let flat = (0..WEIGHT_COUNT).map(|_| rng.random_range(-100..=100)).collect();
        WeightVector::from_flat(flat).unwrap().to_structured()
    }

    #[test]
    fn test_tapered_score() {
        assert_eq!(tapered_score(256, 0, 256), 256);
        assert_eq!(tapered_score(0, 256, 0), 256);
        assert_eq!(tapered_score(100, 200, 128), 150);
        // Phase above the start phase is clamped.
        assert_eq!(tapered_score(100, -300, 400), 100);
        // Arithmetic shift rounds toward negative infinity.
        assert_eq!(tapered_score(-1, 0, 128), -1);
    }

    #[test]
    fn test_zero_weights_score_zero() {
        let evaluator = TaperedEvaluator::new(EvalWeights::default());
        assert_eq!(evaluator.evaluate(&state(START_FEN)), 0);
    }

    #[test]
    fn test_start_position_is_balanced_without_stm_bonus() {
        let mut weights = random_weights(1);
        weights.stm_bonus = 0;
        // The start position is color-symmetric, so every term cancels.
        let evaluator = TaperedEvaluator::new(weights);
        assert_eq!(evaluator.evaluate(&state(START_FEN)), 0);
    }

    #[test]
    fn test_side_to_move_bonus() {
        let weights = EvalWeights {
            stm_bonus: 15,
            ..EvalWeights::default()
        };
        let evaluator = TaperedEvaluator::new(weights);
        assert_eq!(evaluator.evaluate(&state(START_FEN)), 15);
        let black = state("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
        assert_eq!(evaluator.evaluate_white(&black), -15);
        assert_eq!(evaluator.evaluate(&black), 15);
    }

    #[test]
    fn test_bishop_pair_bonus() {
        let weights = EvalWeights {
            bishop_pair_bonus: 30,
            ..EvalWeights::default()
        };
        let evaluator = TaperedEvaluator::new(weights);
        assert_eq!(evaluator.evaluate(&state("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1")), 30);
        assert_eq!(evaluator.evaluate(&state("4k3/8/8/8/8/8/8/4KB2 w - - 0 1")), 0);
        assert_eq!(evaluator.evaluate(&state("2b1kb2/8/8/8/8/8/8/4K3 b - - 0 1")), 30);
        assert_eq!(evaluator.evaluate(&state(START_FEN)), 0);
    }

    #[test]
    fn test_material_and_phase() {
        let mut weights = EvalWeights::default();
        weights.mat_mg[QUEEN] = 900;
        weights.mat_eg[QUEEN] = 1000;
        weights.mat_mg[ROOK] = 500;
        weights.mat_eg[ROOK] = 600;
        let evaluator = TaperedEvaluator::new(weights);

        // White queen only: phase 44.
        let queen = state("4k3/8/8/8/8/8/8/3QK3 w - - 0 1");
        assert_eq!(
            evaluator.evaluate(&queen),
            (900 * 44 + 1000 * (256 - 44)) >> 8
        );

        // Queen against rook: phase 66, material difference only.
        let queen_rook = state("3rk3/8/8/8/8/8/8/3QK3 b - - 0 1");
        let white = (400 * 66 + 400 * (256 - 66)) >> 8;
        assert_eq!(evaluator.evaluate(&queen_rook), -white);
    }

    #[test]
    fn test_phase_is_clamped() {
        let mut weights = EvalWeights::default();
        weights.mat_mg[PAWN] = 256;
        weights.mat_eg[PAWN] = -256;
        let evaluator = TaperedEvaluator::new(weights);
        // Six queens push the phase far above 256; only the middlegame term counts.
        let fen = "qqq1k3/8/8/8/8/8/P7/QQQ1K3 w - - 0 1";
        assert_eq!(evaluator.evaluate(&state(fen)), 256);
    }

    #[test]
    fn test_piece_square_tables_mirror_white() {
        let mut weights = EvalWeights::default();
        // a8 from white's point of view is a1 after mirroring.
        weights.pst_mg[KNIGHT][shakmaty::Square::A8 as usize] = 40;
        weights.pst_eg[KNIGHT][shakmaty::Square::A8 as usize] = 40;
        let evaluator = TaperedEvaluator::new(weights);
        assert_eq!(evaluator.evaluate(&state("4k3/8/8/8/8/8/8/N3K3 w - - 0 1")), 40);
        // Black indexes the raw square.
        assert_eq!(evaluator.evaluate(&state("n3k3/8/8/8/8/8/8/4K3 w - - 0 1")), -40);
    }

    #[test]
    fn test_mobility_excludes_pawns_and_knights() {
        let mut weights = EvalWeights::default();
        for phase in [MIDDLEGAME, ENDGAME] {
            weights.mob_bonus[phase] = [1; PIECE_COUNT];
        }
        let evaluator = TaperedEvaluator::new(weights);

        // Knight and pawn: only the two kings have mobility, and they cancel.
        let fen = "7k/8/8/8/3N4/8/4P3/K7 w - - 0 1";
        assert_eq!(evaluator.evaluate(&state(fen)), 0);

        // Rook on an open board: 14 squares, minus nothing (kings are in the corners).
        let fen = "7k/8/8/8/3R4/8/8/K7 w - - 0 1";
        assert_eq!(evaluator.evaluate(&state(fen)), 14);
    }

    #[test]
    fn test_king_attack_term() {
        let mut weights = EvalWeights::default();
        weights.king_atk_bonus[MIDDLEGAME][ROOK] = 10;
        weights.king_atk_bonus[ENDGAME][ROOK] = 10;
        let evaluator = TaperedEvaluator::new(weights);
        // Rook on g1 sees g7 and g8 on the g-file; the king on h8 attacks g7, g8 and h7.
        let fen = "7k/8/8/8/8/8/8/K5R1 w - - 0 1";
        assert_eq!(evaluator.evaluate(&state(fen)), 20);
        // The kings are too far apart to attack each other's surroundings.
        let mut weights = EvalWeights::default();
        weights.king_atk_bonus[MIDDLEGAME][KING] = 10;
        weights.king_atk_bonus[ENDGAME][KING] = 10;
        let evaluator = TaperedEvaluator::new(weights);
        assert_eq!(evaluator.evaluate(&state(fen)), 0);
    }

    #[test]
    fn test_color_mirror_symmetry() {
        let fens = [
            START_FEN,
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            "r3k2r/pb1nqppp/1p2p3/2ppP3/3P4/2PB1N2/PP1Q1PPP/R3K2R b KQkq - 1 11",
            "8/5pk1/6p1/3B4/8/6P1/5PK1/2r5 w - - 0 40",
            "2kr3r/ppp2ppp/2n5/2b1q3/4P3/2N2Q2/PPP2PPP/R1B2RK1 b - - 4 14",
        ];
        for seed in 0..4 {
            let mut weights = random_weights(seed);
            weights.stm_bonus = 0;
            weights.bishop_pair_bonus = 0;
            // Equal phase tables keep the blend exact, so rounding cannot break symmetry.
            weights.mat_eg = weights.mat_mg;
            weights.pst_eg = weights.pst_mg;
            weights.mob_bonus[ENDGAME] = weights.mob_bonus[MIDDLEGAME];
            weights.king_atk_bonus[ENDGAME] = weights.king_atk_bonus[MIDDLEGAME];
            let evaluator = TaperedEvaluator::new(weights);

            for fen in fens {
                let original = state(fen);
                let mirrored = state(&mirror_fen(fen));
                assert_eq!(
                    evaluator.evaluate_white(&original),
                    -evaluator.evaluate_white(&mirrored),
                    "{fen}"
                );
                assert_eq!(
                    evaluator.evaluate(&original),
                    evaluator.evaluate(&mirrored),
                    "{fen}"
                );
            }
        }
    }
}
