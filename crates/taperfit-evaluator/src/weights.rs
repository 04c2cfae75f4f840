//! Tunable evaluation parameters in flat and structured form.
//!
//! The tuner mutates weights one index at a time, so the canonical representation is a
//! flat [`WeightVector`] of [`WEIGHT_COUNT`] integers. The evaluator reads the same values
//! through [`EvalWeights`], which groups them into material arrays, piece-square tables,
//! per-phase bonus tables and two scalars.
//!
//! # Layout
//!
//! | Range     | Group                          | Length |
//! |-----------|--------------------------------|--------|
//! | 0..6      | `mat_mg`                       | 6      |
//! | 6..12     | `mat_eg`                       | 6      |
//! | 12..396   | `pst_mg` (6 × 64)              | 384    |
//! | 396..780  | `pst_eg` (6 × 64)              | 384    |
//! | 780..792  | `mob_bonus` (2 × 6)            | 12     |
//! | 792..804  | `king_atk_bonus` (2 × 6)       | 12     |
//! | 804       | `bishop_pair_bonus`            | 1      |
//! | 805       | `stm_bonus`                    | 1      |
//!
//! Converting between the two forms never reorders or drops an element:
//! `WeightVector::from_structured(&v.to_structured()) == v` for every vector.

use std::ops::{Index, Range};

/// Number of piece types (pawn, knight, bishop, rook, queen, king).
pub const PIECE_COUNT: usize = 6;
/// Number of board squares.
pub const SQUARE_COUNT: usize = 64;
/// Number of game phases (middlegame, endgame).
pub const PHASE_COUNT: usize = 2;
/// Total number of tunable weights.
pub const WEIGHT_COUNT: usize = 806;

/// Index of the middlegame row in per-phase tables.
pub const MIDDLEGAME: usize = 0;
/// Index of the endgame row in per-phase tables.
pub const ENDGAME: usize = 1;

pub const PAWN: usize = 0;
pub const KNIGHT: usize = 1;
pub const BISHOP: usize = 2;
pub const ROOK: usize = 3;
pub const QUEEN: usize = 4;
pub const KING: usize = 5;

/// Display names of the piece types, in piece-index order.
pub const PIECE_NAMES: [&str; PIECE_COUNT] = ["Pawn", "Knight", "Bishop", "Rook", "Queen", "King"];

pub const MAT_MG: Range<usize> = 0..6;
pub const MAT_EG: Range<usize> = 6..12;
pub const PST_MG: Range<usize> = 12..396;
pub const PST_EG: Range<usize> = 396..780;
pub const MOB_BONUS: Range<usize> = 780..792;
pub const KING_ATK_BONUS: Range<usize> = 792..804;
pub const BISHOP_PAIR_BONUS: usize = 804;
pub const STM_BONUS: usize = 805;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum LayoutError {
    #[display("weight vector has {actual} values, expected {}", WEIGHT_COUNT)]
    Length { actual: usize },
    #[display("weight group '{group}' has {actual} values, expected {expected}")]
    Group {
        group: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Flat, ordered list of all tunable weights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightVector(Vec<i32>);

impl WeightVector {
    /// Wraps a flat list of weights, checking its length.
    pub fn from_flat(values: Vec<i32>) -> Result<Self, LayoutError> {
        if values.len() != WEIGHT_COUNT {
            return Err(LayoutError::Length {
                actual: values.len(),
            });
        }
        Ok(Self(values))
    }

    /// Returns a vector with every weight set to zero.
    #[must_use]
    pub fn zeros() -> Self {
        Self(vec![0; WEIGHT_COUNT])
    }

    #[must_use]
    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Adds `delta` to the weight at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= WEIGHT_COUNT`.
    pub fn adjust(&mut self, index: usize, delta: i32) {
        self.0[index] += delta;
    }

    /// Splits the flat vector into its named groups.
    #[must_use]
    pub fn to_structured(&self) -> EvalWeights {
        let flat = &self.0;
        EvalWeights {
            mat_mg: to_row(&flat[MAT_MG]),
            mat_eg: to_row(&flat[MAT_EG]),
            pst_mg: to_table(&flat[PST_MG]),
            pst_eg: to_table(&flat[PST_EG]),
            mob_bonus: to_table(&flat[MOB_BONUS]),
            king_atk_bonus: to_table(&flat[KING_ATK_BONUS]),
            bishop_pair_bonus: flat[BISHOP_PAIR_BONUS],
            stm_bonus: flat[STM_BONUS],
        }
    }

    /// Rebuilds the flat vector from its named groups.
    #[must_use]
    pub fn from_structured(weights: &EvalWeights) -> Self {
        let mut flat = Vec::with_capacity(WEIGHT_COUNT);
        flat.extend_from_slice(&weights.mat_mg);
        flat.extend_from_slice(&weights.mat_eg);
        flat.extend_from_slice(weights.pst_mg.as_flattened());
        flat.extend_from_slice(weights.pst_eg.as_flattened());
        flat.extend_from_slice(weights.mob_bonus.as_flattened());
        flat.extend_from_slice(weights.king_atk_bonus.as_flattened());
        flat.push(weights.bishop_pair_bonus);
        flat.push(weights.stm_bonus);
        debug_assert_eq!(flat.len(), WEIGHT_COUNT);
        Self(flat)
    }

    /// Describes the parameter stored at `index`, e.g. `pst_eg[Rook][12]`.
    #[must_use]
    pub fn describe(index: usize) -> String {
        let piece = |i: usize| PIECE_NAMES[i % PIECE_COUNT];
        let phase = |i: usize| if i == MIDDLEGAME { "mg" } else { "eg" };
        match index {
            i if MAT_MG.contains(&i) => format!("mat_mg[{}]", piece(i - MAT_MG.start)),
            i if MAT_EG.contains(&i) => format!("mat_eg[{}]", piece(i - MAT_EG.start)),
            i if PST_MG.contains(&i) => {
                let i = i - PST_MG.start;
                format!("pst_mg[{}][{}]", piece(i / SQUARE_COUNT), i % SQUARE_COUNT)
            }
            i if PST_EG.contains(&i) => {
                let i = i - PST_EG.start;
                format!("pst_eg[{}][{}]", piece(i / SQUARE_COUNT), i % SQUARE_COUNT)
            }
            i if MOB_BONUS.contains(&i) => {
                let i = i - MOB_BONUS.start;
                format!("mob_bonus[{}][{}]", phase(i / PIECE_COUNT), piece(i))
            }
            i if KING_ATK_BONUS.contains(&i) => {
                let i = i - KING_ATK_BONUS.start;
                format!("king_atk_bonus[{}][{}]", phase(i / PIECE_COUNT), piece(i))
            }
            BISHOP_PAIR_BONUS => "bishop_pair_bonus".to_owned(),
            STM_BONUS => "stm_bonus".to_owned(),
            i => format!("<out of range {i}>"),
        }
    }
}

impl Index<usize> for WeightVector {
    type Output = i32;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Structured view of a [`WeightVector`], as read by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalWeights {
    pub mat_mg: [i32; PIECE_COUNT],
    pub mat_eg: [i32; PIECE_COUNT],
    pub pst_mg: [[i32; SQUARE_COUNT]; PIECE_COUNT],
    pub pst_eg: [[i32; SQUARE_COUNT]; PIECE_COUNT],
    pub mob_bonus: [[i32; PIECE_COUNT]; PHASE_COUNT],
    pub king_atk_bonus: [[i32; PIECE_COUNT]; PHASE_COUNT],
    pub bishop_pair_bonus: i32,
    pub stm_bonus: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        WeightVector::zeros().to_structured()
    }
}

fn to_row<const N: usize>(values: &[i32]) -> [i32; N] {
    let mut row = [0; N];
    row.copy_from_slice(values);
    row
}

fn to_table<const N: usize, const M: usize>(values: &[i32]) -> [[i32; N]; M] {
    debug_assert_eq!(values.len(), N * M);
    let mut table = [[0; N]; M];
    for (row, chunk) in table.iter_mut().zip(values.chunks_exact(N)) {
        row.copy_from_slice(chunk);
    }
    table
}
