//! Weight model and static evaluation for Texel tuning.
//!
//! This crate replicates the evaluation function of the target chess engine so that its
//! parameters can be tuned offline. It has three parts:
//!
//! 1. **Weights** ([`weights`]) - the flat [`WeightVector`](weights::WeightVector) the tuner
//!    mutates, and its structured view [`EvalWeights`](weights::EvalWeights)
//! 2. **Weight documents** ([`weights_file`]) - loading and saving weights as JSON
//! 3. **Evaluation** ([`static_evaluator`]) - the tapered evaluation of a position given a
//!    set of weights, built on the board queries in [`board_state`]
//!
//! # Architecture
//!
//! ```text
//! weights file (JSON)
//!     ↓ load
//! WeightVector (806 integers)
//!     ↓ to_structured
//! EvalWeights
//!     ↓ used by
//! TaperedEvaluator ← BoardState (parsed FEN)
//!     ↓ produces
//! score relative to the side to move
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use taperfit_evaluator::{
//!     board_state::BoardState,
//!     static_evaluator::{PositionEvaluator, TaperedEvaluator},
//!     weights_file,
//! };
//!
//! let weights = weights_file::load_weights("weights.json").unwrap();
//! let evaluator = TaperedEvaluator::new(weights.to_structured());
//! let state = BoardState::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
//!     .unwrap();
//! let score = evaluator.evaluate(&state);
//! ```

pub mod board_state;
pub mod static_evaluator;
pub mod weights;
pub mod weights_file;
