//! Texel tuning of evaluation weights.
//!
//! This crate fits the weights of [`taperfit_evaluator`] to a set of positions labeled
//! with game outcomes.
//!
//! # How Tuning Works
//!
//! 1. **Corpus** - Labeled positions are read from a training file ([`corpus`])
//! 2. **Error** - The evaluation of each position is squashed by a logistic curve and
//!    compared with the outcome; the mean squared difference is the error ([`loss`])
//! 3. **Search** - Each weight is nudged by one step in either direction and the change is
//!    kept if the error drops ([`coordinate_search`])
//! 4. **Repeat** - Passes over all weights continue until one pass changes nothing
//!
//! # Architecture
//!
//! ```text
//! training file
//!     ↓ Corpus::load
//! Corpus (read-only)
//!     ↓ scored by
//! mean squared error (serial or fork-join parallel)
//!     ↓ guides
//! CoordinateSearch
//!     ↓ writes every improvement to
//! Checkpoint (weights file)
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use taperfit_evaluator::weights_file;
//! use taperfit_training::{
//!     coordinate_search::{CoordinateSearch, FileCheckpoint, SearchParams},
//!     corpus::Corpus,
//!     loss,
//! };
//!
//! let mut rng = rand::rng();
//! let corpus = Corpus::load("training.txt", 32_000, &mut rng).unwrap();
//! let weights = weights_file::load_weights("weights.json").unwrap();
//! let params = SearchParams::new(1.13, loss::available_units());
//! let report = CoordinateSearch::new(&corpus, weights, params, FileCheckpoint::new("tuned.json"))
//!     .run()
//!     .unwrap();
//! println!("error {} -> {}", report.initial_error, report.final_error);
//! ```

pub mod coordinate_search;
pub mod corpus;
pub mod loss;
