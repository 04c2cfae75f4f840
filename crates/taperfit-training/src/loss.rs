//! Logistic mean squared error of an evaluator over a corpus.
//!
//! Evaluations are mapped to an expected outcome with
//!
//! ```text
//! sigmoid(e, K) = 1 / (1 + 10^(-K·e/400))
//! ```
//!
//! and compared with the recorded game outcomes. `K` scales centipawns to winning chances
//! and is supplied by the caller.
//!
//! # Parallelization
//!
//! [`parallel_mean_squared_error`] is a fork-join pass: the corpus is split into one
//! contiguous chunk per compute unit, every chunk is summed on its own scoped thread with
//! its own copy of the evaluator, and the partial sums are added once all threads have
//! finished. The corpus is only read. A panicking worker fails the whole call.

use std::{num::NonZeroUsize, thread};

use taperfit_evaluator::static_evaluator::PositionEvaluator;

use crate::corpus::{Corpus, LabeledPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EstimateError {
    #[display("error estimation worker panicked")]
    WorkerFailure,
}

/// Maps an evaluation to the expected outcome for the evaluated side.
#[must_use]
pub fn sigmoid(evaluation: i32, k: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf(-k * f64::from(evaluation) / 400.0))
}

/// Sum of squared prediction errors over `positions`.
pub fn sum_squared_error<E>(positions: &[LabeledPosition], evaluator: &E, k: f64) -> f64
where
    E: PositionEvaluator + ?Sized,
{
    positions
        .iter()
        .map(|position| {
            let predicted = sigmoid(evaluator.evaluate(&position.state), k);
            (position.outcome - predicted).powi(2)
        })
        .sum()
}

/// Mean squared error over the corpus, computed on the calling thread.
///
/// An empty corpus has an error of zero.
pub fn mean_squared_error<E>(corpus: &Corpus, evaluator: &E, k: f64) -> f64
where
    E: PositionEvaluator + ?Sized,
{
    if corpus.is_empty() {
        return 0.0;
    }
    sum_squared_error(corpus.positions(), evaluator, k) / corpus_size(corpus)
}

/// Mean squared error over the corpus, computed on `units` scoped threads.
///
/// Each thread receives its own clone of `evaluator`. Returns
/// [`EstimateError::WorkerFailure`] if any thread panics; no partial result is produced.
pub fn parallel_mean_squared_error<E>(
    corpus: &Corpus,
    evaluator: &E,
    k: f64,
    units: NonZeroUsize,
) -> Result<f64, EstimateError>
where
    E: PositionEvaluator + Clone,
{
    if corpus.is_empty() {
        return Ok(0.0);
    }
    let chunks = corpus.partition(units);
    let joined: Vec<thread::Result<f64>> = thread::scope(|s| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| {
                let evaluator = evaluator.clone();
                s.spawn(move || sum_squared_error(chunk, &evaluator, k))
            })
            .collect();
        // Join every handle before inspecting results so the scope never re-raises a panic.
        handles.into_iter().map(|h| h.join()).collect()
    });
    let mut total = 0.0;
    for partial in joined {
        total += partial.map_err(|_| EstimateError::WorkerFailure)?;
    }
    Ok(total / corpus_size(corpus))
}

/// Number of compute units available to this process.
#[must_use]
pub fn available_units() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

#[expect(clippy::cast_precision_loss)]
fn corpus_size(corpus: &Corpus) -> f64 {
    corpus.len() as f64
}
