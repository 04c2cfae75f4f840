//! Coordinate search over the weight vector.
//!
//! The search perturbs one weight at a time by a fixed step and keeps any change that
//! strictly lowers the mean squared error on the corpus:
//!
//! 1. Start from the loaded weights and their (serial) error
//! 2. For each index in ascending order, try `+step` (scored with the parallel estimator)
//! 3. If that does not improve, try `-step` on the same index (scored serially)
//! 4. Every accepted change is written to the checkpoint immediately
//! 5. After a full pass (an epoch), save once more; stop when an epoch accepted nothing
//!
//! The two probes of one index deliberately use different estimators. Their summation
//! order differs, so the results can differ in the last bits and that can change which
//! probes are accepted.

use std::{num::NonZeroUsize, path::PathBuf};

use taperfit_evaluator::{
    static_evaluator::TaperedEvaluator,
    weights::WeightVector,
    weights_file::{self, WeightsFileError},
};

use crate::{
    corpus::Corpus,
    loss::{self, EstimateError},
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SearchError {
    #[display("failed to estimate error")]
    Estimate(EstimateError),
    #[display("failed to save weights")]
    Checkpoint(WeightsFileError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SearchState {
    #[default]
    Idle,
    Probing,
    Accepted,
    Converged,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchParams {
    /// Logistic scaling constant.
    pub k: f64,
    pub step: i32,
    /// Compute units used by the parallel estimator.
    pub units: NonZeroUsize,
    /// Stop after this many epochs even if the last one still improved.
    pub max_epochs: Option<usize>,
}

impl SearchParams {
    #[must_use]
    pub fn new(k: f64, units: NonZeroUsize) -> Self {
        Self {
            k,
            step: 1,
            units,
            max_epochs: None,
        }
    }
}

/// Destination for the current best weights.
pub trait Checkpoint {
    fn save(&mut self, weights: &WeightVector) -> Result<(), WeightsFileError>;
}

/// Writes the weights as a JSON weight document.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }
}

impl Checkpoint for FileCheckpoint {
    fn save(&mut self, weights: &WeightVector) -> Result<(), WeightsFileError> {
        weights_file::save_weights(&self.path, weights)?;
        log::info!("saved weights to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SearchOutcome {
    /// An epoch passed without any accepted change.
    Converged,
    /// The epoch limit was reached.
    EpochLimit,
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub weights: WeightVector,
    pub epochs: usize,
    pub improvements: usize,
    pub initial_error: f64,
    pub final_error: f64,
    pub outcome: SearchOutcome,
}

#[derive(Debug)]
pub struct CoordinateSearch<'a, C> {
    corpus: &'a Corpus,
    params: SearchParams,
    checkpoint: C,
    state: SearchState,
    best_weights: WeightVector,
    best_error: f64,
    initial_error: f64,
    epochs: usize,
    improvements: usize,
}

impl<'a, C> CoordinateSearch<'a, C>
where
    C: Checkpoint,
{
    pub fn new(
        corpus: &'a Corpus,
        weights: WeightVector,
        params: SearchParams,
        checkpoint: C,
    ) -> Self {
        let best_error = loss::mean_squared_error(corpus, &evaluator_for(&weights), params.k);
        log::info!("initial error: {best_error:.10}");
        Self {
            corpus,
            params,
            checkpoint,
            state: SearchState::Idle,
            best_weights: weights,
            best_error,
            initial_error: best_error,
            epochs: 0,
            improvements: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> SearchState {
        self.state
    }

    #[must_use]
    pub fn best_weights(&self) -> &WeightVector {
        &self.best_weights
    }

    #[must_use]
    pub fn best_error(&self) -> f64 {
        self.best_error
    }

    /// Probes every weight once. Returns the number of accepted changes.
    pub fn run_epoch(&mut self) -> Result<usize, SearchError> {
        let epoch = self.epochs;
        let step = self.params.step;
        let mut accepted = 0;

        for index in 0..self.best_weights.len() {
            self.state = SearchState::Probing;
            let mut candidate = self.best_weights.clone();

            candidate.adjust(index, step);
            let error = loss::parallel_mean_squared_error(
                self.corpus,
                &evaluator_for(&candidate),
                self.params.k,
                self.params.units,
            )?;
            log::debug!(
                "epoch {epoch} index {index} (+{step}): error {error:.10}, best {:.10}",
                self.best_error
            );
            if error < self.best_error {
                self.accept(epoch, index, candidate, error)?;
                accepted += 1;
                continue;
            }

            candidate.adjust(index, -2 * step);
            let error =
                loss::mean_squared_error(self.corpus, &evaluator_for(&candidate), self.params.k);
            log::debug!(
                "epoch {epoch} index {index} (-{step}): error {error:.10}, best {:.10}",
                self.best_error
            );
            if error < self.best_error {
                self.accept(epoch, index, candidate, error)?;
                accepted += 1;
            }
        }

        self.epochs += 1;
        self.improvements += accepted;
        self.checkpoint.save(&self.best_weights)?;
        log::info!(
            "epoch {epoch} finished: {accepted} improvements, error {:.10}",
            self.best_error
        );
        Ok(accepted)
    }

    /// Runs epochs until one of them accepts nothing or the epoch limit is hit.
    pub fn run(mut self) -> Result<SearchReport, SearchError> {
        let outcome = loop {
            if self.params.max_epochs.is_some_and(|max| self.epochs >= max) {
                log::info!("stopping after {} epochs", self.epochs);
                break SearchOutcome::EpochLimit;
            }
            if self.run_epoch()? == 0 {
                self.state = SearchState::Converged;
                log::info!("converged after {} epochs", self.epochs);
                break SearchOutcome::Converged;
            }
        };
        self.checkpoint.save(&self.best_weights)?;

        Ok(SearchReport {
            weights: self.best_weights,
            epochs: self.epochs,
            improvements: self.improvements,
            initial_error: self.initial_error,
            final_error: self.best_error,
            outcome,
        })
    }

    fn accept(
        &mut self,
        epoch: usize,
        index: usize,
        candidate: WeightVector,
        error: f64,
    ) -> Result<(), SearchError> {
        log::info!(
            "epoch {epoch}: {} {} -> {}, error {:.10} -> {error:.10}",
            WeightVector::describe(index),
            self.best_weights[index],
            candidate[index],
            self.best_error
        );
        self.state = SearchState::Accepted;
        self.best_weights = candidate;
        self.best_error = error;
        self.checkpoint.save(&self.best_weights)?;
        Ok(())
    }
}

fn evaluator_for(weights: &WeightVector) -> TaperedEvaluator {
    TaperedEvaluator::new(weights.to_structured())
}
