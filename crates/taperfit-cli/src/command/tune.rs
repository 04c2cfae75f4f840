use std::path::PathBuf;

use anyhow::Context;
use taperfit_training::coordinate_search::{CoordinateSearch, FileCheckpoint, SearchParams};

use crate::util::CorpusArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TuneArg {
    #[clap(flatten)]
    corpus: CorpusArg,
    /// Where tuned weights are written after every improvement
    #[arg(long, default_value = "tuned_weights.json")]
    output_file: PathBuf,
    /// Stop after this many passes over the weights
    #[arg(long)]
    max_epochs: Option<usize>,
}

pub(crate) fn run(arg: &TuneArg) -> anyhow::Result<()> {
    let TuneArg {
        corpus: corpus_arg,
        output_file,
        max_epochs,
    } = arg;

    let corpus = corpus_arg.load_corpus()?;
    let weights = corpus_arg.load_weights()?;
    let params = SearchParams {
        max_epochs: *max_epochs,
        ..SearchParams::new(corpus_arg.k, corpus_arg.units())
    };
    log::info!(
        "tuning {} weights on {} positions with K={} using {} threads",
        weights.len(),
        corpus.len(),
        params.k,
        params.units
    );

    let report = CoordinateSearch::new(
        &corpus,
        weights,
        params,
        FileCheckpoint::new(output_file.clone()),
    )
    .run()
    .with_context(|| format!("Tuning failed, last weights are in {}", output_file.display()))?;

    log::info!(
        "{} after {} epochs: {} improvements, error {:.10} -> {:.10}",
        if report.outcome.is_converged() {
            "converged"
        } else {
            "stopped"
        },
        report.epochs,
        report.improvements,
        report.initial_error,
        report.final_error
    );
    Ok(())
}
