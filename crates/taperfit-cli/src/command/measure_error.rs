use std::time::Instant;

use anyhow::Context;
use taperfit_evaluator::static_evaluator::TaperedEvaluator;
use taperfit_training::loss;

use crate::util::CorpusArg;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct MeasureErrorArg {
    #[clap(flatten)]
    corpus: CorpusArg,
}

pub(crate) fn run(arg: &MeasureErrorArg) -> anyhow::Result<()> {
    let MeasureErrorArg { corpus: corpus_arg } = arg;
    let corpus = corpus_arg.load_corpus()?;
    let evaluator = TaperedEvaluator::new(corpus_arg.load_weights()?.to_structured());
    let k = corpus_arg.k;

    let start = Instant::now();
    let serial = loss::mean_squared_error(&corpus, &evaluator, k);
    let serial_time = start.elapsed();

    let units = corpus_arg.units();
    let start = Instant::now();
    let parallel = loss::parallel_mean_squared_error(&corpus, &evaluator, k, units)
        .context("Parallel error estimate failed")?;
    let parallel_time = start.elapsed();

    println!("Mean squared error:            {serial:.10} in {serial_time:.3?}");
    println!(
        "Mean squared error (parallel): {parallel:.10} in {parallel_time:.3?} ({units} threads)"
    );
    Ok(())
}
