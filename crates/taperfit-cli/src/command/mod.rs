use clap::{Parser, Subcommand};

use self::{dump_weights::DumpWeightsArg, measure_error::MeasureErrorArg, tune::TuneArg};

mod dump_weights;
mod measure_error;
mod tune;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Tune evaluation weights against a training file
    Tune(#[clap(flatten)] TuneArg),
    /// Measure the error of a weights file with both estimators
    #[command(name = "error")]
    MeasureError(#[clap(flatten)] MeasureErrorArg),
    /// Print a weights file as C source
    #[command(name = "dump")]
    DumpWeights(#[clap(flatten)] DumpWeightsArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    match args.mode {
        Mode::Tune(arg) => tune::run(&arg)?,
        Mode::MeasureError(arg) => measure_error::run(&arg)?,
        Mode::DumpWeights(arg) => dump_weights::run(&arg)?,
    }
    Ok(())
}
