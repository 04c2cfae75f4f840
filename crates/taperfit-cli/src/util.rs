use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    num::NonZeroUsize,
    path::PathBuf,
};

use anyhow::Context;
use rand::SeedableRng as _;
use rand_pcg::Pcg64;
use taperfit_evaluator::{weights::WeightVector, weights_file};
use taperfit_training::{corpus::Corpus, loss};

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

/// Options shared by every command that scores weights against a training file.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CorpusArg {
    /// Training file with one `<fen> [<outcome>]` record per line
    #[arg(long, default_value = "data.txt")]
    pub training_file: PathBuf,
    /// Weights file to start from
    #[arg(long, default_value = "weights.json")]
    pub weights_file: PathBuf,
    /// Number of positions to sample from the training file
    #[arg(long, default_value_t = 32_000)]
    pub positions: usize,
    /// Logistic scaling constant
    #[arg(long, default_value_t = 1.13)]
    pub k: f64,
    /// Number of threads for the parallel error estimate (defaults to all cores)
    #[arg(long)]
    pub threads: Option<NonZeroUsize>,
    /// Seed for the training file shuffle
    #[arg(long)]
    pub seed: Option<u64>,
}

impl CorpusArg {
    pub fn load_corpus(&self) -> anyhow::Result<Corpus> {
        let corpus = match self.seed {
            Some(seed) => {
                let mut rng = Pcg64::seed_from_u64(seed);
                Corpus::load(&self.training_file, self.positions, &mut rng)
            }
            None => Corpus::load(&self.training_file, self.positions, &mut rand::rng()),
        }
        .with_context(|| {
            format!(
                "Failed to load training file: {}",
                self.training_file.display()
            )
        })?;
        if corpus.is_empty() {
            log::warn!("training corpus is empty; every error will be zero");
        }
        Ok(corpus)
    }

    pub fn load_weights(&self) -> anyhow::Result<WeightVector> {
        let weights = weights_file::load_weights(&self.weights_file).with_context(|| {
            format!(
                "Failed to load weights file: {}",
                self.weights_file.display()
            )
        })?;
        log::info!("starting from {}", self.weights_file.display());
        Ok(weights)
    }

    pub fn units(&self) -> NonZeroUsize {
        self.threads.unwrap_or_else(loss::available_units)
    }
}
