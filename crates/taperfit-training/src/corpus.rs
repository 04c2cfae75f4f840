//! Labeled training positions.
//!
//! Training files hold one position per line, a FEN followed by the game outcome in
//! brackets:
//!
//! ```text
//! rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1 [0.5]
//! ```
//!
//! Consecutive lines usually come from the same game, so the lines are shuffled once
//! before parsing. Parsing then stops as soon as the requested number of positions has
//! been collected. The selected subset is therefore whatever the shuffle placed first,
//! not an independent uniform sample.

use std::{
    fs, io,
    num::{NonZeroUsize, ParseFloatError},
    path::{Path, PathBuf},
};

use rand::{Rng, seq::SliceRandom as _};
use taperfit_evaluator::board_state::{BoardState, ParseFenError};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ParseLineError {
    #[display("missing outcome token")]
    MissingOutcome,
    #[display("outcome token '{token}' is not in brackets")]
    UnbracketedOutcome { token: String },
    #[display("invalid outcome '{token}'")]
    InvalidOutcome { token: String, source: ParseFloatError },
    #[display("outcome {value} is outside [0, 1]")]
    OutcomeOutOfRange { value: f64 },
    #[display("invalid position")]
    InvalidPosition(ParseFenError),
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CorpusError {
    #[display("failed to read training file {}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[display("line {line} of {}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        source: ParseLineError,
    },
}

/// A position and the outcome of the game it was taken from.
#[derive(Debug, Clone)]
pub struct LabeledPosition {
    pub state: BoardState,
    /// 1.0 for a white win, 0.5 for a draw and 0.0 for a black win.
    pub outcome: f64,
}

impl LabeledPosition {
    /// Parses a `<fen> [<outcome>]` line.
    pub fn parse_line(line: &str) -> Result<Self, ParseLineError> {
        let (fen, token) = line
            .trim_end()
            .rsplit_once(' ')
            .ok_or(ParseLineError::MissingOutcome)?;
        let inner = token
            .strip_prefix('[')
            .and_then(|t| t.strip_suffix(']'))
            .ok_or_else(|| ParseLineError::UnbracketedOutcome {
                token: token.to_owned(),
            })?;
        let outcome: f64 = inner
            .parse()
            .map_err(|source| ParseLineError::InvalidOutcome {
                token: token.to_owned(),
                source,
            })?;
        if !(0.0..=1.0).contains(&outcome) {
            return Err(ParseLineError::OutcomeOutOfRange { value: outcome });
        }
        let state = BoardState::from_fen(fen).map_err(ParseLineError::InvalidPosition)?;
        Ok(Self { state, outcome })
    }
}

/// The set of positions the tuner fits against. Fixed once loaded.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    positions: Vec<LabeledPosition>,
}

impl Corpus {
    #[must_use]
    pub fn new(positions: Vec<LabeledPosition>) -> Self {
        Self { positions }
    }

    /// Reads a training file, shuffles its lines and parses up to `max_positions` of them.
    pub fn load<P, R>(path: P, max_positions: usize, rng: &mut R) -> Result<Self, CorpusError>
    where
        P: AsRef<Path>,
        R: Rng + ?Sized,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| CorpusError::Read {
            path: path.to_owned(),
            source,
        })?;
        let mut lines: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| (i + 1, line))
            .collect();
        lines.shuffle(rng);

        let mut positions = Vec::with_capacity(max_positions.min(lines.len()));
        for (line_no, line) in lines {
            if positions.len() >= max_positions {
                break;
            }
            let position = LabeledPosition::parse_line(line).map_err(|source| CorpusError::Parse {
                path: path.to_owned(),
                line: line_no,
                source,
            })?;
            positions.push(position);
        }

        if positions.len() < max_positions {
            log::warn!(
                "requested {max_positions} positions but {} only has {}",
                path.display(),
                positions.len()
            );
        }
        log::info!(
            "loaded {} training positions from {}",
            positions.len(),
            path.display()
        );
        Ok(Self { positions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn positions(&self) -> &[LabeledPosition] {
        &self.positions
    }

    /// Splits the corpus into contiguous chunks, one per compute unit.
    ///
    /// Every chunk but the last has `len / chunks` positions; the last one also takes the
    /// remainder. Never produces more chunks than positions, and always at least one.
    #[must_use]
    pub fn partition(&self, units: NonZeroUsize) -> Vec<&[LabeledPosition]> {
        let count = units.get().min(self.len()).max(1);
        let size = self.len() / count;
        (0..count)
            .map(|i| {
                let start = i * size;
                let end = if i + 1 == count {
                    self.len()
                } else {
                    start + size
                };
                &self.positions[start..end]
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use rand::SeedableRng as _;
    use rand_pcg::Pcg64;

    use super::*;

    const FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), contents).unwrap();
        file
    }

    fn corpus_of(count: usize) -> Corpus {
        let state = BoardState::from_fen(FEN).unwrap();
        Corpus::new(
            (0..count)
                .map(|_| LabeledPosition {
                    state: state.clone(),
                    outcome: 0.5,
                })
                .collect(),
        )
    }

    #[test]
    fn test_parse_line() {
        let position = LabeledPosition::parse_line(&format!("{FEN} [1.0]")).unwrap();
        assert!((position.outcome - 1.0).abs() < f64::EPSILON);
        let position = LabeledPosition::parse_line(&format!("{FEN} [0.5]\r")).unwrap();
        assert!((position.outcome - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(matches!(
            LabeledPosition::parse_line("[1.0]"),
            Err(ParseLineError::MissingOutcome)
        ));
        assert!(matches!(
            LabeledPosition::parse_line(&format!("{FEN} 1.0")),
            Err(ParseLineError::UnbracketedOutcome { .. })
        ));
        assert!(matches!(
            LabeledPosition::parse_line(&format!("{FEN} [draw]")),
            Err(ParseLineError::InvalidOutcome { .. })
        ));
        assert!(matches!(
            LabeledPosition::parse_line(&format!("{FEN} [2.0]")),
            Err(ParseLineError::OutcomeOutOfRange { .. })
        ));
        let bad_piece = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNZ w - - 0 1 [1.0]";
        assert!(matches!(
            LabeledPosition::parse_line(bad_piece),
            Err(ParseLineError::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_load_caps_position_count() {
        let mut contents = String::new();
        for i in 0..50 {
            let outcome = ["0.0", "0.5", "1.0"][i % 3];
            writeln!(contents, "{FEN} [{outcome}]").unwrap();
        }
        let file = write_file(&contents);
        let mut rng = Pcg64::seed_from_u64(1);
        let corpus = Corpus::load(file.path(), 20, &mut rng).unwrap();
        assert_eq!(corpus.len(), 20);
    }

    #[test]
    fn test_load_insufficient_positions_is_not_fatal() {
        let file = write_file(&format!("{FEN} [1.0]\n\n{FEN} [0.0]\n"));
        let mut rng = Pcg64::seed_from_u64(1);
        let corpus = Corpus::load(file.path(), 100, &mut rng).unwrap();
        assert_eq!(corpus.len(), 2);
    }

    #[test]
    fn test_load_shuffle_is_seeded() {
        let mut contents = String::new();
        for i in 0..40 {
            writeln!(contents, "{FEN} [{}]", f64::from(i) / 40.0).unwrap();
        }
        let file = write_file(&contents);
        let outcomes = |seed| {
            let mut rng = Pcg64::seed_from_u64(seed);
            Corpus::load(file.path(), 40, &mut rng)
                .unwrap()
                .positions()
                .iter()
                .map(|p| p.outcome)
                .collect::<Vec<_>>()
        };
        assert_eq!(outcomes(9), outcomes(9));
        let mut sorted = outcomes(9);
        sorted.sort_by(f64::total_cmp);
        let in_file_order: Vec<f64> = (0..40).map(|i| f64::from(i) / 40.0).collect();
        assert_eq!(sorted, in_file_order);
    }

    #[test]
    fn test_load_reports_line_number() {
        let file = write_file(&format!("{FEN} [1.0]\n{FEN} [oops]\n"));
        let mut rng = Pcg64::seed_from_u64(1);
        match Corpus::load(file.path(), 10, &mut rng) {
            Err(CorpusError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let mut rng = Pcg64::seed_from_u64(1);
        assert!(matches!(
            Corpus::load("/nonexistent/training.txt", 10, &mut rng),
            Err(CorpusError::Read { .. })
        ));
    }

    #[test]
    fn test_partition_sizes() {
        let corpus = corpus_of(10);
        let units = NonZeroUsize::new(3).unwrap();
        let sizes: Vec<usize> = corpus.partition(units).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 3, 4]);

        let units = NonZeroUsize::new(16).unwrap();
        let sizes: Vec<usize> = corpus.partition(units).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![1; 10]);

        let sizes: Vec<usize> = corpus_of(0)
            .partition(units)
            .iter()
            .map(|c| c.len())
            .collect();
        assert_eq!(sizes, vec![0]);
    }
}
