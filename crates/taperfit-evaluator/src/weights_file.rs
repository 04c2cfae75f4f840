//! JSON weight documents.
//!
//! A document stores the structured weights under the keys `mat_mg`, `mat_eg`, `pst_mg`,
//! `pst_eg`, `mob_bonus`, `king_atk_bonus`, `bishop_pair_bonus` and `stm_bonus`. Tables are
//! written nested (`pst_*` as 6 arrays of 64, bonus tables as 2 arrays of 6). Older
//! documents that store tables already flattened are accepted on load.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::weights::{
    EvalWeights, LayoutError, PHASE_COUNT, PIECE_COUNT, SQUARE_COUNT, WEIGHT_COUNT, WeightVector,
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum WeightsFileError {
    #[display("failed to open weights file {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("failed to parse weights file {}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("invalid weight layout in {}", path.display())]
    Layout { path: PathBuf, source: LayoutError },
    #[display("failed to write weights file {}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

/// A weight table stored either nested (rows) or flat.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum WeightTable {
    Nested(Vec<Vec<i32>>),
    Flat(Vec<i32>),
}

impl WeightTable {
    fn nested<const N: usize>(rows: &[[i32; N]]) -> Self {
        Self::Nested(rows.iter().map(|row| row.to_vec()).collect())
    }

    /// Appends the table to `out` in row-major order, checking its shape.
    fn flatten_into(
        &self,
        group: &'static str,
        rows: usize,
        cols: usize,
        out: &mut Vec<i32>,
    ) -> Result<(), LayoutError> {
        match self {
            Self::Nested(nested) => {
                check_len(group, rows, nested.len())?;
                for row in nested {
                    check_len(group, cols, row.len())?;
                    out.extend_from_slice(row);
                }
            }
            Self::Flat(flat) => {
                check_len(group, rows * cols, flat.len())?;
                out.extend_from_slice(flat);
            }
        }
        Ok(())
    }
}

/// On-disk shape of the structured weights.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct WeightDocument {
    pub mat_mg: Vec<i32>,
    pub mat_eg: Vec<i32>,
    pub pst_mg: WeightTable,
    pub pst_eg: WeightTable,
    pub mob_bonus: WeightTable,
    pub king_atk_bonus: WeightTable,
    pub bishop_pair_bonus: i32,
    pub stm_bonus: i32,
}

impl WeightDocument {
    pub fn open<P>(path: P) -> Result<Self, WeightsFileError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| WeightsFileError::Open {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| WeightsFileError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Writes the document, replacing any existing file only once the write has succeeded.
    pub fn save<P>(&self, path: P) -> Result<(), WeightsFileError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let write_err = |source| WeightsFileError::Write {
            path: path.to_owned(),
            source,
        };
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let file = File::create(&tmp_path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(io::Error::from)
            .map_err(write_err)?;
        writeln!(writer).map_err(write_err)?;
        writer.flush().map_err(write_err)?;
        drop(writer);
        fs::rename(&tmp_path, path).map_err(write_err)?;
        Ok(())
    }

    /// Flattens the document into layout order.
    pub fn to_weight_vector(&self) -> Result<WeightVector, LayoutError> {
        let mut flat = Vec::with_capacity(WEIGHT_COUNT);
        check_len("mat_mg", PIECE_COUNT, self.mat_mg.len())?;
        flat.extend_from_slice(&self.mat_mg);
        check_len("mat_eg", PIECE_COUNT, self.mat_eg.len())?;
        flat.extend_from_slice(&self.mat_eg);
        self.pst_mg
            .flatten_into("pst_mg", PIECE_COUNT, SQUARE_COUNT, &mut flat)?;
        self.pst_eg
            .flatten_into("pst_eg", PIECE_COUNT, SQUARE_COUNT, &mut flat)?;
        self.mob_bonus
            .flatten_into("mob_bonus", PHASE_COUNT, PIECE_COUNT, &mut flat)?;
        self.king_atk_bonus
            .flatten_into("king_atk_bonus", PHASE_COUNT, PIECE_COUNT, &mut flat)?;
        flat.push(self.bishop_pair_bonus);
        flat.push(self.stm_bonus);
        WeightVector::from_flat(flat)
    }
}

impl From<&EvalWeights> for WeightDocument {
    fn from(weights: &EvalWeights) -> Self {
        Self {
            mat_mg: weights.mat_mg.to_vec(),
            mat_eg: weights.mat_eg.to_vec(),
            pst_mg: WeightTable::nested(&weights.pst_mg),
            pst_eg: WeightTable::nested(&weights.pst_eg),
            mob_bonus: WeightTable::nested(&weights.mob_bonus),
            king_atk_bonus: WeightTable::nested(&weights.king_atk_bonus),
            bishop_pair_bonus: weights.bishop_pair_bonus,
            stm_bonus: weights.stm_bonus,
        }
    }
}

/// Loads a weight document and flattens it.
pub fn load_weights<P>(path: P) -> Result<WeightVector, WeightsFileError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let weights = WeightDocument::open(path)?
        .to_weight_vector()
        .map_err(|source| WeightsFileError::Layout {
            path: path.to_owned(),
            source,
        })?;
    log::debug!("loaded {} weights from {}", weights.len(), path.display());
    Ok(weights)
}

/// Saves `weights` as a nested weight document.
pub fn save_weights<P>(path: P, weights: &WeightVector) -> Result<(), WeightsFileError>
where
    P: AsRef<Path>,
{
    WeightDocument::from(&weights.to_structured()).save(path)
}

fn check_len(group: &'static str, expected: usize, actual: usize) -> Result<(), LayoutError> {
    if expected == actual {
        Ok(())
    } else {
        Err(LayoutError::Group {
            group,
            expected,
            actual,
        })
    }
}
