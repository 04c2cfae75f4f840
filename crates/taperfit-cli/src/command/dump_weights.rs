use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context;
use taperfit_evaluator::{
    weights::{EvalWeights, PIECE_NAMES, SQUARE_COUNT},
    weights_file,
};

use crate::util::Output;

const PSQT_ROW_WIDTH: usize = 8;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DumpWeightsArg {
    /// Weights file to print
    #[arg(long, default_value = "tuned_weights.json")]
    weights_file: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &DumpWeightsArg) -> anyhow::Result<()> {
    let DumpWeightsArg {
        weights_file,
        output,
    } = arg;
    let weights = weights_file::load_weights(weights_file)
        .with_context(|| format!("Failed to load weights file: {}", weights_file.display()))?
        .to_structured();

    let mut output = Output::from_output_path(output.clone())?;
    write_c_source(&mut output, &weights)
        .and_then(|()| output.flush())
        .with_context(|| format!("Failed to write C source to {}", output.display_path()))?;
    Ok(())
}

/// Writes the weights as C array initializers for the engine's evaluation source.
fn write_c_source<W>(w: &mut W, weights: &EvalWeights) -> io::Result<()>
where
    W: Write,
{
    writeln!(w, "// Tuned evaluation parameters from Texel Tuner")?;
    writeln!(w, "static const int middleGameMaterial[NB_PIECES] = {{")?;
    write_row(w, &weights.mat_mg)?;
    end_array(w)?;

    writeln!(w, "static const int endGameMaterial[NB_PIECES] = {{")?;
    write_row(w, &weights.mat_eg)?;
    end_array(w)?;

    writeln!(w, "static const int middleGamePSQT[NB_PIECES][64] = {{")?;
    write_psqt(w, &weights.pst_mg)?;
    end_array(w)?;

    writeln!(w, "static const int endGamePSQT[NB_PIECES][64] = {{")?;
    write_psqt(w, &weights.pst_eg)?;
    end_array(w)?;

    writeln!(w, "static const int mobilityBonus[2][NB_PIECES] = {{")?;
    for row in &weights.mob_bonus {
        write_row(w, row)?;
    }
    end_array(w)?;

    writeln!(w, "static const int kingAttackBonus[2][NB_PIECES] = {{")?;
    for row in &weights.king_atk_bonus {
        write_row(w, row)?;
    }
    end_array(w)?;

    writeln!(w, "#define BISHOP_PAIR_BONUS {}", weights.bishop_pair_bonus)?;
    writeln!(w, "#define STM_BONUS {}", weights.stm_bonus)?;
    Ok(())
}

fn write_psqt<W>(w: &mut W, tables: &[[i32; SQUARE_COUNT]]) -> io::Result<()>
where
    W: Write,
{
    for (name, table) in PIECE_NAMES.iter().zip(tables) {
        writeln!(w, "    //{name}s")?;
        for row in table.chunks(PSQT_ROW_WIDTH) {
            write_row(w, row)?;
        }
    }
    Ok(())
}

fn write_row<W>(w: &mut W, values: &[i32]) -> io::Result<()>
where
    W: Write,
{
    let row = values
        .iter()
        .map(i32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(w, "    {row},")
}

fn end_array<W>(w: &mut W) -> io::Result<()>
where
    W: Write,
{
    writeln!(w, "}};")?;
    writeln!(w)
}
