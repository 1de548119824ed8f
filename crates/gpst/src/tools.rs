//! File-level operations behind the `gpst` command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::{
    calculator::{CalculatorConfig, calculate_additional_data_with},
    file_parsers::{FileType, read_track},
    gpx_writer::write_track,
    track::Track,
};

#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Overwrite an existing output without asking.
    pub overwrite: bool,
    /// Skip the derived-metrics calculator.
    pub skip_calculation: bool,
    pub calculator: CalculatorConfig,
}

/// Checks that `path` exists and has a readable activity format.
pub fn verify_in_path(path: &Path) -> Result<FileType> {
    if !path.is_file() {
        bail!("Input file {} does not exist", path.display());
    }
    FileType::from_path(path)
        .with_context(|| format!("Unsupported input file type: {}", path.display()))
}

/// Checks that `path` names a GPX file and may be written. An existing file
/// is only replaced if `overwrite` is set or `confirm` agrees.
pub fn verify_out_path<F>(path: &Path, overwrite: bool, confirm: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    if FileType::from_path(path) != Some(FileType::Gpx) {
        bail!("Output file {} must have a .gpx extension", path.display());
    }
    if path.exists() && !overwrite && !confirm(path)? {
        bail!("Refusing to overwrite {}", path.display());
    }
    Ok(())
}

/// Loads `in_path`, derives additional data and saves the result to
/// `out_path`. Returns the processed track.
pub fn process<F>(in_path: &Path, out_path: &Path, options: &ProcessOptions, confirm: F) -> Result<Track>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    verify_in_path(in_path)?;
    verify_out_path(out_path, options.overwrite, confirm)?;

    let mut track = read_track(in_path)
        .with_context(|| format!("Failed to read {}", in_path.display()))?;
    info!("Loaded {track}");

    if !options.skip_calculation {
        calculate_additional_data_with(&mut track, &options.calculator);
    }

    write_track(&track, out_path)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    info!("Saved {}", out_path.display());

    Ok(track)
}

/// Converts a FIT file to GPX. Without `out_path` the output lands next to
/// the input with a `.gpx` extension.
pub fn convert<F>(in_path: &Path, out_path: Option<&Path>, overwrite: bool, confirm: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> Result<bool>,
{
    if verify_in_path(in_path)? != FileType::Fit {
        bail!("Input file {} is not a FIT file", in_path.display());
    }
    let out_path = out_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| in_path.with_extension("gpx"));
    verify_out_path(&out_path, overwrite, confirm)?;

    let track = read_track(in_path)
        .with_context(|| format!("Failed to read {}", in_path.display()))?;
    write_track(&track, &out_path)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    info!("Converted {} to {}", in_path.display(), out_path.display());

    Ok(out_path)
}
