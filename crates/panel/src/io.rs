//! CSV persistence of frames.

use std::{fs, path::Path};

use polars::prelude::*;

use crate::PanelError;

/// Write a frame as CSV with a header row, creating parent directories.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<(), PanelError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;

    tracing::debug!(path = %path.display(), rows = df.height(), "wrote csv");
    Ok(())
}

/// Read a CSV file with a header row into a frame.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_csv(path: impl AsRef<Path>) -> Result<DataFrame, PanelError> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    tracing::debug!(path = %path.display(), rows = df.height(), "read csv");
    Ok(df)
}
