//! Publishing the artifact list.

use std::io::Write;
use std::path::Path;

use crate::errors::GdxError;

/// Key under which the list is written to an output file.
pub const OUTPUT_KEY: &str = "artifacts";

/// Appends `artifacts=<list>` as one line to `path`, creating it if needed.
///
/// This is the format GitHub Actions reads from `$GITHUB_OUTPUT`.
///
/// # Errors
///
/// Returns `GdxError::Io` if the file cannot be opened or written.
pub fn append_output(path: &Path, list: &str) -> Result<(), GdxError> {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| GdxError::io_error(format!("Failed to open {}", path.display()), e))?;
    writeln!(file, "{OUTPUT_KEY}={list}")
        .map_err(|e| GdxError::io_error(format!("Failed to write {}", path.display()), e))
}
