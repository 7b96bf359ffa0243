//! The data-source seam and format dispatch.

use std::path::Path;

use crate::{MatResultFile, ResultsError, ResultsResult, load_jsonl};

/// Read-only view of one simulation run.
///
/// Implementations never mutate on read; every lookup is by exact name.
pub trait DataSource {
    /// Variable names in file order.
    fn variable_names(&self) -> &[String];

    /// Time samples (seconds) at which `name` was recorded.
    fn time_abscissa(&self, name: &str) -> ResultsResult<Vec<f64>>;

    /// Recorded values of `name`, one per abscissa sample.
    fn values(&self, name: &str) -> ResultsResult<Vec<f64>>;
}

/// Open a result file, picking the reader from the file extension.
pub fn open(path: &Path) -> ResultsResult<Box<dyn DataSource>> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "mat" => Ok(Box::new(MatResultFile::open(path)?)),
        "jsonl" => Ok(Box::new(load_jsonl(path)?)),
        _ => Err(ResultsError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}
