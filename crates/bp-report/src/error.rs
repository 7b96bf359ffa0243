//! Error types for report generation.

use std::path::PathBuf;

/// Errors that stop a report run.
///
/// A signal that cannot be read is not one of these: it becomes
/// [`crate::Signal::Missing`] at the resolver and the run continues.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Could not extract time vector: {reason}")]
    NoTimeBase { reason: String },

    #[error("Failed to access layout file: {}", path.display())]
    LayoutIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Layout YAML error: {0}")]
    LayoutYaml(#[from] serde_yaml::Error),

    #[error("Layout validation failed: {0}")]
    LayoutInvalid(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Render error: {message}")]
    Render { message: String },
}

/// Result type for bp-report operations.
pub type ReportResult<T> = Result<T, ReportError>;

impl From<bp_results::ResultsError> for ReportError {
    fn from(err: bp_results::ResultsError) -> Self {
        ReportError::Results(err.to_string())
    }
}
