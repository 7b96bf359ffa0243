//! bp-results: read-only access to simulation result files.
//!
//! Every reader exposes the same three questions through [`DataSource`]:
//! which variables exist, what is a variable's time abscissa, and what are
//! its values.

pub mod jsonl;
pub mod mat;
pub mod memory;
pub mod source;

pub use jsonl::{JsonlRecord, load_jsonl, parse_jsonl};
pub use mat::MatResultFile;
pub use memory::MemorySource;
pub use source::{DataSource, open};

use std::path::PathBuf;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error on line {line}: {source}")]
    JsonLine {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Malformed result file: {what}")]
    Malformed { what: String },

    #[error("Variable not found: {name}")]
    UnknownVariable { name: String },

    #[error("Variable {name} has {value_len} values but {time_len} time points")]
    LengthMismatch {
        name: String,
        time_len: usize,
        value_len: usize,
    },

    #[error("Unsupported result format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },
}

impl ResultsError {
    pub(crate) fn malformed(what: impl Into<String>) -> Self {
        Self::Malformed { what: what.into() }
    }
}
