//! Resolved signal values.

use std::fmt;

/// Why a requested signal could not be used.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("not found in results")]
    NotFound,

    #[error("read failed: {message}")]
    Read { message: String },

    #[error("{len} samples but the time base has {expected}")]
    LengthMismatch { len: usize, expected: usize },

    #[error("non-finite sample at index {index}")]
    NonFinite { index: usize },

    #[error("no samples")]
    Empty,
}

/// A present series, one value per time-base sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: String,
    values: Vec<f64>,
}

impl Series {
    pub(crate) fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }
}

/// Outcome of resolving one named signal.
///
/// `Missing` is a value like any other: consumers match on it instead of
/// receiving an empty or zero-filled series.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Present(Series),
    Missing { name: String, reason: LookupError },
}

impl Signal {
    pub fn name(&self) -> &str {
        match self {
            Self::Present(series) => series.name(),
            Self::Missing { name, .. } => name,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn present(&self) -> Option<&Series> {
        match self {
            Self::Present(series) => Some(series),
            Self::Missing { .. } => None,
        }
    }

    pub fn as_result(&self) -> Result<&Series, &LookupError> {
        match self {
            Self::Present(series) => Ok(series),
            Self::Missing { reason, .. } => Err(reason),
        }
    }
}

/// Operator-facing notice that a signal resolved as missing.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveWarning {
    pub name: String,
    pub reason: LookupError,
}

impl fmt::Display for ResolveWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            LookupError::NotFound => write!(f, "Variable '{}' not found in results", self.name),
            reason => write!(f, "Variable '{}' unusable: {}", self.name, reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_is_distinct_from_empty() {
        let missing = Signal::Missing {
            name: "boiler.T_outlet".to_string(),
            reason: LookupError::NotFound,
        };
        assert!(!missing.is_present());
        assert!(missing.present().is_none());
        assert_eq!(missing.name(), "boiler.T_outlet");
        assert_eq!(missing.as_result().unwrap_err(), &LookupError::NotFound);
    }

    #[test]
    fn warning_text() {
        let w = ResolveWarning {
            name: "roomAir.T".to_string(),
            reason: LookupError::NotFound,
        };
        assert_eq!(w.to_string(), "Variable 'roomAir.T' not found in results");

        let w = ResolveWarning {
            name: "x".to_string(),
            reason: LookupError::LengthMismatch { len: 2, expected: 5 },
        };
        assert!(w.to_string().contains("2 samples"));
    }
}
