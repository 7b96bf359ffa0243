//! In-memory data source.

use std::collections::HashMap;

use crate::source::DataSource;
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone)]
struct Variable {
    time: Vec<f64>,
    values: Vec<f64>,
}

/// Named series held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    names: Vec<String>,
    variables: HashMap<String, Variable>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a variable. Time and values must have equal length.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        time: Vec<f64>,
        values: Vec<f64>,
    ) -> ResultsResult<()> {
        let name = name.into();
        if time.len() != values.len() {
            return Err(ResultsError::LengthMismatch {
                name,
                time_len: time.len(),
                value_len: values.len(),
            });
        }
        if !self.variables.contains_key(&name) {
            self.names.push(name.clone());
        }
        self.variables.insert(name, Variable { time, values });
        Ok(())
    }

    /// Builder form of [`MemorySource::insert`].
    pub fn with_series(
        mut self,
        name: impl Into<String>,
        time: Vec<f64>,
        values: Vec<f64>,
    ) -> ResultsResult<Self> {
        self.insert(name, time, values)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn get(&self, name: &str) -> ResultsResult<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| ResultsError::UnknownVariable {
                name: name.to_string(),
            })
    }
}

impl DataSource for MemorySource {
    fn variable_names(&self) -> &[String] {
        &self.names
    }

    fn time_abscissa(&self, name: &str) -> ResultsResult<Vec<f64>> {
        Ok(self.get(name)?.time.clone())
    }

    fn values(&self, name: &str) -> ResultsResult<Vec<f64>> {
        Ok(self.get(name)?.values.clone())
    }
}
