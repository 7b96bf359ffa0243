//! JSON-lines result records.
//!
//! One record per line:
//!
//! ```text
//! {"time_s": 0.0, "values": {"boiler.Q_actual": 12000.0, "roomAir.T": 291.2}}
//! ```
//!
//! A variable's abscissa is the time of every record that carries it, so
//! variables logged at different rates stay consistent with their own time.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::memory::MemorySource;
use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonlRecord {
    pub time_s: f64,
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
}

pub fn load_jsonl(path: &Path) -> ResultsResult<MemorySource> {
    let content = fs::read_to_string(path)?;
    let source = parse_jsonl(&content)?;
    tracing::debug!(
        path = %path.display(),
        variables = source.len(),
        "loaded JSON-lines results"
    );
    Ok(source)
}

pub fn parse_jsonl(content: &str) -> ResultsResult<MemorySource> {
    let mut order: Vec<String> = Vec::new();
    let mut columns: BTreeMap<String, (Vec<f64>, Vec<f64>)> = BTreeMap::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: JsonlRecord =
            serde_json::from_str(line).map_err(|source| ResultsError::JsonLine {
                line: idx + 1,
                source,
            })?;

        for (name, value) in record.values {
            let column = columns.entry(name.clone()).or_insert_with(|| {
                order.push(name);
                (Vec::new(), Vec::new())
            });
            column.0.push(record.time_s);
            column.1.push(value);
        }
    }

    let mut source = MemorySource::new();
    for name in order {
        if let Some((time, values)) = columns.remove(&name) {
            source.insert(name, time, values)?;
        }
    }
    Ok(source)
}
