//! Reading raw record batches from disk.
//!
//! A batch file is either a JSON array of records or JSON Lines, one record
//! per line. Each read produces an independent batch.

use crate::snapshot::types::RawRecord;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading a batch file.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Parse batch content held in memory.
///
/// Only a JSON array that fails to parse is an error. Unparseable lines and
/// elements that are not objects are dropped with a warning.
pub fn parse_records(content: &str) -> Result<Vec<RawRecord>, SourceError> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        let values: Vec<Value> =
            serde_json::from_str(trimmed).map_err(|e| SourceError::Parse {
                line: e.line(),
                message: e.to_string(),
            })?;
        return Ok(values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| to_record(value, index + 1))
            .collect());
    }

    let mut records = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => records.extend(to_record(&value, index + 1)),
            Err(e) => tracing::warn!(line = index + 1, error = %e, "skipping unparseable line"),
        }
    }
    Ok(records)
}

fn to_record(value: &Value, position: usize) -> Option<RawRecord> {
    let record = RawRecord::from_value(value);
    if record.is_none() {
        tracing::warn!(position, "dropping batch element that is not an object");
    }
    record
}

/// Read a batch file.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>, SourceError> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_records(&content)?;
    tracing::debug!(path = %path.display(), count = records.len(), "read raw records");
    Ok(records)
}
