//! Read interface to the employee record store.
//!
//! The anomaly pipeline only ever sees a fully materialized batch; sources
//! load everything up front and validate it before handing it over.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::PayrollError;
use crate::record::EmployeeRecord;

/// Anything that can produce a finite batch of employee records.
pub trait RecordSource {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Load and validate the full batch.
    fn load(&self) -> Result<Vec<EmployeeRecord>, PayrollError>;
}

/// Check per-record value ranges and id uniqueness across the batch.
pub fn validate_batch(records: &[EmployeeRecord]) -> Result<(), PayrollError> {
    let mut seen = HashSet::with_capacity(records.len());
    for rec in records {
        rec.validate()?;
        if !seen.insert(rec.id) {
            return Err(PayrollError::DuplicateId(rec.id));
        }
    }
    Ok(())
}

// ── In-memory ────────────────────────────────────────────────

/// Source backed by an already-built vector, mostly for tests and embedding.
pub struct InMemorySource {
    records: Vec<EmployeeRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for InMemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn load(&self) -> Result<Vec<EmployeeRecord>, PayrollError> {
        validate_batch(&self.records)?;
        Ok(self.records.clone())
    }
}

// ── JSON file ────────────────────────────────────────────────

/// Source reading an export of the `Employees` table.
///
/// Accepts either a single JSON array of records or JSON Lines (one record
/// object per line, blank lines ignored).
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(content: &str) -> Result<Vec<EmployeeRecord>, PayrollError> {
        let trimmed = content.trim_start();
        if trimmed.starts_with('[') {
            return Ok(serde_json::from_str(trimmed)?);
        }

        let mut records = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let rec = serde_json::from_str(line).map_err(|e| {
                PayrollError::Serialize(format!("line {}: {}", line_no + 1, e))
            })?;
            records.push(rec);
        }
        Ok(records)
    }
}

impl RecordSource for JsonFileSource {
    fn name(&self) -> &str {
        self.path.to_str().unwrap_or("json-file")
    }

    fn load(&self) -> Result<Vec<EmployeeRecord>, PayrollError> {
        debug!(path = %self.path.display(), "reading employee records");
        let content = std::fs::read_to_string(&self.path)?;
        let records = Self::parse(&content)?;
        validate_batch(&records)?;
        info!(path = %self.path.display(), records = records.len(), "employee records loaded");
        Ok(records)
    }
}
