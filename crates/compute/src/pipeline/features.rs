use std::collections::{BTreeSet, HashMap};

use payroll_core::EmployeeRecord;
use serde::{Deserialize, Serialize};

use crate::error::AnomalyError;

/// Numeric fields in encoding order. The identifier is optionally
/// prepended (see [`EncoderOptions::include_identifier`]).
pub const NUMERIC_FIELDS: [&str; 4] = ["salary", "commission_pct", "department_id", "manager_id"];

/// Fixed-dimension numeric representation of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedVector(Vec<f64>);

impl EncodedVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for EncodedVector {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl From<Vec<f64>> for EncodedVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Job-role code → one-hot column index, frozen at fit time.
///
/// Codes are indexed in sorted order so that two builds over the same batch
/// (in any record order) agree.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleVocabulary {
    roles: Vec<String>,
    index: HashMap<String, usize>,
}

impl RoleVocabulary {
    /// Collect the distinct job roles of a batch in one scan.
    pub fn build(records: &[EmployeeRecord]) -> Result<Self, AnomalyError> {
        if records.is_empty() {
            return Err(AnomalyError::EmptyBatch);
        }

        let distinct: BTreeSet<&str> = records.iter().map(|r| r.job_id.as_str()).collect();
        let roles: Vec<String> = distinct.into_iter().map(str::to_owned).collect();
        let index = roles
            .iter()
            .enumerate()
            .map(|(i, role)| (role.clone(), i))
            .collect();

        Ok(Self { roles, index })
    }

    pub fn index_of(&self, role: &str) -> Option<usize> {
        self.index.get(role).copied()
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderOptions {
    /// Prepend the employee id to the numeric block.
    #[serde(default)]
    pub include_identifier: bool,
}

/// Turns employee records into [`EncodedVector`]s.
///
/// Layout: `[id?] salary commission_pct department_id manager_id | one-hot(job_id)`.
///
/// Absent commission and manager encode as 0.0, the same as an explicit zero.
/// The scorer cannot tell "no commission" from "zero commission"; records with
/// many absent fields are pulled toward the origin of those columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder {
    options: EncoderOptions,
}

impl FeatureEncoder {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> EncoderOptions {
        self.options
    }

    /// Width of the numeric block.
    pub fn numeric_dim(&self) -> usize {
        NUMERIC_FIELDS.len() + usize::from(self.options.include_identifier)
    }

    /// Full vector dimension D for a given vocabulary.
    pub fn dim(&self, vocabulary: &RoleVocabulary) -> usize {
        self.numeric_dim() + vocabulary.len()
    }

    /// Column labels in encoding order, for diagnostics.
    pub fn feature_names(&self, vocabulary: &RoleVocabulary) -> Vec<String> {
        let mut names = Vec::with_capacity(self.dim(vocabulary));
        if self.options.include_identifier {
            names.push("id".to_owned());
        }
        names.extend(NUMERIC_FIELDS.iter().map(|f| (*f).to_owned()));
        names.extend(vocabulary.roles().iter().map(|r| format!("job_id={}", r)));
        names
    }

    pub fn encode(&self, record: &EmployeeRecord, vocabulary: &RoleVocabulary) -> EncodedVector {
        let mut values = Vec::with_capacity(self.dim(vocabulary));

        if self.options.include_identifier {
            values.push(record.id as f64);
        }
        values.push(record.salary);
        values.push(record.commission_pct.unwrap_or(0.0));
        values.push(record.department_id as f64);
        values.push(record.manager_id.map(|m| m as f64).unwrap_or(0.0));

        let offset = values.len();
        values.resize(offset + vocabulary.len(), 0.0);
        if let Some(i) = vocabulary.index_of(&record.job_id) {
            values[offset + i] = 1.0;
        }

        EncodedVector(values)
    }
}
