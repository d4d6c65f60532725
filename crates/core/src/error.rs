use thiserror::Error;

use crate::record::EmployeeId;

#[derive(Error, Debug)]
pub enum PayrollError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Invalid record {id}: {reason}")]
    InvalidRecord { id: EmployeeId, reason: String },

    #[error("Duplicate employee id: {0}")]
    DuplicateId(EmployeeId),
}

impl From<serde_json::Error> for PayrollError {
    fn from(e: serde_json::Error) -> Self {
        PayrollError::Serialize(e.to_string())
    }
}
