use serde::{Deserialize, Serialize};

use crate::error::PayrollError;

/// Employee identifier, unique within a batch.
pub type EmployeeId = i64;

/// Upper bound on a salary; keeps squared deviations well inside f64 range.
pub const MAX_SALARY: f64 = 1e12;

/// One payroll row as read from the record store.
///
/// Optional fields are `None` when the store holds NULL; that is distinct
/// from an explicit zero. Column aliases match the legacy `Employees` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    #[serde(alias = "EmployeeID")]
    pub id: EmployeeId,
    #[serde(alias = "Salary")]
    pub salary: f64,
    #[serde(default, alias = "CommissionPct")]
    pub commission_pct: Option<f64>,
    #[serde(alias = "DepartmentID")]
    pub department_id: i64,
    #[serde(alias = "JobID")]
    pub job_id: String,
    #[serde(default, alias = "ManagerID")]
    pub manager_id: Option<i64>,
}

impl EmployeeRecord {
    pub fn new(id: EmployeeId, salary: f64, department_id: i64, job_id: impl Into<String>) -> Self {
        Self {
            id,
            salary,
            commission_pct: None,
            department_id,
            job_id: job_id.into(),
            manager_id: None,
        }
    }

    pub fn with_commission(mut self, pct: f64) -> Self {
        self.commission_pct = Some(pct);
        self
    }

    pub fn with_manager(mut self, manager_id: i64) -> Self {
        self.manager_id = Some(manager_id);
        self
    }

    /// Check the value ranges a record must satisfy before it enters a batch.
    pub fn validate(&self) -> Result<(), PayrollError> {
        if !self.salary.is_finite() || self.salary < 0.0 {
            return Err(self.invalid(format!("salary must be a non-negative number, got {}", self.salary)));
        }
        if self.salary > MAX_SALARY {
            return Err(self.invalid(format!("salary {} exceeds limit of {}", self.salary, MAX_SALARY)));
        }
        if let Some(pct) = self.commission_pct {
            if !pct.is_finite() || !(0.0..=1.0).contains(&pct) {
                return Err(self.invalid(format!("commission_pct must be within [0, 1], got {}", pct)));
            }
        }
        Ok(())
    }

    fn invalid(&self, reason: String) -> PayrollError {
        PayrollError::InvalidRecord { id: self.id, reason }
    }
}
