use super::period::{PayPeriod, PeriodError};
use super::store::StoreError;

/// Run-level failures. Any of these aborts the whole run.
#[derive(Debug, thiserror::Error)]
pub enum PayrollError {
    #[error("payroll for {period} is closed: months up to the restriction cutoff cannot be generated")]
    RestrictedPeriod { period: PayPeriod },

    #[error(transparent)]
    InvalidPeriod(#[from] PeriodError),

    #[error("payroll store failure: {0}")]
    Store(#[from] StoreError),
}

impl PayrollError {
    /// Machine-readable code returned to callers.
    pub fn code(&self) -> &'static str {
        match self {
            PayrollError::RestrictedPeriod { .. } => "TIME_RESTRICTION",
            PayrollError::InvalidPeriod(_) => "INVALID_PERIOD",
            PayrollError::Store(_) => "GENERATION_FAILED",
        }
    }
}

/// Failure of one employee's unit of work. Logged and skipped by the run.
#[derive(Debug, thiserror::Error)]
pub enum EmployeeError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
