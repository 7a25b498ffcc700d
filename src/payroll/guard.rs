use super::error::PayrollError;
use super::period::PayPeriod;

/// Months up to and including this one are closed for generation.
pub const DEFAULT_RESTRICTED_THROUGH: &str = "2025-06";

/// Refuses runs for closed payroll months before anything is written.
#[derive(Debug, Clone, Copy)]
pub struct TimeWindowGuard {
    restricted_through: PayPeriod,
}

impl TimeWindowGuard {
    pub fn new(restricted_through: PayPeriod) -> Self {
        Self { restricted_through }
    }

    pub fn check(&self, period: PayPeriod) -> Result<(), PayrollError> {
        if period <= self.restricted_through {
            tracing::warn!(%period, cutoff = %self.restricted_through, "Rejected payroll run for closed month");
            return Err(PayrollError::RestrictedPeriod { period });
        }
        Ok(())
    }
}
