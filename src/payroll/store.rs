use std::sync::Arc;

use rust_decimal::Decimal;

use crate::model::adjustment::{AttendanceDeduction, PromotionPenalty, SocialInsurance, SubsidySummary};
use crate::model::employee::{CommissionTrack, Employee, Rank};
use crate::model::expense::ExpenseLedgerEntry;
use crate::model::inspection::InspectionRecord;
use crate::model::salary::MonthlySalaryRecord;

use super::commission::EntryCommission;
use super::period::{DateWindow, PayPeriod};
use super::rate_table::RateTable;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// Whether an upsert inserted a new row or replaced an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// Everything the payroll run reads from and writes to.
///
/// Adjustment lookups return `Ok(None)` when a source has no row for the
/// employee and month; callers decide the fallback.
#[allow(async_fn_in_trait)]
pub trait PayrollStore {
    async fn employees(&self) -> Result<Vec<Employee>, StoreError>;

    /// Every ledger entry of `salesperson` whose charge date is inside `window`, any status.
    async fn ledger_entries(
        &self,
        salesperson: &str,
        window: DateWindow,
    ) -> Result<Vec<ExpenseLedgerEntry>, StoreError>;

    /// Zeroes the commission breakdown of all entries charged inside `window`.
    async fn clear_ledger_commissions(&self, window: DateWindow) -> Result<u64, StoreError>;

    async fn write_entry_commissions(&self, commissions: &[EntryCommission]) -> Result<(), StoreError>;

    async fn rate_table(&self, track: CommissionTrack) -> Result<Arc<RateTable>, StoreError>;

    async fn performance_commission(&self, rank: Rank) -> Result<Option<Decimal>, StoreError>;

    async fn attendance_deduction(
        &self,
        name: &str,
        period: PayPeriod,
    ) -> Result<Option<AttendanceDeduction>, StoreError>;

    async fn subsidy_summary(&self, name: &str, period: PayPeriod) -> Result<Option<SubsidySummary>, StoreError>;

    async fn social_insurance(&self, name: &str, period: PayPeriod) -> Result<Option<SocialInsurance>, StoreError>;

    async fn promotion_penalty(&self, name: &str, period: PayPeriod) -> Result<Option<PromotionPenalty>, StoreError>;

    /// Sum of deposits deducted inside `window`; `None` when there are none.
    async fn deposit_total(&self, name: &str, window: DateWindow) -> Result<Option<Decimal>, StoreError>;

    async fn inspections(&self, window: DateWindow) -> Result<Vec<InspectionRecord>, StoreError>;

    async fn salary_record(&self, name: &str, period: PayPeriod) -> Result<Option<MonthlySalaryRecord>, StoreError>;

    /// Inserts or replaces the record keyed by (name, month). Confirmation state is never overwritten.
    async fn upsert_salary(&self, record: &MonthlySalaryRecord) -> Result<UpsertOutcome, StoreError>;

    async fn update_base_salary(&self, name: &str, base_salary: Decimal) -> Result<(), StoreError>;
}
