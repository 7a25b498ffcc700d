pub mod employees;
pub mod ledger;
pub mod rate_tables;
pub mod salary;
pub mod sources;

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;

use crate::model::adjustment::{AttendanceDeduction, PromotionPenalty, SocialInsurance, SubsidySummary};
use crate::model::employee::{CommissionTrack, Employee, Rank};
use crate::model::expense::ExpenseLedgerEntry;
use crate::model::inspection::InspectionRecord;
use crate::model::salary::MonthlySalaryRecord;
use crate::payroll::commission::EntryCommission;
use crate::payroll::period::{DateWindow, PayPeriod};
use crate::payroll::rate_table::RateTable;
use crate::payroll::store::{PayrollStore, StoreError, UpsertOutcome};

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// [`PayrollStore`] over the MySQL business database.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl PayrollStore for MySqlStore {
    async fn employees(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(employees::fetch_all(&self.pool).await?)
    }

    async fn ledger_entries(
        &self,
        salesperson: &str,
        window: DateWindow,
    ) -> Result<Vec<ExpenseLedgerEntry>, StoreError> {
        Ok(ledger::fetch_for_salesperson(&self.pool, salesperson, window).await?)
    }

    async fn clear_ledger_commissions(&self, window: DateWindow) -> Result<u64, StoreError> {
        Ok(ledger::clear_commissions(&self.pool, window).await?)
    }

    async fn write_entry_commissions(&self, commissions: &[EntryCommission]) -> Result<(), StoreError> {
        Ok(ledger::write_commissions(&self.pool, commissions).await?)
    }

    async fn rate_table(&self, track: CommissionTrack) -> Result<Arc<RateTable>, StoreError> {
        rate_tables::rate_table(&self.pool, track).await
    }

    async fn performance_commission(&self, rank: Rank) -> Result<Option<Decimal>, StoreError> {
        Ok(rate_tables::performance_commission(&self.pool, rank).await?)
    }

    async fn attendance_deduction(
        &self,
        name: &str,
        period: PayPeriod,
    ) -> Result<Option<AttendanceDeduction>, StoreError> {
        Ok(sources::attendance_deduction(&self.pool, name, period).await?)
    }

    async fn subsidy_summary(&self, name: &str, period: PayPeriod) -> Result<Option<SubsidySummary>, StoreError> {
        Ok(sources::subsidy_summary(&self.pool, name, period).await?)
    }

    async fn social_insurance(&self, name: &str, period: PayPeriod) -> Result<Option<SocialInsurance>, StoreError> {
        Ok(sources::social_insurance(&self.pool, name, period).await?)
    }

    async fn promotion_penalty(&self, name: &str, period: PayPeriod) -> Result<Option<PromotionPenalty>, StoreError> {
        Ok(sources::promotion_penalty(&self.pool, name, period).await?)
    }

    async fn deposit_total(&self, name: &str, window: DateWindow) -> Result<Option<Decimal>, StoreError> {
        Ok(sources::deposit_total(&self.pool, name, window).await?)
    }

    async fn inspections(&self, window: DateWindow) -> Result<Vec<InspectionRecord>, StoreError> {
        Ok(sources::inspections(&self.pool, window).await?)
    }

    async fn salary_record(&self, name: &str, period: PayPeriod) -> Result<Option<MonthlySalaryRecord>, StoreError> {
        Ok(salary::fetch(&self.pool, name, period).await?)
    }

    async fn upsert_salary(&self, record: &MonthlySalaryRecord) -> Result<UpsertOutcome, StoreError> {
        Ok(salary::upsert(&self.pool, record).await?)
    }

    async fn update_base_salary(&self, name: &str, base_salary: Decimal) -> Result<(), StoreError> {
        Ok(employees::update_base_salary(&self.pool, name, base_salary).await?)
    }
}
