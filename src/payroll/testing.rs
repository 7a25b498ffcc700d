//! In-memory [`PayrollStore`] for exercising the run without MySQL.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;

use crate::model::adjustment::{AttendanceDeduction, PromotionPenalty, SocialInsurance, SubsidySummary};
use crate::model::employee::{CommissionTrack, Employee, Rank};
use crate::model::expense::ExpenseLedgerEntry;
use crate::model::inspection::InspectionRecord;
use crate::model::salary::MonthlySalaryRecord;

use super::commission::EntryCommission;
use super::generator::CancelFlag;
use super::period::{DateWindow, PayPeriod};
use super::rate_table::RateTable;
use super::store::{PayrollStore, StoreError, UpsertOutcome};

pub fn employee(name: &str, track: Option<&str>) -> Employee {
    Employee {
        id: 0,
        name: name.to_string(),
        department: Some("财税部".to_string()),
        id_card_number: None,
        employee_type: Some("正式员工".to_string()),
        position: None,
        rank: None,
        commission_rate_position: track.map(str::to_string),
        work_years: Some(1),
        base_salary: Some(Decimal::new(4000, 0)),
        bank_card_number: None,
        review_quota_exempt: false,
        is_resigned: false,
    }
}

#[derive(Default)]
struct State {
    employees: Vec<Employee>,
    ledger: Vec<ExpenseLedgerEntry>,
    rate_tables: HashMap<CommissionTrack, Arc<RateTable>>,
    performance: HashMap<(String, u8), Decimal>,
    attendance: HashMap<(String, PayPeriod), AttendanceDeduction>,
    subsidies: HashMap<(String, PayPeriod), SubsidySummary>,
    insurance: HashMap<(String, PayPeriod), SocialInsurance>,
    penalties: HashMap<(String, PayPeriod), PromotionPenalty>,
    deposits: Vec<(String, chrono::NaiveDate, Decimal)>,
    inspections: Vec<InspectionRecord>,
    salaries: Vec<MonthlySalaryRecord>,
    next_salary_id: u64,
    failing: HashSet<String>,
    writes: usize,
    upserts: usize,
    cancel_after: Option<(usize, CancelFlag)>,
}

#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("memory store lock")
    }

    pub fn add_employee(&self, mut employee: Employee) {
        let mut state = self.state();
        employee.id = state.employees.len() as u64 + 1;
        state.employees.push(employee);
    }

    pub fn add_ledger_entry(&self, entry: ExpenseLedgerEntry) {
        self.state().ledger.push(entry);
    }

    pub fn set_rate_table(&self, table: RateTable) {
        self.state().rate_tables.insert(table.track(), Arc::new(table));
    }

    pub fn set_performance_commission(&self, level: &str, grade: u8, amount: Decimal) {
        self.state().performance.insert((level.to_string(), grade), amount);
    }

    pub fn set_attendance(&self, name: &str, period: PayPeriod, value: AttendanceDeduction) {
        self.state().attendance.insert((name.to_string(), period), value);
    }

    pub fn set_social_insurance(&self, name: &str, period: PayPeriod, value: SocialInsurance) {
        self.state().insurance.insert((name.to_string(), period), value);
    }

    pub fn add_deposit(&self, name: &str, date: chrono::NaiveDate, amount: Decimal) {
        self.state().deposits.push((name.to_string(), date, amount));
    }

    pub fn add_inspection(&self, record: InspectionRecord) {
        self.state().inspections.push(record);
    }

    /// Seeds a salary record as if a previous run had written it.
    pub fn put_salary(&self, mut record: MonthlySalaryRecord) {
        let mut state = self.state();
        state.next_salary_id += 1;
        record.id = Some(state.next_salary_id);
        state.salaries.push(record);
    }

    /// Makes every ledger read for `name` fail.
    pub fn fail_for(&self, name: &str) {
        self.state().failing.insert(name.to_string());
    }

    /// Raises `flag` once `upserts` salary records have been written.
    pub fn cancel_after_upserts(&self, upserts: usize, flag: CancelFlag) {
        self.state().cancel_after = Some((upserts, flag));
    }

    pub fn employee(&self, name: &str) -> Option<Employee> {
        self.state().employees.iter().find(|e| e.name == name).cloned()
    }

    pub fn salary(&self, name: &str, period: PayPeriod) -> Option<MonthlySalaryRecord> {
        self.state()
            .salaries
            .iter()
            .find(|r| r.name == name && r.year_month == period.first_day())
            .cloned()
    }

    pub fn salaries(&self) -> Vec<MonthlySalaryRecord> {
        self.state().salaries.clone()
    }

    pub fn ledger_entry(&self, id: u64) -> Option<ExpenseLedgerEntry> {
        self.state().ledger.iter().find(|e| e.id == id).cloned()
    }

    pub fn ledger(&self) -> Vec<ExpenseLedgerEntry> {
        self.state().ledger.clone()
    }

    pub fn write_count(&self) -> usize {
        self.state().writes
    }
}

impl PayrollStore for MemoryStore {
    async fn employees(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(self.state().employees.clone())
    }

    async fn ledger_entries(
        &self,
        salesperson: &str,
        window: DateWindow,
    ) -> Result<Vec<ExpenseLedgerEntry>, StoreError> {
        let state = self.state();
        if state.failing.contains(salesperson) {
            return Err(StoreError::Unavailable(format!("ledger unavailable for {salesperson}")));
        }
        Ok(state
            .ledger
            .iter()
            .filter(|e| e.salesperson == salesperson && e.charge_date.is_some_and(|d| window.contains(d)))
            .cloned()
            .collect())
    }

    async fn clear_ledger_commissions(&self, window: DateWindow) -> Result<u64, StoreError> {
        let mut state = self.state();
        state.writes += 1;
        let mut cleared = 0;
        for entry in state
            .ledger
            .iter_mut()
            .filter(|e| e.charge_date.is_some_and(|d| window.contains(d)))
        {
            entry.own_commission = Decimal::ZERO;
            entry.outsourced_commission = Decimal::ZERO;
            entry.business_commission = entry.special_commission;
            cleared += 1;
        }
        Ok(cleared)
    }

    async fn write_entry_commissions(&self, commissions: &[EntryCommission]) -> Result<(), StoreError> {
        let mut state = self.state();
        state.writes += 1;
        for commission in commissions {
            if let Some(entry) = state.ledger.iter_mut().find(|e| e.id == commission.entry_id) {
                entry.own_commission = commission.own;
                entry.outsourced_commission = commission.outsourced;
                entry.business_commission = commission.total;
            }
        }
        Ok(())
    }

    async fn rate_table(&self, track: CommissionTrack) -> Result<Arc<RateTable>, StoreError> {
        Ok(self
            .state()
            .rate_tables
            .get(&track)
            .cloned()
            .unwrap_or_else(|| Arc::new(RateTable::new(track, Vec::new()))))
    }

    async fn performance_commission(&self, rank: Rank) -> Result<Option<Decimal>, StoreError> {
        Ok(self.state().performance.get(&(rank.level_label(), rank.grade)).copied())
    }

    async fn attendance_deduction(
        &self,
        name: &str,
        period: PayPeriod,
    ) -> Result<Option<AttendanceDeduction>, StoreError> {
        Ok(self.state().attendance.get(&(name.to_string(), period)).cloned())
    }

    async fn subsidy_summary(&self, name: &str, period: PayPeriod) -> Result<Option<SubsidySummary>, StoreError> {
        Ok(self.state().subsidies.get(&(name.to_string(), period)).cloned())
    }

    async fn social_insurance(&self, name: &str, period: PayPeriod) -> Result<Option<SocialInsurance>, StoreError> {
        Ok(self.state().insurance.get(&(name.to_string(), period)).cloned())
    }

    async fn promotion_penalty(&self, name: &str, period: PayPeriod) -> Result<Option<PromotionPenalty>, StoreError> {
        Ok(self.state().penalties.get(&(name.to_string(), period)).cloned())
    }

    async fn deposit_total(&self, name: &str, window: DateWindow) -> Result<Option<Decimal>, StoreError> {
        let state = self.state();
        let amounts: Vec<Decimal> = state
            .deposits
            .iter()
            .filter(|(who, date, _)| who == name && window.contains(*date))
            .map(|(_, _, amount)| *amount)
            .collect();
        Ok((!amounts.is_empty()).then(|| amounts.into_iter().sum()))
    }

    async fn inspections(&self, window: DateWindow) -> Result<Vec<InspectionRecord>, StoreError> {
        Ok(self
            .state()
            .inspections
            .iter()
            .filter(|r| r.inspection_date.is_some_and(|d| window.contains(d)))
            .cloned()
            .collect())
    }

    async fn salary_record(&self, name: &str, period: PayPeriod) -> Result<Option<MonthlySalaryRecord>, StoreError> {
        Ok(self.salary(name, period))
    }

    async fn upsert_salary(&self, record: &MonthlySalaryRecord) -> Result<UpsertOutcome, StoreError> {
        let mut state = self.state();
        state.writes += 1;
        state.upserts += 1;

        let existing = state
            .salaries
            .iter()
            .position(|r| r.name == record.name && r.year_month == record.year_month);
        let outcome = match existing {
            Some(idx) => {
                let current = &mut state.salaries[idx];
                let (id, is_confirmed, confirmed_at) = (current.id, current.is_confirmed, current.confirmed_at);
                *current = record.clone();
                current.id = id;
                current.is_confirmed = is_confirmed;
                current.confirmed_at = confirmed_at;
                UpsertOutcome::Updated
            }
            None => {
                state.next_salary_id += 1;
                let mut created = record.clone();
                created.id = Some(state.next_salary_id);
                state.salaries.push(created);
                UpsertOutcome::Created
            }
        };

        if let Some((after, flag)) = &state.cancel_after {
            if state.upserts >= *after {
                flag.cancel();
            }
        }
        Ok(outcome)
    }

    async fn update_base_salary(&self, name: &str, base_salary: Decimal) -> Result<(), StoreError> {
        let mut state = self.state();
        state.writes += 1;
        if let Some(employee) = state.employees.iter_mut().find(|e| e.name == name) {
            employee.base_salary = Some(base_salary);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[actix_web::test]
    async fn upsert_preserves_confirmation() {
        let store = MemoryStore::default();
        let period: PayPeriod = "2025-07".parse().unwrap();
        store.put_salary(MonthlySalaryRecord {
            name: "A".into(),
            year_month: period.first_day(),
            is_confirmed: true,
            ..Default::default()
        });

        let replacement = MonthlySalaryRecord {
            name: "A".into(),
            year_month: period.first_day(),
            base_salary: dec!(5000),
            ..Default::default()
        };
        let outcome = store.upsert_salary(&replacement).await.unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        let stored = store.salary("A", period).unwrap();
        assert!(stored.is_confirmed);
        assert_eq!(stored.base_salary, dec!(5000));
    }

    #[actix_web::test]
    async fn deposits_sum_inside_window_only() {
        let store = MemoryStore::default();
        let window = "2025-07".parse::<PayPeriod>().unwrap().window();
        store.add_deposit("A", NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(), dec!(100));
        store.add_deposit("A", NaiveDate::from_ymd_opt(2025, 7, 25).unwrap(), dec!(50));
        store.add_deposit("A", NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(), dec!(999));

        assert_eq!(store.deposit_total("A", window).await.unwrap(), Some(dec!(150)));
        assert_eq!(store.deposit_total("B", window).await.unwrap(), None);
    }
}
