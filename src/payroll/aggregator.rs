use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use crate::model::adjustment::{AttendanceDeduction, PromotionPenalty, SocialInsurance, SubsidySummary};
use crate::model::employee::Employee;
use crate::model::expense::ExpenseLedgerEntry;
use crate::model::salary::MonthlySalaryRecord;

use super::commission::BusinessCommission;
use super::derived;
use super::period::PayPeriod;
use super::rate_table::RateTable;
use super::store::{PayrollStore, StoreError};

/// Seniority pay per year of tenure.
pub const SENIORITY_PER_YEAR: Decimal = dec!(100);

/// Raw facts about one employee for one month.
#[derive(Debug, Clone, Default)]
pub struct SourceInputs {
    pub existing: Option<MonthlySalaryRecord>,
    pub attendance: Option<AttendanceDeduction>,
    pub subsidy: Option<SubsidySummary>,
    pub insurance: Option<SocialInsurance>,
    pub promotion_penalty: Option<PromotionPenalty>,
    pub deposit: Option<Decimal>,
    pub raw_performance_commission: Decimal,
    pub ledger: Vec<ExpenseLedgerEntry>,
    pub rate_table: Option<Arc<RateTable>>,
}

pub struct SourceAggregator<'a, S> {
    store: &'a S,
    period: PayPeriod,
}

impl<'a, S: PayrollStore> SourceAggregator<'a, S> {
    pub fn new(store: &'a S, period: PayPeriod) -> Self {
        Self { store, period }
    }

    pub async fn gather(&self, employee: &Employee) -> Result<SourceInputs, StoreError> {
        let name = employee.name.as_str();
        let window = self.period.window();

        let existing = self.store.salary_record(name, self.period).await?;
        let attendance = self.store.attendance_deduction(name, self.period).await?;
        let subsidy = self.store.subsidy_summary(name, self.period).await?;
        let insurance = self.social_insurance(name).await?;
        let promotion_penalty = self.store.promotion_penalty(name, self.period).await?;
        let deposit = self.store.deposit_total(name, window).await?;
        let ledger = self.store.ledger_entries(name, window).await?;

        let raw_performance_commission = match employee.parsed_rank() {
            Some(rank) if employee.is_bookkeeping_accountant() => {
                self.store.performance_commission(rank).await?.unwrap_or_default()
            }
            _ => Decimal::ZERO,
        };

        let rate_table = match employee.commission_track() {
            Some(track) => Some(self.store.rate_table(track).await?),
            None => None,
        };

        Ok(SourceInputs {
            existing,
            attendance,
            subsidy,
            insurance,
            promotion_penalty,
            deposit,
            raw_performance_commission,
            ledger,
            rate_table,
        })
    }

    /// This month's social insurance, else last month's.
    async fn social_insurance(&self, name: &str) -> Result<Option<SocialInsurance>, StoreError> {
        if let Some(current) = self.store.social_insurance(name, self.period).await? {
            return Ok(Some(current));
        }
        let Some(previous) = self.period.previous() else {
            return Ok(None);
        };
        let fallback = self.store.social_insurance(name, previous).await?;
        if fallback.is_some() {
            debug!(employee = name, %previous, "Using previous month's social insurance");
        }
        Ok(fallback)
    }
}

/// Commission figures that go into a record.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommissionFigures {
    pub agency_fee: Decimal,
    pub business: Decimal,
    pub new_base_salary: Option<Decimal>,
}

impl CommissionFigures {
    pub fn new(agency_fee: Decimal, business: &BusinessCommission) -> Self {
        Self {
            agency_fee,
            business: business.total,
            new_base_salary: business.new_base_salary,
        }
    }
}

/// Builds the month's salary record on top of the existing one, if any.
///
/// Identity and source fields are refreshed, hand-maintained fields
/// (temporary increase, tax, other, payment split, company) and the
/// confirmation state carry over, and the derived chain runs last.
pub fn compose_record(
    employee: &Employee,
    period: PayPeriod,
    inputs: &SourceInputs,
    commissions: CommissionFigures,
    audit_deduction: Option<Decimal>,
) -> MonthlySalaryRecord {
    let mut record = inputs.existing.clone().unwrap_or_default();

    record.name = employee.name.clone();
    record.department = employee.department.clone().unwrap_or_default();
    record.id_card = employee.id_card_number.clone().unwrap_or_default();
    record.employee_type = employee.employee_type.clone().unwrap_or_default();
    record.bank_card_number = employee.bank_card_number.clone().unwrap_or_default();
    record.year_month = period.first_day();

    record.base_salary = commissions
        .new_base_salary
        .or(employee.base_salary)
        .unwrap_or_default();

    let attendance = inputs.attendance.clone().unwrap_or_default();
    record.attendance_deduction = attendance.attendance_deduction;
    record.full_attendance = attendance.full_attendance_bonus;

    let subsidy = inputs.subsidy.clone().unwrap_or_default();
    record.department_head_subsidy = subsidy.department_head_subsidy;
    record.position_allowance = subsidy.position_allowance;
    record.oil_subsidy = subsidy.oil_subsidy;
    record.meal_subsidy = subsidy.meal_subsidy;

    record.seniority = Decimal::from(employee.tenure_years().max(0)) * SENIORITY_PER_YEAR;

    record.agency_fee_commission = commissions.agency_fee;
    record.business_commission = commissions.business;
    record.performance_commission_base = Some(inputs.raw_performance_commission);
    if let Some(deduction) = audit_deduction {
        record.performance_deductions.performance_audit = deduction;
    }

    record.other_deductions = inputs
        .promotion_penalty
        .as_ref()
        .map(|penalty| penalty.payment)
        .unwrap_or_default();

    let insurance = inputs.insurance.clone().unwrap_or_default();
    record.personal_medical = insurance.personal_medical;
    record.personal_pension = insurance.personal_pension;
    record.personal_unemployment = insurance.personal_unemployment;
    record.personal_insurance_total = insurance.personal_total;
    record.company_insurance_total = insurance.company_total;

    if let Some(deposit) = inputs.deposit {
        record.deposit_deduction = deposit;
    }

    derived::recompute(&mut record);
    record
}
