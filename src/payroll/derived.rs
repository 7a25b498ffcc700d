//! The salary formula chain.
//!
//! The six derived fields of a salary record are always computed together
//! from the same inputs and written back in one step.

use rust_decimal::Decimal;

use crate::model::salary::{MonthlySalaryRecord, PerformanceDeductions};

use super::round_cents;

/// Performance commission as it enters the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceCommission {
    /// Before deductions; the chain applies the deduction fraction.
    Raw(Decimal),
    /// Already reduced; taken as is.
    Final(Decimal),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedInputs {
    pub base_salary: Decimal,
    pub temporary_increase: Decimal,
    pub attendance_deduction: Decimal,
    pub full_attendance: Decimal,
    pub department_head_subsidy: Decimal,
    pub position_allowance: Decimal,
    pub oil_subsidy: Decimal,
    pub meal_subsidy: Decimal,
    pub seniority: Decimal,
    pub agency_fee_commission: Decimal,
    pub performance_commission: Option<PerformanceCommission>,
    pub deductions: PerformanceDeductions,
    pub business_commission: Decimal,
    pub other_deductions: Decimal,
    pub personal_insurance_total: Decimal,
    pub deposit_deduction: Decimal,
    pub personal_income_tax: Decimal,
    pub other: Decimal,
    pub bank_card_or_wechat: Decimal,
    pub cash_paid: Decimal,
}

impl DerivedInputs {
    /// Reads the inputs back out of a record. Rows that never stored the
    /// raw commission treat the stored figure as final.
    pub fn from_record(record: &MonthlySalaryRecord) -> Self {
        let performance_commission = match record.performance_commission_base {
            Some(raw) => PerformanceCommission::Raw(raw),
            None => PerformanceCommission::Final(record.performance_commission),
        };
        Self {
            base_salary: record.base_salary,
            temporary_increase: record.temporary_increase,
            attendance_deduction: record.attendance_deduction,
            full_attendance: record.full_attendance,
            department_head_subsidy: record.department_head_subsidy,
            position_allowance: record.position_allowance,
            oil_subsidy: record.oil_subsidy,
            meal_subsidy: record.meal_subsidy,
            seniority: record.seniority,
            agency_fee_commission: record.agency_fee_commission,
            performance_commission: Some(performance_commission),
            deductions: record.performance_deductions.0.clone(),
            business_commission: record.business_commission,
            other_deductions: record.other_deductions,
            personal_insurance_total: record.personal_insurance_total,
            deposit_deduction: record.deposit_deduction,
            personal_income_tax: record.personal_income_tax,
            other: record.other,
            bank_card_or_wechat: record.bank_card_or_wechat,
            cash_paid: record.cash_paid,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedFields {
    pub deduction_fraction: Decimal,
    pub performance_commission: Decimal,
    pub basic_salary_payable: Decimal,
    pub total_payable: Decimal,
    pub corporate_payment: Decimal,
    pub tax_declaration: Decimal,
}

impl DerivedFields {
    pub fn calculate(inputs: &DerivedInputs) -> Self {
        let deduction_fraction = inputs.deductions.fraction();

        let performance_commission = match inputs.performance_commission {
            Some(PerformanceCommission::Raw(raw)) => round_cents(raw * (Decimal::ONE - deduction_fraction)),
            Some(PerformanceCommission::Final(value)) => value,
            None => Decimal::ZERO,
        };

        let basic_salary_payable = inputs.base_salary + inputs.temporary_increase - inputs.attendance_deduction;

        let earnings = basic_salary_payable
            + inputs.full_attendance
            + inputs.department_head_subsidy
            + inputs.position_allowance
            + inputs.oil_subsidy
            + inputs.meal_subsidy
            + inputs.seniority
            + inputs.agency_fee_commission
            + performance_commission
            + inputs.business_commission;
        let withheld = inputs.other_deductions
            + inputs.personal_insurance_total
            + inputs.deposit_deduction
            + inputs.personal_income_tax
            + inputs.other;
        let total_payable = earnings - withheld;

        let corporate_payment = total_payable - inputs.bank_card_or_wechat - inputs.cash_paid;

        Self {
            deduction_fraction,
            performance_commission,
            basic_salary_payable,
            total_payable,
            corporate_payment,
            tax_declaration: corporate_payment + inputs.personal_insurance_total,
        }
    }

    pub fn apply_to(&self, record: &mut MonthlySalaryRecord) {
        record.performance_commission = self.performance_commission;
        record.basic_salary_payable = self.basic_salary_payable;
        record.total_payable = self.total_payable;
        record.corporate_payment = self.corporate_payment;
        record.tax_declaration = self.tax_declaration;
    }
}

/// Recomputes every derived field of `record` from its own inputs.
pub fn recompute(record: &mut MonthlySalaryRecord) -> DerivedFields {
    let fields = DerivedFields::calculate(&DerivedInputs::from_record(record));
    fields.apply_to(record);
    fields
}
