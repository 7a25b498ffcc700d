use once_cell::sync::Lazy;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::types::Json;
use sqlx::{MySql, MySqlPool};

use crate::model::salary::MonthlySalaryRecord;
use crate::payroll::period::PayPeriod;
use crate::payroll::store::UpsertOutcome;

/// Columns written by the payroll run, in bind order. Confirmation and
/// payment state belong to the review workflow and are never written here.
const WRITTEN_COLUMNS: [&str; 37] = [
    "department",
    "name",
    "idCard",
    "`type`",
    "yearMonth",
    "baseSalary",
    "temporaryIncrease",
    "temporaryIncreaseItem",
    "attendanceDeduction",
    "basicSalaryPayable",
    "fullAttendance",
    "departmentHeadSubsidy",
    "positionAllowance",
    "oilSubsidy",
    "mealSubsidy",
    "seniority",
    "agencyFeeCommission",
    "performanceCommissionBase",
    "performanceCommission",
    "performanceDeductions",
    "businessCommission",
    "otherDeductions",
    "personalMedical",
    "personalPension",
    "personalUnemployment",
    "personalInsuranceTotal",
    "companyInsuranceTotal",
    "depositDeduction",
    "personalIncomeTax",
    "other",
    "totalPayable",
    "bankCardOrWechat",
    "cashPaid",
    "corporatePayment",
    "taxDeclaration",
    "bankCardNumber",
    "company",
];

static INSERT_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "INSERT INTO sys_salary ({}) VALUES ({})",
        WRITTEN_COLUMNS.join(", "),
        vec!["?"; WRITTEN_COLUMNS.len()].join(", ")
    )
});

static UPDATE_SQL: Lazy<String> = Lazy::new(|| {
    let assignments: Vec<String> = WRITTEN_COLUMNS.iter().map(|c| format!("{c} = ?")).collect();
    format!("UPDATE sys_salary SET {} WHERE id = ?", assignments.join(", "))
});

const SELECT_SQL: &str = r#"
    SELECT
        CAST(id AS UNSIGNED) AS id,
        COALESCE(name, '') AS name,
        COALESCE(department, '') AS department,
        COALESCE(idCard, '') AS id_card,
        COALESCE(`type`, '') AS `type`,
        yearMonth AS year_month,
        COALESCE(baseSalary, 0) AS base_salary,
        COALESCE(temporaryIncrease, 0) AS temporary_increase,
        temporaryIncreaseItem AS temporary_increase_item,
        COALESCE(attendanceDeduction, 0) AS attendance_deduction,
        COALESCE(basicSalaryPayable, 0) AS basic_salary_payable,
        COALESCE(fullAttendance, 0) AS full_attendance,
        COALESCE(departmentHeadSubsidy, 0) AS department_head_subsidy,
        COALESCE(positionAllowance, 0) AS position_allowance,
        COALESCE(oilSubsidy, 0) AS oil_subsidy,
        COALESCE(mealSubsidy, 0) AS meal_subsidy,
        COALESCE(seniority, 0) AS seniority,
        COALESCE(agencyFeeCommission, 0) AS agency_fee_commission,
        performanceCommissionBase AS performance_commission_base,
        COALESCE(performanceCommission, 0) AS performance_commission,
        CAST(COALESCE(NULLIF(performanceDeductions, ''), '[]') AS JSON) AS performance_deductions,
        COALESCE(businessCommission, 0) AS business_commission,
        COALESCE(otherDeductions, 0) AS other_deductions,
        COALESCE(personalMedical, 0) AS personal_medical,
        COALESCE(personalPension, 0) AS personal_pension,
        COALESCE(personalUnemployment, 0) AS personal_unemployment,
        COALESCE(personalInsuranceTotal, 0) AS personal_insurance_total,
        COALESCE(companyInsuranceTotal, 0) AS company_insurance_total,
        COALESCE(depositDeduction, 0) AS deposit_deduction,
        COALESCE(personalIncomeTax, 0) AS personal_income_tax,
        COALESCE(other, 0) AS other,
        COALESCE(totalPayable, 0) AS total_payable,
        COALESCE(bankCardOrWechat, 0) AS bank_card_or_wechat,
        COALESCE(cashPaid, 0) AS cash_paid,
        COALESCE(corporatePayment, 0) AS corporate_payment,
        COALESCE(taxDeclaration, 0) AS tax_declaration,
        COALESCE(bankCardNumber, '') AS bank_card_number,
        COALESCE(company, '') AS company,
        isConfirmed AS is_confirmed,
        confirmedAt AS confirmed_at
    FROM sys_salary
    WHERE name = ? AND yearMonth = ?
    ORDER BY id
    LIMIT 1
"#;

pub async fn fetch(pool: &MySqlPool, name: &str, period: PayPeriod) -> Result<Option<MonthlySalaryRecord>, sqlx::Error> {
    sqlx::query_as::<_, MonthlySalaryRecord>(SELECT_SQL)
        .bind(name)
        .bind(period.first_day())
        .fetch_optional(pool)
        .await
}

fn bind_written<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    r: &'q MonthlySalaryRecord,
) -> Query<'q, MySql, MySqlArguments> {
    query
        .bind(&r.department)
        .bind(&r.name)
        .bind(&r.id_card)
        .bind(&r.employee_type)
        .bind(r.year_month)
        .bind(r.base_salary)
        .bind(r.temporary_increase)
        .bind(&r.temporary_increase_item)
        .bind(r.attendance_deduction)
        .bind(r.basic_salary_payable)
        .bind(r.full_attendance)
        .bind(r.department_head_subsidy)
        .bind(r.position_allowance)
        .bind(r.oil_subsidy)
        .bind(r.meal_subsidy)
        .bind(r.seniority)
        .bind(r.agency_fee_commission)
        .bind(r.performance_commission_base)
        .bind(r.performance_commission)
        .bind(Json(&r.performance_deductions.0))
        .bind(r.business_commission)
        .bind(r.other_deductions)
        .bind(r.personal_medical)
        .bind(r.personal_pension)
        .bind(r.personal_unemployment)
        .bind(r.personal_insurance_total)
        .bind(r.company_insurance_total)
        .bind(r.deposit_deduction)
        .bind(r.personal_income_tax)
        .bind(r.other)
        .bind(r.total_payable)
        .bind(r.bank_card_or_wechat)
        .bind(r.cash_paid)
        .bind(r.corporate_payment)
        .bind(r.tax_declaration)
        .bind(&r.bank_card_number)
        .bind(&r.company)
}

/// Updates the (name, month) row if one exists, otherwise inserts it.
pub async fn upsert(pool: &MySqlPool, record: &MonthlySalaryRecord) -> Result<UpsertOutcome, sqlx::Error> {
    let existing: Option<(u64,)> = sqlx::query_as(
        "SELECT CAST(id AS UNSIGNED) FROM sys_salary WHERE name = ? AND yearMonth = ? ORDER BY id LIMIT 1",
    )
    .bind(&record.name)
    .bind(record.year_month)
    .fetch_optional(pool)
    .await?;

    match existing {
        Some((id,)) => {
            bind_written(sqlx::query(&UPDATE_SQL), record)
                .bind(id)
                .execute(pool)
                .await?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            bind_written(sqlx::query(&INSERT_SQL), record).execute(pool).await?;
            Ok(UpsertOutcome::Created)
        }
    }
}
