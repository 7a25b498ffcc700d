//! Read-only monthly adjustment sources.
//!
//! Month-keyed tables store `yearMonth` as a date inside the month; the
//! latest row of the month wins when a sheet was imported twice.

use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::model::adjustment::{AttendanceDeduction, PromotionPenalty, SocialInsurance, SubsidySummary};
use crate::model::inspection::InspectionRecord;
use crate::payroll::period::{DateWindow, PayPeriod};

pub async fn attendance_deduction(
    pool: &MySqlPool,
    name: &str,
    period: PayPeriod,
) -> Result<Option<AttendanceDeduction>, sqlx::Error> {
    sqlx::query_as::<_, AttendanceDeduction>(
        r#"
        SELECT
            COALESCE(attendanceDeduction, 0) AS attendance_deduction,
            COALESCE(fullAttendanceBonus, 0) AS full_attendance_bonus
        FROM sys_attendance_deduction
        WHERE name = ? AND yearMonth BETWEEN ? AND ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(period.first_day())
    .bind(period.last_day())
    .fetch_optional(pool)
    .await
}

pub async fn subsidy_summary(
    pool: &MySqlPool,
    name: &str,
    period: PayPeriod,
) -> Result<Option<SubsidySummary>, sqlx::Error> {
    sqlx::query_as::<_, SubsidySummary>(
        r#"
        SELECT
            COALESCE(departmentHeadSubsidy, 0) AS department_head_subsidy,
            COALESCE(positionAllowance, 0) AS position_allowance,
            COALESCE(oilSubsidy, 0) AS oil_subsidy,
            COALESCE(mealSubsidy, 0) AS meal_subsidy
        FROM sys_subsidy_summary
        WHERE name = ? AND yearMonth BETWEEN ? AND ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(period.first_day())
    .bind(period.last_day())
    .fetch_optional(pool)
    .await
}

pub async fn social_insurance(
    pool: &MySqlPool,
    name: &str,
    period: PayPeriod,
) -> Result<Option<SocialInsurance>, sqlx::Error> {
    sqlx::query_as::<_, SocialInsurance>(
        r#"
        SELECT
            COALESCE(personalMedical, 0) AS personal_medical,
            COALESCE(personalPension, 0) AS personal_pension,
            COALESCE(personalUnemployment, 0) AS personal_unemployment,
            COALESCE(personalTotal, 0) AS personal_total,
            COALESCE(companyTotal, 0) AS company_total
        FROM sys_social_insurance
        WHERE name = ? AND yearMonth BETWEEN ? AND ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(period.first_day())
    .bind(period.last_day())
    .fetch_optional(pool)
    .await
}

pub async fn promotion_penalty(
    pool: &MySqlPool,
    name: &str,
    period: PayPeriod,
) -> Result<Option<PromotionPenalty>, sqlx::Error> {
    sqlx::query_as::<_, PromotionPenalty>(
        r#"
        SELECT COALESCE(payment, 0) AS payment
        FROM sys_friend_circle_payment
        WHERE name = ? AND yearMonth BETWEEN ? AND ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(name)
    .bind(period.first_day())
    .bind(period.last_day())
    .fetch_optional(pool)
    .await
}

/// `None` when no deposit was deducted inside the window.
pub async fn deposit_total(pool: &MySqlPool, name: &str, window: DateWindow) -> Result<Option<Decimal>, sqlx::Error> {
    let (total,): (Option<Decimal>,) = sqlx::query_as(
        r#"
        SELECT SUM(amount)
        FROM sys_deposit
        WHERE name = ? AND DATE(deductionDate) BETWEEN ? AND ?
        "#,
    )
    .bind(name)
    .bind(window.start)
    .bind(window.end)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

pub async fn inspections(pool: &MySqlPool, window: DateWindow) -> Result<Vec<InspectionRecord>, sqlx::Error> {
    sqlx::query_as::<_, InspectionRecord>(
        r#"
        SELECT
            DATE(inspectionDate) AS inspection_date,
            inspector,
            bookkeepingAccountant AS bookkeeping_accountant,
            reviewer
        FROM sys_financial_self_inspection
        WHERE DATE(inspectionDate) BETWEEN ? AND ?
        "#,
    )
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await
}
