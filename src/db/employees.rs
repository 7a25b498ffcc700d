use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::model::employee::Employee;

pub async fn fetch_all(pool: &MySqlPool) -> Result<Vec<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        r#"
        SELECT
            CAST(e.id AS UNSIGNED) AS id,
            e.name,
            d.name AS department,
            e.idCardNumber AS id_card_number,
            e.employeeType AS employee_type,
            e.position,
            e.`rank` AS `rank`,
            e.commissionRatePosition AS commission_rate_position,
            e.workYears AS work_years,
            e.baseSalary AS base_salary,
            e.bankCardNumber AS bank_card_number,
            e.reviewQuotaExempt AS review_quota_exempt,
            e.isResigned AS is_resigned
        FROM sys_employees e
        LEFT JOIN sys_department d ON d.id = e.departmentId
        ORDER BY e.id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn update_base_salary(pool: &MySqlPool, name: &str, base_salary: Decimal) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sys_employees SET baseSalary = ? WHERE name = ?")
        .bind(base_salary)
        .bind(name)
        .execute(pool)
        .await?;
    Ok(())
}
