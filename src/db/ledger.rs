use sqlx::MySqlPool;

use crate::model::expense::ExpenseLedgerEntry;
use crate::payroll::commission::EntryCommission;
use crate::payroll::period::DateWindow;

pub async fn fetch_for_salesperson(
    pool: &MySqlPool,
    salesperson: &str,
    window: DateWindow,
) -> Result<Vec<ExpenseLedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, ExpenseLedgerEntry>(
        r#"
        SELECT
            CAST(id AS UNSIGNED) AS id,
            salesperson,
            CAST(chargeDate AS DATE) AS charge_date,
            status,
            businessType AS business_type,
            socialInsuranceBusinessType AS social_insurance_business_type,
            twoYearsGiftOneYear AS two_years_gift_one_year,
            COALESCE(licenseFee, 0) AS license_fee,
            COALESCE(agencyFee, 0) AS agency_fee,
            COALESCE(socialInsuranceAgencyFee, 0) AS social_insurance_agency_fee,
            COALESCE(housingFundAgencyFee, 0) AS housing_fund_agency_fee,
            COALESCE(statisticalReportFee, 0) AS statistical_report_fee,
            COALESCE(changeFee, 0) AS change_fee,
            COALESCE(administrativeLicenseFee, 0) AS administrative_license_fee,
            COALESCE(otherBusinessFee, 0) AS other_business_fee,
            COALESCE(brandFee, 0) AS brand_fee,
            COALESCE(generalSealFee, 0) AS general_seal_fee,
            COALESCE(accountingSoftwareFee, 0) AS accounting_software_fee,
            COALESCE(addressFee, 0) AS address_fee,
            COALESCE(invoiceSoftwareFee, 0) AS invoice_software_fee,
            COALESCE(otherBusinessOutsourcingFee, 0) AS other_business_outsourcing_fee,
            COALESCE(special_commission, 0) AS special_commission,
            COALESCE(own_commission, 0) AS own_commission,
            COALESCE(outsourced_commission, 0) AS outsourced_commission,
            COALESCE(business_commission, 0) AS business_commission
        FROM sys_expense
        WHERE salesperson = ?
          AND CAST(chargeDate AS DATE) BETWEEN ? AND ?
        ORDER BY id
        "#,
    )
    .bind(salesperson)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(pool)
    .await
}

/// Resets the breakdown of every entry charged inside `window` so that only
/// the hand-entered special commission remains in the total.
pub async fn clear_commissions(pool: &MySqlPool, window: DateWindow) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE sys_expense
        SET own_commission = 0,
            outsourced_commission = 0,
            business_commission = COALESCE(special_commission, 0)
        WHERE CAST(chargeDate AS DATE) BETWEEN ? AND ?
        "#,
    )
    .bind(window.start)
    .bind(window.end)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Writes one employee's breakdown in a single transaction.
pub async fn write_commissions(pool: &MySqlPool, commissions: &[EntryCommission]) -> Result<(), sqlx::Error> {
    if commissions.is_empty() {
        return Ok(());
    }
    let mut tx = pool.begin().await?;
    for commission in commissions {
        sqlx::query(
            r#"
            UPDATE sys_expense
            SET own_commission = ?, outsourced_commission = ?, business_commission = ?
            WHERE id = ?
            "#,
        )
        .bind(commission.own)
        .bind(commission.outsourced)
        .bind(commission.total)
        .bind(commission.entry_id)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await
}
