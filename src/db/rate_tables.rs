use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use once_cell::sync::OnceCell;
use rust_decimal::Decimal;
use sqlx::MySqlPool;
use strum::IntoEnumIterator;

use crate::model::employee::{CommissionTrack, Rank};
use crate::model::rate_tier::CommissionRateRow;
use crate::payroll::rate_table::RateTable;
use crate::payroll::store::StoreError;

const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Parsed commission tables by track. Reference data, refreshed after the TTL.
static RATE_TABLE_CACHE: OnceCell<Cache<CommissionTrack, Arc<RateTable>>> = OnceCell::new();

fn build_cache(ttl: Duration) -> Cache<CommissionTrack, Arc<RateTable>> {
    Cache::builder().max_capacity(16).time_to_live(ttl).build()
}

fn cache() -> &'static Cache<CommissionTrack, Arc<RateTable>> {
    RATE_TABLE_CACHE.get_or_init(|| build_cache(DEFAULT_TTL))
}

/// Sets the cache TTL. Only effective before the cache is first used.
pub fn configure_cache(ttl: Duration) {
    if RATE_TABLE_CACHE.set(build_cache(ttl)).is_err() {
        tracing::warn!(?ttl, "Rate table cache already initialised, TTL unchanged");
    }
}

pub async fn load_rate_table(pool: &MySqlPool, track: CommissionTrack) -> Result<RateTable, sqlx::Error> {
    let sql = if track.is_salary_tiered() {
        format!(
            r#"
            SELECT CAST(id AS UNSIGNED) AS id, feeRange AS fee_range, commissionRate AS commission_rate,
                   `type` AS tenure_band, baseSalary AS base_salary
            FROM {}
            ORDER BY id
            "#,
            track.table_name()
        )
    } else {
        format!(
            r#"
            SELECT CAST(id AS UNSIGNED) AS id, feeRange AS fee_range, commissionRate AS commission_rate,
                   CAST(NULL AS CHAR) AS tenure_band, CAST(NULL AS DECIMAL(10,2)) AS base_salary
            FROM {}
            ORDER BY id
            "#,
            track.table_name()
        )
    };

    let rows = sqlx::query_as::<_, CommissionRateRow>(&sql).fetch_all(pool).await?;
    Ok(RateTable::from_rows(track, rows))
}

pub async fn rate_table(pool: &MySqlPool, track: CommissionTrack) -> Result<Arc<RateTable>, StoreError> {
    cache()
        .try_get_with(track, async { load_rate_table(pool, track).await.map(Arc::new) })
        .await
        .map_err(|e| StoreError::Unavailable(format!("commission table for {track}: {e}")))
}

/// Loads all commission tables into the cache.
pub async fn warmup_rate_tables(pool: &MySqlPool) -> anyhow::Result<()> {
    for track in CommissionTrack::iter() {
        let table = load_rate_table(pool, track).await?;
        let tiers = table.tiers().len();
        cache().insert(track, Arc::new(table)).await;
        tracing::info!(%track, tiers, "Commission table cached");
    }
    Ok(())
}

/// Performance commission of a rank, keyed by level label (`P3`) and grade.
pub async fn performance_commission(pool: &MySqlPool, rank: Rank) -> Result<Option<Decimal>, sqlx::Error> {
    let row: Option<(Option<Decimal>,)> = sqlx::query_as(
        r#"
        SELECT performance
        FROM sys_performance_commission
        WHERE pLevel = ? AND gradeLevel = ?
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(rank.level_label())
    .bind(rank.grade.to_string())
    .fetch_optional(pool)
    .await?;
    Ok(row.and_then(|(performance,)| performance))
}
