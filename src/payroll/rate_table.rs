//! Commission tier resolution.
//!
//! A cumulative new-business fee total is resolved against the tier table of
//! the employee's commission track. Tiers are half-open `[low, high)` ranges
//! checked in ascending id order; the salesperson track additionally filters
//! tiers by tenure band and carries a base salary per tier.

use rust_decimal::Decimal;
use tracing::warn;

use crate::model::employee::CommissionTrack;
use crate::model::rate_tier::{CommissionRateRow, CommissionRateTier};

/// Result of a successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateMatch {
    pub tier_id: u64,
    pub rate: Decimal,
    /// Only set for salary-tiered tracks.
    pub base_salary: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    track: CommissionTrack,
    tiers: Vec<CommissionRateTier>,
}

impl RateTable {
    pub fn new(track: CommissionTrack, mut tiers: Vec<CommissionRateTier>) -> Self {
        tiers.sort_by_key(|tier| tier.id);
        Self { track, tiers }
    }

    /// Builds a table from stored rows, skipping rows that do not parse.
    pub fn from_rows(track: CommissionTrack, rows: Vec<CommissionRateRow>) -> Self {
        let tiers = rows
            .into_iter()
            .filter_map(|row| {
                let id = row.id;
                CommissionRateTier::try_from(row)
                    .map_err(|e| warn!(error = %e, %track, tier_id = id, "Skipping malformed commission tier"))
                    .ok()
            })
            .collect();
        Self::new(track, tiers)
    }

    pub fn track(&self) -> CommissionTrack {
        self.track
    }

    pub fn tiers(&self) -> &[CommissionRateTier] {
        &self.tiers
    }

    /// Finds the tier containing `amount`. `None` means "no rate".
    pub fn lookup(&self, amount: Decimal, tenure_years: i32) -> Option<RateMatch> {
        self.tiers
            .iter()
            .filter(|tier| !self.track.is_tenure_sensitive() || tier.tenure_band.admits(tenure_years))
            .find(|tier| tier.range.contains(amount))
            .map(|tier| RateMatch {
                tier_id: tier.id,
                rate: tier.rate,
                base_salary: if self.track.is_salary_tiered() {
                    tier.base_salary
                } else {
                    None
                },
            })
    }
}
