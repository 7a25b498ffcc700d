use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::EnumString;

/// Storage shape of a commission tier; `fee_range` is still the raw `low-high` text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommissionRateRow {
    pub id: u64,
    pub fee_range: String,
    pub commission_rate: Decimal,
    pub tenure_band: Option<String>,
    pub base_salary: Option<Decimal>,
}

/// Half-open fee interval `[low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRange {
    pub low: Decimal,
    pub high: Decimal,
}

impl FeeRange {
    pub fn contains(&self, amount: Decimal) -> bool {
        self.low <= amount && amount < self.high
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("fee range '{0}' is not in low-high form")]
pub struct FeeRangeParseError(pub String);

impl FromStr for FeeRange {
    type Err = FeeRangeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let err = || FeeRangeParseError(value.to_string());
        let (low, high) = value.trim().split_once('-').ok_or_else(err)?;
        let low = Decimal::from_str(low.trim()).map_err(|_| err())?;
        let high = Decimal::from_str(high.trim()).map_err(|_| err())?;
        if high <= low {
            return Err(err());
        }
        Ok(FeeRange { low, high })
    }
}

/// Tenure restriction on a salesperson tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, Serialize, Deserialize)]
pub enum TenureBand {
    #[default]
    #[strum(serialize = "通用")]
    All,
    /// Confirmed staff with less than two years.
    #[strum(serialize = "转正后")]
    UnderTwoYears,
    #[strum(serialize = "入职满2年")]
    TwoYearsOrMore,
}

impl TenureBand {
    pub fn from_tag(tag: Option<&str>) -> Option<Self> {
        match tag.map(str::trim) {
            None | Some("") => Some(TenureBand::All),
            Some(tag) => TenureBand::from_str(tag).ok(),
        }
    }

    pub fn admits(&self, tenure_years: i32) -> bool {
        match self {
            TenureBand::All => true,
            TenureBand::UnderTwoYears => tenure_years < 2,
            TenureBand::TwoYearsOrMore => tenure_years >= 2,
        }
    }
}

/// Parsed commission tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionRateTier {
    pub id: u64,
    pub range: FeeRange,
    pub rate: Decimal,
    pub tenure_band: TenureBand,
    pub base_salary: Option<Decimal>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TierParseError {
    #[error(transparent)]
    Range(#[from] FeeRangeParseError),
    #[error("unknown tenure band '{0}'")]
    TenureBand(String),
}

impl TryFrom<CommissionRateRow> for CommissionRateTier {
    type Error = TierParseError;

    fn try_from(row: CommissionRateRow) -> Result<Self, Self::Error> {
        let tenure_band = TenureBand::from_tag(row.tenure_band.as_deref())
            .ok_or_else(|| TierParseError::TenureBand(row.tenure_band.clone().unwrap_or_default()))?;
        Ok(CommissionRateTier {
            id: row.id,
            range: row.fee_range.parse()?,
            rate: row.commission_rate,
            tenure_band,
            base_salary: row.base_salary,
        })
    }
}
