use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Position label of the bookkeeping accountants subject to the inspection audit.
pub const BOOKKEEPING_ACCOUNTANT: &str = "记账会计";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "张三",
        "department": "财税部",
        "id_card_number": "110101199001011234",
        "employee_type": "正式员工",
        "position": "记账会计",
        "rank": "P3-2",
        "commission_rate_position": "顾问",
        "work_years": 3,
        "base_salary": "4500.00",
        "bank_card_number": "6222020200112233445",
        "review_quota_exempt": false,
        "is_resigned": false
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    /// Natural key used by every payroll source table.
    #[schema(example = "张三")]
    pub name: String,

    #[schema(example = "财税部", nullable = true)]
    pub department: Option<String>,

    #[schema(nullable = true)]
    pub id_card_number: Option<String>,

    #[schema(example = "正式员工", nullable = true)]
    pub employee_type: Option<String>,

    #[schema(example = "记账会计", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "P3-2", nullable = true)]
    pub rank: Option<String>,

    /// Raw commission track label, see [`CommissionTrack`].
    #[schema(example = "顾问", nullable = true)]
    pub commission_rate_position: Option<String>,

    #[schema(example = 3, nullable = true)]
    pub work_years: Option<i32>,

    #[schema(value_type = String, example = "4500.00", nullable = true)]
    pub base_salary: Option<Decimal>,

    #[schema(nullable = true)]
    pub bank_card_number: Option<String>,

    /// Replaces the review-count quota with the reviewer quota during the performance audit.
    pub review_quota_exempt: bool,

    pub is_resigned: bool,
}

impl Employee {
    pub fn commission_track(&self) -> Option<CommissionTrack> {
        CommissionTrack::from_label(self.commission_rate_position.as_deref()?)
    }

    pub fn tenure_years(&self) -> i32 {
        self.work_years.unwrap_or(0)
    }

    pub fn is_bookkeeping_accountant(&self) -> bool {
        self.position.as_deref().map(str::trim) == Some(BOOKKEEPING_ACCOUNTANT)
    }

    pub fn parsed_rank(&self) -> Option<Rank> {
        self.rank.as_deref()?.parse().ok()
    }
}

/// Selects which commission rate table an employee's business commission is rated against.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr, Serialize,
    Deserialize, ToSchema,
)]
pub enum CommissionTrack {
    /// Tenure-sensitive track whose tiers also carry a base salary.
    #[strum(serialize = "销售")]
    Salesperson,
    #[strum(serialize = "顾问")]
    Consultant,
    #[strum(serialize = "其他")]
    Other,
}

impl CommissionTrack {
    /// Empty labels mean "no track"; unknown labels fall onto the generic table.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }
        Some(CommissionTrack::from_str(label).unwrap_or(CommissionTrack::Other))
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            CommissionTrack::Salesperson => "sys_business_sales_commission",
            CommissionTrack::Consultant => "sys_business_consultant_commission",
            CommissionTrack::Other => "sys_business_other_commission",
        }
    }

    pub fn is_tenure_sensitive(&self) -> bool {
        matches!(self, CommissionTrack::Salesperson)
    }

    /// Tracks whose matched tier also sets the employee's base salary.
    pub fn is_salary_tiered(&self) -> bool {
        matches!(self, CommissionTrack::Salesperson)
    }
}

/// Job rank in `Pn-m` form: `n` is the level, `m` the grade inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rank {
    pub level: u8,
    pub grade: u8,
}

impl Rank {
    /// Level label as stored in the performance table, e.g. `P3`.
    pub fn level_label(&self) -> String {
        format!("P{}", self.level)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("rank '{0}' is not in Pn-m form")]
pub struct RankParseError(pub String);

impl FromStr for Rank {
    type Err = RankParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let err = || RankParseError(value.to_string());
        let rest = value.trim().strip_prefix('P').ok_or_else(err)?;
        let (level, grade) = rest.split_once('-').ok_or_else(err)?;
        Ok(Rank {
            level: level.parse().map_err(|_| err())?,
            grade: grade.parse().map_err(|_| err())?,
        })
    }
}
