use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum_macros::EnumString;

/// Audit status value of an approved ledger entry.
pub const STATUS_APPROVED: i32 = 1;

/// One billed service item from the expense ledger.
///
/// Fee columns are nullable in storage and selected through `COALESCE(.., 0)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExpenseLedgerEntry {
    pub id: u64,
    pub salesperson: String,
    pub charge_date: Option<NaiveDate>,
    /// 0 pending, 1 approved, 2 returned.
    pub status: i32,
    pub business_type: Option<String>,
    pub social_insurance_business_type: Option<String>,
    pub two_years_gift_one_year: bool,

    pub license_fee: Decimal,
    pub agency_fee: Decimal,
    pub social_insurance_agency_fee: Decimal,
    pub housing_fund_agency_fee: Decimal,
    pub statistical_report_fee: Decimal,
    pub change_fee: Decimal,
    pub administrative_license_fee: Decimal,
    pub other_business_fee: Decimal,

    pub brand_fee: Decimal,
    pub general_seal_fee: Decimal,
    pub accounting_software_fee: Decimal,
    pub address_fee: Decimal,
    pub invoice_software_fee: Decimal,
    pub other_business_outsourcing_fee: Decimal,

    /// Hand-entered commission carried into the entry total unchanged.
    pub special_commission: Decimal,

    pub own_commission: Decimal,
    pub outsourced_commission: Decimal,
    pub business_commission: Decimal,
}

impl ExpenseLedgerEntry {
    pub fn is_approved(&self) -> bool {
        self.status == STATUS_APPROVED
    }

    pub fn business_kind(&self) -> BusinessType {
        BusinessType::from_tag(self.business_type.as_deref())
    }

    pub fn social_insurance_kind(&self) -> BusinessType {
        BusinessType::from_tag(self.social_insurance_business_type.as_deref())
    }
}

/// Business-type tag on a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
pub enum BusinessType {
    #[strum(serialize = "新增")]
    New,
    #[strum(serialize = "续费")]
    Renewal,
    /// Tag missing or blank.
    #[strum(disabled)]
    Untagged,
    /// Any tag that is neither new nor renewal.
    #[strum(disabled)]
    Unrecognized,
}

impl BusinessType {
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.map(str::trim) {
            None | Some("") => BusinessType::Untagged,
            Some(tag) => BusinessType::from_str(tag).unwrap_or(BusinessType::Unrecognized),
        }
    }

    /// New business, including entries nobody tagged.
    pub fn is_new_business(&self) -> bool {
        matches!(self, BusinessType::New | BusinessType::Untagged)
    }
}
