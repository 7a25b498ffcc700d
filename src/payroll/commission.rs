//! Agency-fee and business commission.
//!
//! Agency-fee commission is a flat percentage over recurring fees and is only
//! reported per employee. Business commission rates the employee's cumulative
//! new-business basic fee once, then applies that single rate entry by entry so
//! the per-entry breakdown written back to the ledger sums to the employee
//! total.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::employee::Employee;
use crate::model::expense::{BusinessType, ExpenseLedgerEntry};

use super::period::DateWindow;
use super::rate_table::RateTable;
use super::round_cents;

pub const AGENCY_FEE_RATE: Decimal = dec!(0.01);
pub const SOFTWARE_FEE_RATE: Decimal = dec!(0.10);
pub const OUTSOURCED_FEE_RATE: Decimal = dec!(0.10);
/// Added to the tier rate for the agency fee of a two-years-gift-one-year contract.
pub const GIFT_AGENCY_BONUS_RATE: Decimal = dec!(0.05);

/// Fees that feed the tiered lookup. The social-insurance agency fee only
/// counts when its own business-type tag is new or empty.
pub fn basic_fee(entry: &ExpenseLedgerEntry) -> Decimal {
    let social_insurance = if entry.social_insurance_kind().is_new_business() {
        entry.social_insurance_agency_fee
    } else {
        Decimal::ZERO
    };
    entry.license_fee
        + entry.agency_fee
        + social_insurance
        + entry.housing_fund_agency_fee
        + entry.statistical_report_fee
        + entry.change_fee
        + entry.administrative_license_fee
        + entry.other_business_fee
}

pub fn outsourced_fee(entry: &ExpenseLedgerEntry) -> Decimal {
    entry.brand_fee
        + entry.general_seal_fee
        + entry.accounting_software_fee
        + entry.address_fee
        + entry.invoice_software_fee
        + entry.other_business_outsourcing_fee
}

fn software_fee(entry: &ExpenseLedgerEntry) -> Decimal {
    entry.accounting_software_fee + entry.invoice_software_fee + entry.address_fee
}

fn renewal_agency_fee(entry: &ExpenseLedgerEntry) -> Decimal {
    let mut fee = Decimal::ZERO;
    if entry.business_kind() == BusinessType::Renewal {
        fee += entry.agency_fee;
    }
    if entry.social_insurance_kind() == BusinessType::Renewal {
        fee += entry.social_insurance_agency_fee;
    }
    fee
}

/// Commission breakdown of one ledger entry. `total` is always `own + outsourced + special`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntryCommission {
    pub entry_id: u64,
    pub own: Decimal,
    pub outsourced: Decimal,
    pub special: Decimal,
    pub total: Decimal,
}

impl EntryCommission {
    pub fn new(entry_id: u64, own: Decimal, outsourced: Decimal, special: Decimal) -> Self {
        Self {
            entry_id,
            own,
            outsourced,
            special,
            total: own + outsourced + special,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusinessCommission {
    pub cumulative_basic_fee: Decimal,
    /// `None` when the employee has no track or the lookup missed.
    pub rate: Option<Decimal>,
    /// Companion base salary from a salary-tiered track.
    pub new_base_salary: Option<Decimal>,
    pub entries: Vec<EntryCommission>,
    pub total: Decimal,
}

/// Computes commissions over the entries of one payroll window.
#[derive(Debug, Clone, Copy)]
pub struct CommissionCalculator {
    window: DateWindow,
}

impl CommissionCalculator {
    pub fn new(window: DateWindow) -> Self {
        Self { window }
    }

    fn counts(&self, entry: &ExpenseLedgerEntry) -> bool {
        entry.is_approved() && entry.charge_date.is_some_and(|date| self.window.contains(date))
    }

    pub fn agency_fee_commission(&self, entries: &[ExpenseLedgerEntry]) -> Decimal {
        let (agency, software) = entries
            .iter()
            .filter(|entry| self.counts(entry))
            .fold((Decimal::ZERO, Decimal::ZERO), |(agency, software), entry| {
                (agency + renewal_agency_fee(entry), software + software_fee(entry))
            });
        round_cents(agency * AGENCY_FEE_RATE + software * SOFTWARE_FEE_RATE)
    }

    pub fn business_commission(
        &self,
        employee: &Employee,
        entries: &[ExpenseLedgerEntry],
        table: Option<&RateTable>,
    ) -> BusinessCommission {
        let qualifying: Vec<&ExpenseLedgerEntry> = entries
            .iter()
            .filter(|entry| self.counts(entry) && entry.business_kind().is_new_business())
            .collect();

        let cumulative_basic_fee: Decimal = qualifying.iter().map(|entry| basic_fee(entry)).sum();

        let matched = table.and_then(|table| {
            let found = table.lookup(cumulative_basic_fee, employee.tenure_years());
            if found.is_none() && !qualifying.is_empty() {
                warn!(
                    employee = %employee.name,
                    track = %table.track(),
                    amount = %cumulative_basic_fee,
                    "No commission tier matched, business commission rated at 0"
                );
            }
            found
        });
        let rate = matched.map(|m| m.rate).unwrap_or(Decimal::ZERO);

        let breakdown: Vec<EntryCommission> = qualifying
            .iter()
            .map(|entry| {
                let commission = EntryCommission::new(
                    entry.id,
                    own_commission(entry, rate),
                    round_cents(outsourced_fee(entry) * OUTSOURCED_FEE_RATE),
                    entry.special_commission,
                );
                debug!(
                    employee = %employee.name,
                    entry_id = entry.id,
                    own = %commission.own,
                    outsourced = %commission.outsourced,
                    special = %commission.special,
                    "Entry commission"
                );
                commission
            })
            .collect();

        BusinessCommission {
            cumulative_basic_fee,
            rate: matched.map(|m| m.rate),
            new_base_salary: matched.and_then(|m| m.base_salary),
            total: breakdown.iter().map(|c| c.total).sum(),
            entries: breakdown,
        }
    }
}

fn own_commission(entry: &ExpenseLedgerEntry, rate: Decimal) -> Decimal {
    let basic = basic_fee(entry);
    let own = if entry.two_years_gift_one_year && !entry.agency_fee.is_zero() {
        let agency = entry.agency_fee;
        (basic - agency) * rate + (agency / dec!(2)) * (rate + GIFT_AGENCY_BONUS_RATE)
    } else {
        basic * rate
    };
    round_cents(own)
}
