//! Monthly payroll generation and commission engine.

pub mod aggregator;
pub mod commission;
pub mod derived;
pub mod error;
pub mod generator;
pub mod guard;
pub mod performance;
pub mod period;
pub mod rate_table;
pub mod store;

#[cfg(test)]
pub mod testing;

use rust_decimal::{Decimal, RoundingStrategy};

pub use error::PayrollError;
pub use generator::{CancelFlag, GenerationReport, SalaryGenerator};
pub use guard::TimeWindowGuard;
pub use period::PayPeriod;
pub use store::PayrollStore;

/// Rounds a money amount to cents, halves away from zero.
pub fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
