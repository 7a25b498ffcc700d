//! Inspection-quota audit for bookkeeping accountants.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, info};

use crate::model::employee::{Employee, Rank};
use crate::model::inspection::InspectionRecord;
use crate::model::salary::MonthlySalaryRecord;

use super::derived;

/// Deduction fraction set in the audit slot when a quota is missed.
pub const AUDIT_PENALTY: Decimal = dec!(0.2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InspectionCounts {
    pub self_inspections: u32,
    pub cross_inspections: u32,
    pub reviews: u32,
}

fn person(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|name| !name.is_empty())
}

/// Counts inspection events per person.
pub fn tally(records: &[InspectionRecord]) -> HashMap<String, InspectionCounts> {
    let mut counts: HashMap<String, InspectionCounts> = HashMap::new();
    for record in records {
        if let Some(inspector) = person(&record.inspector) {
            let entry = counts.entry(inspector.to_string()).or_default();
            if person(&record.bookkeeping_accountant) == Some(inspector) {
                entry.self_inspections += 1;
            } else {
                entry.cross_inspections += 1;
            }
        }
        if let Some(reviewer) = person(&record.reviewer) {
            counts.entry(reviewer.to_string()).or_default().reviews += 1;
        }
    }
    counts
}

/// Minimum monthly counts an accountant must reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuotaRule {
    pub min_self_inspections: u32,
    pub min_cross_inspections: u32,
    pub min_reviews: u32,
}

impl QuotaRule {
    const fn new(min_self_inspections: u32, min_cross_inspections: u32, min_reviews: u32) -> Self {
        Self {
            min_self_inspections,
            min_cross_inspections,
            min_reviews,
        }
    }

    /// Rule for one accountant. Exempt employees answer to the review quota
    /// only; everyone else is ruled by rank level, and levels without a
    /// quota (or unparseable ranks) are not audited.
    pub fn for_employee(rank: Option<Rank>, review_quota_exempt: bool) -> Option<Self> {
        if review_quota_exempt {
            return Some(Self::new(0, 0, 12));
        }
        match rank?.level {
            2 => Some(Self::new(30, 0, 0)),
            3 => Some(Self::new(20, 20, 0)),
            4 => Some(Self::new(10, 20, 0)),
            _ => None,
        }
    }

    pub fn is_met_by(&self, counts: &InspectionCounts) -> bool {
        counts.self_inspections >= self.min_self_inspections
            && counts.cross_inspections >= self.min_cross_inspections
            && counts.reviews >= self.min_reviews
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditOutcome {
    pub employee: String,
    pub counts: InspectionCounts,
    pub rule: QuotaRule,
    pub passed: bool,
}

impl AuditOutcome {
    /// Value of the audit slot in the deduction record.
    pub fn deduction(&self) -> Decimal {
        if self.passed {
            Decimal::ZERO
        } else {
            AUDIT_PENALTY
        }
    }
}

/// Audit outcomes of one period, keyed by employee name.
#[derive(Debug, Clone, Default)]
pub struct AuditResult {
    outcomes: HashMap<String, AuditOutcome>,
}

impl AuditResult {
    pub fn get(&self, name: &str) -> Option<&AuditOutcome> {
        self.outcomes.get(name)
    }

    pub fn deduction_for(&self, name: &str) -> Option<Decimal> {
        self.get(name).map(AuditOutcome::deduction)
    }

    pub fn outcomes(&self) -> impl Iterator<Item = &AuditOutcome> {
        self.outcomes.values()
    }
}

pub struct PerformanceAuditor;

impl PerformanceAuditor {
    pub fn audit(employees: &[Employee], inspections: &[InspectionRecord]) -> AuditResult {
        let counts = tally(inspections);
        let outcomes: HashMap<String, AuditOutcome> = employees
            .iter()
            .filter(|employee| employee.is_bookkeeping_accountant())
            .filter_map(|employee| {
                let rule = QuotaRule::for_employee(employee.parsed_rank(), employee.review_quota_exempt)?;
                let counts = counts.get(&employee.name).copied().unwrap_or_default();
                let passed = rule.is_met_by(&counts);
                debug!(
                    employee = %employee.name,
                    self_inspections = counts.self_inspections,
                    cross_inspections = counts.cross_inspections,
                    reviews = counts.reviews,
                    passed,
                    "Inspection quota checked"
                );
                Some((
                    employee.name.clone(),
                    AuditOutcome {
                        employee: employee.name.clone(),
                        counts,
                        rule,
                        passed,
                    },
                ))
            })
            .collect();

        let failed = outcomes.values().filter(|o| !o.passed).count();
        info!(audited = outcomes.len(), failed, "Performance audit finished");
        AuditResult { outcomes }
    }
}

/// Sets the audit slot and recomputes the derived fields. Returns whether the record changed.
pub fn apply_audit_deduction(record: &mut MonthlySalaryRecord, deduction: Decimal) -> bool {
    let before = record.clone();
    record.performance_deductions.performance_audit = deduction;
    derived::recompute(record);
    *record != before
}
