use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use futures::StreamExt;
use serde::Serialize;
use tracing::{Instrument, error, info, info_span, instrument, warn};
use uuid::Uuid;

use crate::model::employee::Employee;

use super::aggregator::{CommissionFigures, SourceAggregator, compose_record};
use super::commission::CommissionCalculator;
use super::error::{EmployeeError, PayrollError};
use super::guard::TimeWindowGuard;
use super::performance::{AuditResult, PerformanceAuditor, apply_audit_deduction};
use super::period::PayPeriod;
use super::store::{PayrollStore, UpsertOutcome};

/// Best-effort stop signal for a running generation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub run_id: Uuid,
    pub period: PayPeriod,
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub cancelled: bool,
    pub ledger_entries_cleared: u64,
    /// Existing records whose audit slot changed before the main pass.
    pub audited: usize,
}

enum Unit {
    Done(UpsertOutcome),
    Failed,
    Skipped,
}

/// Runs the monthly payroll over every active employee.
pub struct SalaryGenerator<S> {
    store: S,
    guard: TimeWindowGuard,
    concurrency: usize,
}

impl<S: PayrollStore> SalaryGenerator<S> {
    pub fn new(store: S, guard: TimeWindowGuard, concurrency: usize) -> Self {
        Self {
            store,
            guard,
            concurrency: concurrency.max(1),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generates the payroll of the month before `run_date` (default: `today`).
    ///
    /// Refused periods fail before anything is written. Failures of single
    /// employees are logged and counted; they never abort the run.
    #[instrument(skip(self, cancel), fields(run_id = tracing::field::Empty, period = tracing::field::Empty))]
    pub async fn generate(
        &self,
        run_date: Option<&str>,
        today: NaiveDate,
        cancel: &CancelFlag,
    ) -> Result<GenerationReport, PayrollError> {
        let period = PayPeriod::resolve(run_date, today)?;
        self.guard.check(period)?;

        let run_id = Uuid::new_v4();
        let span = tracing::Span::current();
        span.record("run_id", tracing::field::display(run_id));
        span.record("period", tracing::field::display(period));
        info!("Payroll generation started");

        let window = period.window();
        let ledger_entries_cleared = self.store.clear_ledger_commissions(window).await?;

        let employees = unique_employees(self.store.employees().await?);

        let inspections = self.store.inspections(window).await?;
        let audit = PerformanceAuditor::audit(&employees, &inspections);
        let audited = self.apply_audit(period, &audit).await;

        let units: Vec<Unit> = futures::stream::iter(employees.iter())
            .map(|employee| {
                let audit = &audit;
                async move {
                    if cancel.is_cancelled() {
                        return Unit::Skipped;
                    }
                    match self.process_employee(employee, period, audit).await {
                        Ok(outcome) => Unit::Done(outcome),
                        Err(e) => {
                            error!(error = %e, employee = %employee.name, "Salary generation failed for employee");
                            Unit::Failed
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = GenerationReport {
            run_id,
            period,
            created: 0,
            updated: 0,
            failed: 0,
            cancelled: cancel.is_cancelled(),
            ledger_entries_cleared,
            audited,
        };
        for unit in units {
            match unit {
                Unit::Done(UpsertOutcome::Created) => report.created += 1,
                Unit::Done(UpsertOutcome::Updated) => report.updated += 1,
                Unit::Failed => report.failed += 1,
                Unit::Skipped => {}
            }
        }

        info!(
            created = report.created,
            updated = report.updated,
            failed = report.failed,
            cancelled = report.cancelled,
            "Payroll generation finished"
        );
        Ok(report)
    }

    /// Writes audit outcomes into the period's existing records.
    async fn apply_audit(&self, period: PayPeriod, audit: &AuditResult) -> usize {
        let mut changed = 0;
        for outcome in audit.outcomes() {
            let result = async {
                let Some(mut record) = self.store.salary_record(&outcome.employee, period).await? else {
                    return Ok(false);
                };
                if !apply_audit_deduction(&mut record, outcome.deduction()) {
                    return Ok(false);
                }
                self.store.upsert_salary(&record).await?;
                Ok::<_, EmployeeError>(true)
            }
            .await;

            match result {
                Ok(true) => changed += 1,
                Ok(false) => {}
                Err(e) => error!(error = %e, employee = %outcome.employee, "Failed to apply performance audit"),
            }
        }
        changed
    }

    /// One employee's unit of work: aggregate, compute, upsert, write back.
    ///
    /// The salary record is upserted before the ledger breakdown is written.
    /// If the ledger write then fails, the record already carries the new
    /// business commission while the cleared entries hold only their special
    /// commission; rerunning the period rewrites both.
    async fn process_employee(
        &self,
        employee: &Employee,
        period: PayPeriod,
        audit: &AuditResult,
    ) -> Result<UpsertOutcome, EmployeeError> {
        let span = info_span!("employee", name = %employee.name);
        async {
            let inputs = SourceAggregator::new(&self.store, period).gather(employee).await?;

            let calculator = CommissionCalculator::new(period.window());
            let agency_fee = calculator.agency_fee_commission(&inputs.ledger);
            let business = calculator.business_commission(employee, &inputs.ledger, inputs.rate_table.as_deref());

            let figures = CommissionFigures::new(agency_fee, &business);
            let record = compose_record(employee, period, &inputs, figures, audit.deduction_for(&employee.name));
            let outcome = self.store.upsert_salary(&record).await?;
            self.store.write_entry_commissions(&business.entries).await?;

            // Tiered tracks move the master base salary along with the matched tier.
            if let Some(base_salary) = business.new_base_salary {
                if employee.base_salary != Some(base_salary) {
                    self.store.update_base_salary(&employee.name, base_salary).await?;
                    info!(
                        previous = ?employee.base_salary,
                        current = %base_salary,
                        "Base salary updated from commission tier"
                    );
                }
            }

            Ok(outcome)
        }
        .instrument(span)
        .await
    }
}

/// Drops repeated names; the first row by id wins. Resigned employees are kept.
fn unique_employees(employees: Vec<Employee>) -> Vec<Employee> {
    let mut seen = HashSet::new();
    employees
        .into_iter()
        .filter(|employee| {
            let fresh = seen.insert(employee.name.clone());
            if !fresh {
                warn!(employee = %employee.name, id = employee.id, "Duplicate employee name skipped");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::adjustment::{AttendanceDeduction, SocialInsurance};
    use crate::model::employee::CommissionTrack;
    use crate::model::expense::{ExpenseLedgerEntry, STATUS_APPROVED};
    use crate::model::inspection::InspectionRecord;
    use crate::model::rate_tier::{CommissionRateTier, FeeRange, TenureBand};
    use crate::model::salary::MonthlySalaryRecord;
    use crate::payroll::performance::AUDIT_PENALTY;
    use crate::payroll::rate_table::RateTable;
    use crate::payroll::testing::{MemoryStore, employee};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 3).unwrap()
    }

    fn generator(store: MemoryStore) -> SalaryGenerator<MemoryStore> {
        let cutoff: PayPeriod = "2025-06".parse().unwrap();
        SalaryGenerator::new(store, TimeWindowGuard::new(cutoff), 4)
    }

    fn ledger_entry(id: u64, salesperson: &str, license_fee: Decimal) -> ExpenseLedgerEntry {
        ExpenseLedgerEntry {
            id,
            salesperson: salesperson.into(),
            charge_date: NaiveDate::from_ymd_opt(2025, 7, 10),
            status: STATUS_APPROVED,
            business_type: Some("新增".into()),
            license_fee,
            ..Default::default()
        }
    }

    fn flat_table(track: CommissionTrack, rate: Decimal, base_salary: Option<Decimal>) -> RateTable {
        RateTable::new(
            track,
            vec![CommissionRateTier {
                id: 1,
                range: FeeRange {
                    low: dec!(0),
                    high: dec!(100000),
                },
                rate,
                tenure_band: TenureBand::All,
                base_salary,
            }],
        )
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::default();
        store.add_employee(employee("A", Some("顾问")));
        store.add_employee(employee("B", None));
        store.add_ledger_entry(ledger_entry(1, "A", dec!(1000)));
        store.set_rate_table(flat_table(CommissionTrack::Consultant, dec!(0.05), None));
        store
    }

    #[actix_web::test]
    async fn defaults_to_previous_month_and_creates_records() {
        let generator = generator(seeded());
        let report = generator.generate(None, today(), &CancelFlag::new()).await.unwrap();

        assert_eq!(report.period.to_string(), "2025-07");
        assert_eq!((report.created, report.updated, report.failed), (2, 0, 0));
        assert!(!report.cancelled);

        let a = generator.store().salary("A", report.period).unwrap();
        assert_eq!(a.business_commission, dec!(50));
        let entry = generator.store().ledger_entry(1).unwrap();
        assert_eq!(
            (entry.own_commission, entry.outsourced_commission, entry.business_commission),
            (dec!(50), dec!(0), dec!(50))
        );
    }

    #[actix_web::test]
    async fn rerun_is_idempotent() {
        let generator = generator(seeded());
        let first = generator.generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();
        let records_after_first = generator.store().salaries();
        let ledger_after_first = generator.store().ledger();

        let second = generator.generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();

        assert_eq!((first.created, first.updated), (2, 0));
        assert_eq!((second.created, second.updated), (0, 2));
        assert_eq!(generator.store().salaries(), records_after_first);
        assert_eq!(generator.store().ledger(), ledger_after_first);
        assert_ne!(first.run_id, second.run_id);
    }

    #[actix_web::test]
    async fn restricted_period_writes_nothing() {
        let generator = generator(seeded());
        let err = generator
            .generate(Some("2025-07"), today(), &CancelFlag::new())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "TIME_RESTRICTION");
        assert!(matches!(err, PayrollError::RestrictedPeriod { period } if period.to_string() == "2025-06"));
        assert_eq!(generator.store().write_count(), 0);
    }

    #[actix_web::test]
    async fn invalid_period_is_rejected() {
        let generator = generator(seeded());
        let err = generator
            .generate(Some("July"), today(), &CancelFlag::new())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_PERIOD");
        assert_eq!(generator.store().write_count(), 0);
    }

    #[actix_web::test]
    async fn one_failing_employee_does_not_stop_the_batch() {
        let store = seeded();
        store.fail_for("B");
        let generator = generator(store);

        let report = generator.generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();

        assert_eq!((report.created, report.failed), (1, 1));
        let period = report.period;
        assert!(generator.store().salary("A", period).is_some());
        assert!(generator.store().salary("B", period).is_none());
    }

    #[actix_web::test]
    async fn duplicate_names_are_processed_once() {
        let store = seeded();
        store.add_employee(employee("A", Some("顾问")));

        let report = generator(store).generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();
        assert_eq!((report.created, report.failed), (2, 0));
    }

    #[actix_web::test]
    async fn resigned_employee_is_paid_for_the_month_worked() {
        let store = MemoryStore::default();
        let mut leaver = employee("R", Some("顾问"));
        leaver.is_resigned = true;
        store.add_employee(leaver);
        store.add_ledger_entry(ExpenseLedgerEntry {
            own_commission: dec!(7),
            business_commission: dec!(7),
            ..ledger_entry(9, "R", dec!(1000))
        });
        store.set_rate_table(flat_table(CommissionTrack::Consultant, dec!(0.05), None));

        let generator = generator(store);
        let report = generator.generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();

        assert_eq!(report.created, 1);
        let record = generator.store().salary("R", report.period).unwrap();
        assert_eq!(record.business_commission, dec!(50));
        let entry = generator.store().ledger_entry(9).unwrap();
        assert_eq!((entry.own_commission, entry.business_commission), (dec!(50), dec!(50)));
    }

    #[actix_web::test]
    async fn stale_breakdowns_in_window_are_cleared() {
        let store = seeded();
        let stale = |entry: ExpenseLedgerEntry| ExpenseLedgerEntry {
            own_commission: dec!(30),
            outsourced_commission: dec!(5),
            business_commission: dec!(40),
            special_commission: dec!(5),
            ..entry
        };
        store.add_ledger_entry(stale(ExpenseLedgerEntry {
            business_type: Some("续费".into()),
            ..ledger_entry(2, "A", dec!(800))
        }));
        store.add_ledger_entry(stale(ExpenseLedgerEntry {
            status: 0,
            ..ledger_entry(3, "A", dec!(800))
        }));
        // B has no commission track.
        store.add_ledger_entry(stale(ledger_entry(4, "B", dec!(800))));
        store.add_ledger_entry(stale(ExpenseLedgerEntry {
            charge_date: NaiveDate::from_ymd_opt(2025, 6, 30),
            ..ledger_entry(6, "A", dec!(800))
        }));

        let generator = generator(store);
        let report = generator.generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();
        assert_eq!(report.ledger_entries_cleared, 4);

        for id in [2, 3, 4] {
            let entry = generator.store().ledger_entry(id).unwrap();
            assert_eq!(
                (entry.own_commission, entry.outsourced_commission, entry.business_commission),
                (dec!(0), dec!(0), dec!(5)),
                "entry {id}"
            );
        }
        let outside = generator.store().ledger_entry(6).unwrap();
        assert_eq!(
            (outside.own_commission, outside.outsourced_commission, outside.business_commission),
            (dec!(30), dec!(5), dec!(40))
        );
        let a = generator.store().salary("A", report.period).unwrap();
        assert_eq!(a.business_commission, dec!(50));
    }

    #[actix_web::test]
    async fn tiered_track_writes_base_salary_back() {
        let store = MemoryStore::default();
        let mut seller = employee("S", Some("销售"));
        seller.base_salary = Some(dec!(3000));
        store.add_employee(seller);
        store.add_ledger_entry(ledger_entry(5, "S", dec!(2000)));
        store.set_rate_table(flat_table(CommissionTrack::Salesperson, dec!(0.03), Some(dec!(3600))));

        let generator = generator(store);
        let report = generator.generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();

        assert_eq!(generator.store().employee("S").and_then(|e| e.base_salary), Some(dec!(3600)));
        let record = generator.store().salary("S", report.period).unwrap();
        assert_eq!(record.base_salary, dec!(3600));
        assert_eq!(record.business_commission, dec!(60));
    }

    #[actix_web::test]
    async fn audit_penalty_lands_on_new_and_existing_records() {
        let store = MemoryStore::default();
        let mut accountant = employee("K", None);
        accountant.position = Some("记账会计".into());
        accountant.rank = Some("P2-1".into());
        store.add_employee(accountant.clone());
        let mut other = accountant.clone();
        other.name = "L".into();
        store.add_employee(other);
        store.set_performance_commission("P2", 1, dec!(1000));
        store.add_inspection(InspectionRecord {
            inspection_date: NaiveDate::from_ymd_opt(2025, 7, 2),
            inspector: Some("K".into()),
            bookkeeping_accountant: Some("K".into()),
            reviewer: None,
        });

        let period: PayPeriod = "2025-07".parse().unwrap();
        store.put_salary(MonthlySalaryRecord {
            name: "L".into(),
            year_month: period.first_day(),
            performance_commission_base: Some(dec!(1000)),
            performance_commission: dec!(1000),
            ..Default::default()
        });

        let generator = generator(store);
        let report = generator.generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();

        assert_eq!(report.audited, 1);
        assert_eq!((report.created, report.updated), (1, 1));
        for name in ["K", "L"] {
            let record = generator.store().salary(name, period).unwrap();
            assert_eq!(record.performance_deductions.performance_audit, AUDIT_PENALTY);
            assert_eq!(record.performance_commission_base, Some(dec!(1000)));
            assert_eq!(record.performance_commission, dec!(800));
        }
    }

    #[actix_web::test]
    async fn social_insurance_falls_back_to_previous_month() {
        let store = seeded();
        let june: PayPeriod = "2025-06".parse().unwrap();
        let july: PayPeriod = "2025-07".parse().unwrap();
        store.set_attendance(
            "A",
            july,
            AttendanceDeduction {
                attendance_deduction: dec!(120),
                full_attendance_bonus: Decimal::ZERO,
            },
        );
        store.set_social_insurance(
            "A",
            june,
            SocialInsurance {
                personal_total: dec!(410),
                company_total: dec!(980),
                ..Default::default()
            },
        );

        let generator = generator(store);
        let report = generator.generate(Some("2025-08"), today(), &CancelFlag::new()).await.unwrap();
        let record = generator.store().salary("A", report.period).unwrap();
        assert_eq!(record.personal_insurance_total, dec!(410));
        assert_eq!(record.company_insurance_total, dec!(980));
        assert_eq!(record.basic_salary_payable, dec!(3880));
        assert_eq!(record.tax_declaration, record.corporate_payment + dec!(410));
    }

    #[actix_web::test]
    async fn cancellation_keeps_committed_work() {
        let store = seeded();
        let cancel = CancelFlag::new();
        store.cancel_after_upserts(1, cancel.clone());
        let generator = SalaryGenerator::new(store, TimeWindowGuard::new("2025-06".parse().unwrap()), 1);

        let report = generator.generate(Some("2025-08"), today(), &cancel).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(report.created, 1);
        assert_eq!(generator.store().salaries().len(), 1);
    }
}
