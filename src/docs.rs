use crate::api::payroll::{
    CancelResponse, GenerateDetails, GenerateErrorResponse, GenerateQuery, GenerateResponse,
};
use crate::model::employee::{CommissionTrack, Employee};
use crate::model::salary::{MonthlySalaryRecord, PerformanceDeductions};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Payroll API",
        version = "1.0.0",
        description = r#"
## Monthly payroll generation

Builds one salary record per employee for the payroll month before the
run date (today unless `month` is given).

### 🔹 What a run does
- Recomputes per-entry commission on the expense ledger for the month
- Rates cumulative business commission against the employee's tier table
- Applies the accountant inspection-quota audit to performance commission
- Upserts the salary record, keeping manually entered fields

A running generation can be asked to stop with `POST /api/payroll/generate/cancel`;
employees already processed keep their records.

### 🔒 Closed months
Months up to the configured cut-off are settled and refuse regeneration
with `TIME_RESTRICTION`.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(crate::api::payroll::generate_payroll, crate::api::payroll::cancel_payroll),
    components(schemas(
        GenerateQuery,
        GenerateDetails,
        GenerateResponse,
        GenerateErrorResponse,
        CancelResponse,
        Employee,
        CommissionTrack,
        MonthlySalaryRecord,
        PerformanceDeductions
    )),
    tags((name = "Payroll", description = "Payroll generation APIs"))
)]
pub struct ApiDoc;
