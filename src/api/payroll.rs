use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use futures::lock::Mutex;
use std::sync::{Mutex as StdMutex, MutexGuard};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::db::MySqlStore;
use crate::payroll::{CancelFlag, GenerationReport, PayrollError, PayrollStore, SalaryGenerator};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct GenerateQuery {
    /// Run date, `YYYY-MM` or `YYYY-MM-DD`. The payroll generated is the
    /// calendar month before it; defaults to today, i.e. the previous month.
    #[schema(example = "2025-08-01")]
    pub month: Option<String>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateDetails {
    #[schema(example = 42)]
    pub created: usize,
    #[schema(example = 3)]
    pub updated: usize,
    #[schema(example = 0)]
    pub failed: usize,
    pub cancelled: bool,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateResponse {
    pub success: bool,
    #[schema(example = "Payroll for 2025-07 generated")]
    pub message: String,
    pub details: GenerateDetails,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CancelResponse {
    pub success: bool,
    #[schema(example = "Cancellation requested")]
    pub message: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct GenerateErrorResponse {
    pub success: bool,
    /// `TIME_RESTRICTION`, `INVALID_PERIOD`, `RUN_IN_PROGRESS`, `NO_RUN_IN_PROGRESS` or `GENERATION_FAILED`.
    #[schema(example = "TIME_RESTRICTION")]
    pub error: String,
    pub message: String,
    /// Offending period, only for `TIME_RESTRICTION`.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "2025-06", nullable = true)]
    pub period: Option<String>,
}

/// Serializes payroll runs; the store is not safe for two runs at once.
pub struct PayrollRunner<S> {
    generator: SalaryGenerator<S>,
    running: Mutex<()>,
    /// Stop signal of the run in flight, if any.
    active: StdMutex<Option<CancelFlag>>,
}

impl<S: PayrollStore> PayrollRunner<S> {
    pub fn new(generator: SalaryGenerator<S>) -> Self {
        Self {
            generator,
            running: Mutex::new(()),
            active: StdMutex::new(None),
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<CancelFlag>> {
        self.active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Raises the stop signal of the run in flight. Returns `false` when idle.
    pub fn cancel(&self) -> bool {
        match self.active().as_ref() {
            Some(flag) => {
                flag.cancel();
                true
            }
            None => false,
        }
    }

    pub async fn run(&self, month: Option<&str>, today: NaiveDate) -> HttpResponse {
        let Some(_running) = self.running.try_lock() else {
            tracing::warn!(month, "Payroll generation requested while a run is in progress");
            return HttpResponse::Conflict().json(GenerateErrorResponse {
                success: false,
                error: "RUN_IN_PROGRESS".to_string(),
                message: "A payroll generation run is already in progress".to_string(),
                period: None,
            });
        };
        let cancel = CancelFlag::new();
        *self.active() = Some(cancel.clone());
        let result = self.generator.generate(month, today, &cancel).await;
        *self.active() = None;
        generation_response(result)
    }
}

pub fn generation_response(result: Result<GenerationReport, PayrollError>) -> HttpResponse {
    match result {
        Ok(report) => HttpResponse::Ok().json(GenerateResponse {
            success: true,
            message: format!(
                "Payroll for {} generated: {} created, {} updated",
                report.period, report.created, report.updated
            ),
            details: GenerateDetails {
                created: report.created,
                updated: report.updated,
                failed: report.failed,
                cancelled: report.cancelled,
            },
        }),
        Err(e) => {
            let period = match &e {
                PayrollError::RestrictedPeriod { period } => Some(period.to_string()),
                _ => None,
            };
            let body = GenerateErrorResponse {
                success: false,
                error: e.code().to_string(),
                message: e.to_string(),
                period,
            };
            match e {
                PayrollError::Store(_) => {
                    tracing::error!(error = %e, "Payroll generation failed");
                    HttpResponse::InternalServerError().json(body)
                }
                _ => HttpResponse::BadRequest().json(body),
            }
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/payroll/generate",
    params(GenerateQuery),
    responses(
        (status = 200, description = "Payroll generated", body = GenerateResponse),
        (status = 400, description = "Closed or malformed period", body = GenerateErrorResponse),
        (status = 409, description = "A run is already in progress", body = GenerateErrorResponse),
        (status = 500, description = "Generation failed", body = GenerateErrorResponse)
    ),
    tag = "Payroll"
)]
pub async fn generate_payroll(
    runner: web::Data<PayrollRunner<MySqlStore>>,
    query: web::Query<GenerateQuery>,
) -> impl Responder {
    runner.run(query.month.as_deref(), Local::now().date_naive()).await
}

#[utoipa::path(
    post,
    path = "/api/payroll/generate/cancel",
    responses(
        (status = 202, description = "Running generation asked to stop", body = CancelResponse),
        (status = 409, description = "No run is in progress", body = GenerateErrorResponse)
    ),
    tag = "Payroll"
)]
pub async fn cancel_payroll(runner: web::Data<PayrollRunner<MySqlStore>>) -> impl Responder {
    cancel_response(runner.cancel())
}

pub fn cancel_response(cancelled: bool) -> HttpResponse {
    if cancelled {
        tracing::info!("Payroll generation cancellation requested");
        HttpResponse::Accepted().json(CancelResponse {
            success: true,
            message: "Cancellation requested; employees already processed keep their records".to_string(),
        })
    } else {
        HttpResponse::Conflict().json(GenerateErrorResponse {
            success: false,
            error: "NO_RUN_IN_PROGRESS".to_string(),
            message: "No payroll generation run is in progress".to_string(),
            period: None,
        })
    }
}
