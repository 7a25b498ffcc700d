use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;

mod api;
mod config;
mod db;
mod docs;
mod model;
mod payroll;
mod routes;

use config::Config;
use db::{MySqlStore, init_db, rate_tables};

use crate::api::payroll::PayrollRunner;
use crate::docs::ApiDoc;
use crate::payroll::{SalaryGenerator, TimeWindowGuard};
use tracing::{error, info};
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRM payroll service"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        restricted_through = %config.restricted_through,
        concurrency = config.payroll_concurrency,
        "Server starting..."
    );

    rate_tables::configure_cache(config.rate_table_ttl);
    let pool = init_db(&config.database_url)
        .await
        .context("failed to connect to the payroll database")?;

    let pool_for_rate_warmup = pool.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = rate_tables::warmup_rate_tables(&pool_for_rate_warmup).await {
            error!(error = ?e, "Failed to warm up commission rate tables");
        }
    });

    let generator = SalaryGenerator::new(
        MySqlStore::new(pool),
        TimeWindowGuard::new(config.restricted_through),
        config.payroll_concurrency,
    );
    let runner = Data::new(PayrollRunner::new(generator));

    let server_addr = config.server_addr.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard matches the JS/CSS assets
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(runner.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
