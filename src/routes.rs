use crate::{api::payroll, config::Config};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/payroll")
                // /payroll/generate?month=YYYY-MM-DD
                .service(web::resource("/generate").route(web::post().to(payroll::generate_payroll)))
                // /payroll/generate/cancel
                .service(web::resource("/generate/cancel").route(web::post().to(payroll::cancel_payroll))),
        ),
    );
}
