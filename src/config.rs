use std::env;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::payroll::PayPeriod;
use crate::payroll::guard::DEFAULT_RESTRICTED_THROUGH;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,
    pub log_level: tracing::Level,

    // Payroll
    pub restricted_through: PayPeriod,
    pub payroll_concurrency: usize,
    pub rate_table_ttl: Duration,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed_or<T: FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { name, value })
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            log_level: parsed_or("LOG_LEVEL", "debug")?,

            restricted_through: parsed_or("PAYROLL_RESTRICTED_THROUGH", DEFAULT_RESTRICTED_THROUGH)?,
            payroll_concurrency: parsed_or::<usize>("PAYROLL_CONCURRENCY", "4")?.max(1),
            rate_table_ttl: Duration::from_secs(parsed_or("RATE_TABLE_TTL_SECS", "3600")?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_parse() {
        let period: PayPeriod = parsed_or("HRM_PAYROLL_TEST_UNSET_PERIOD", DEFAULT_RESTRICTED_THROUGH).unwrap();
        assert_eq!(period.to_string(), "2025-06");
        let level: tracing::Level = parsed_or("HRM_PAYROLL_TEST_UNSET_LEVEL", "debug").unwrap();
        assert_eq!(level, tracing::Level::DEBUG);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = parsed_or::<usize>("HRM_PAYROLL_TEST_UNSET_COUNT", "four").unwrap_err();
        assert_eq!(err.to_string(), "HRM_PAYROLL_TEST_UNSET_COUNT has invalid value 'four'");
    }
}
