use std::env;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_DATABASE_URL: &str = "sqlite:./local_db.sqlite?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    /// Base URL of the ML service; endpoint suffixes are appended to it.
    pub ml_api: String,
    pub jwt_secret: String,
    pub ml_timeout: Duration,
    /// Upper bound on the total time spent retrying one ML call.
    pub ml_max_retry: Duration,
    /// Requests allowed per client before the rate limiter kicks in. `None` disables it.
    pub rate_limit_burst: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env (if present) so values from file are visible
        let _ = dotenvy::dotenv();

        let ml_api = required("ML_API")?;
        let jwt_secret = required("JWT_SECRET")?;

        Ok(Config {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            ml_api,
            jwt_secret,
            ml_timeout: Duration::from_secs(parse_or("ML_TIMEOUT_SECS", 30)?),
            ml_max_retry: Duration::from_secs(parse_or("ML_MAX_RETRY_SECS", 10)?),
            rate_limit_burst: match env::var("RATE_LIMIT_BURST") {
                Ok(raw) => Some(parse_value("RATE_LIMIT_BURST", &raw)?),
                Err(_) => None,
            },
        })
    }
}

fn required(key: &str) -> Result<String, AppError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::InternalError(format!("{} not found in environment or .env file", key))),
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::InternalError(format!("{} has an invalid value: {}", key, raw)))
}
