use std::path::PathBuf;

use crate::errors::AppError;

const DEFAULT_ERROR_LOG: &str = "logs/errors.jsonl";

/// Runtime settings handed to every handler through `AppState`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Tenant used when a request names neither a business id nor a handle.
    pub default_business_id: Option<i64>,
    /// Whether a public booking with a priced service also books the revenue.
    pub public_booking_financial: bool,
    /// JSON-lines file receiving one entry per 500 response. `None` disables it.
    pub error_log_path: Option<PathBuf>,
    pub refresh_token_days: i64,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_business_id: None,
            public_booking_financial: true,
            error_log_path: None,
            refresh_token_days: 30,
            port: 8000,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let default_business_id = match non_empty(lookup("DEFAULT_BUSINESS_ID")) {
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| AppError::configuration("DEFAULT_BUSINESS_ID must be an integer"))?,
            ),
            None => None,
        };

        let public_booking_financial = match non_empty(lookup("PUBLIC_BOOKING_FINANCIAL")) {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| AppError::configuration("PUBLIC_BOOKING_FINANCIAL must be true or false"))?,
            None => true,
        };

        let error_log_path = match lookup("ERROR_LOG_PATH") {
            Some(raw) if raw.trim().is_empty() => None,
            Some(raw) => Some(PathBuf::from(raw)),
            None => Some(PathBuf::from(DEFAULT_ERROR_LOG)),
        };

        let refresh_token_days = match non_empty(lookup("REFRESH_TOKEN_DAYS")) {
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or_else(|| AppError::configuration("REFRESH_TOKEN_DAYS must be a positive integer"))?,
            None => 30,
        };

        let port = match non_empty(lookup("APP_PORT")) {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| AppError::configuration("APP_PORT must be a port number"))?,
            None => 8000,
        };

        Ok(Self {
            default_business_id,
            public_booking_financial,
            error_log_path,
            refresh_token_days,
            port,
        })
    }

    pub fn with_default_business(mut self, business_id: i64) -> Self {
        self.default_business_id = Some(business_id);
        self
    }

    pub fn with_error_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_log_path = Some(path.into());
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
