// config.rs
use std::env;
use std::str::FromStr;

use tracing::warn;

use crate::errors::{AppError, Result};

pub const DEFAULT_CLICKPESA_BASE_URL: &str = "https://api.clickpesa.com";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 90;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub clickpesa_client_id: Option<String>,
    pub clickpesa_api_key: Option<String>,
    pub clickpesa_base_url: String,
    pub clickpesa_timeout_secs: u64,
    pub public_base_url: String,
    pub database_url: Option<String>,
    pub database_name: String,
    pub token_ttl_minutes: i64,
    pub outbox_retry_interval_secs: u64,
    pub outbox_max_attempts: u32,
    pub outbox_capacity: usize,
    pub port: u16,
    pub host: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            clickpesa_client_id: None,
            clickpesa_api_key: None,
            clickpesa_base_url: DEFAULT_CLICKPESA_BASE_URL.to_string(),
            clickpesa_timeout_secs: 30,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            database_url: None,
            database_name: "clickpesa".to_string(),
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            outbox_retry_interval_secs: 30,
            outbox_max_attempts: 5,
            outbox_capacity: 1000,
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment (after `.env`). Missing secrets are kept
    /// as `None` and reported later; nothing here panics.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = AppConfig::default();

        AppConfig {
            clickpesa_client_id: non_empty_var("CLICKPESA_CLIENT_ID"),
            clickpesa_api_key: non_empty_var("CLICKPESA_API_KEY"),
            clickpesa_base_url: non_empty_var("CLICKPESA_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.clickpesa_base_url),
            clickpesa_timeout_secs: parsed_var("CLICKPESA_TIMEOUT_SECS", defaults.clickpesa_timeout_secs),
            public_base_url: non_empty_var("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.public_base_url),
            database_url: non_empty_var("DATABASE_URL"),
            database_name: non_empty_var("DATABASE_NAME").unwrap_or(defaults.database_name),
            token_ttl_minutes: parsed_var("TOKEN_TTL_MINUTES", defaults.token_ttl_minutes),
            outbox_retry_interval_secs: parsed_var(
                "OUTBOX_RETRY_INTERVAL_SECS",
                defaults.outbox_retry_interval_secs,
            ),
            outbox_max_attempts: parsed_var("OUTBOX_MAX_ATTEMPTS", defaults.outbox_max_attempts),
            outbox_capacity: parsed_var("OUTBOX_CAPACITY", defaults.outbox_capacity),
            port: parsed_var("PORT", defaults.port),
            host: non_empty_var("HOST").unwrap_or(defaults.host),
        }
    }

    pub fn get_clickpesa_urls(&self) -> (String, String) {
        let token_url = format!("{}/third-parties/generate-token", self.clickpesa_base_url);
        let ussd_push_url = format!(
            "{}/third-parties/payments/initiate-ussd-push-request",
            self.clickpesa_base_url
        );

        (token_url, ussd_push_url)
    }

    /// Client id and API key, or a configuration error naming what is absent.
    pub fn clickpesa_credentials(&self) -> Result<(&str, &str)> {
        match (&self.clickpesa_client_id, &self.clickpesa_api_key) {
            (Some(id), Some(key)) => Ok((id.as_str(), key.as_str())),
            _ => Err(AppError::configuration(
                "Please set CLICKPESA_CLIENT_ID and CLICKPESA_API_KEY in the environment",
            )),
        }
    }

    pub fn callback_url(&self) -> String {
        format!("{}/webhook", self.public_base_url)
    }

    pub fn missing_variables(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.clickpesa_client_id.is_none() {
            missing.push("CLICKPESA_CLIENT_ID");
        }
        if self.clickpesa_api_key.is_none() {
            missing.push("CLICKPESA_API_KEY");
        }
        if self.database_url.is_none() {
            missing.push("DATABASE_URL");
        }
        missing
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "clickpesa_base_url": self.clickpesa_base_url,
            "public_base_url": self.public_base_url,
            "client_id_set": self.clickpesa_client_id.is_some(),
            "api_key_set": self.clickpesa_api_key.is_some(),
            "database_set": self.database_url.is_some(),
            "database_name": self.database_name,
            "token_ttl_minutes": self.token_ttl_minutes,
            "outbox_capacity": self.outbox_capacity,
            "port": self.port,
            "host": self.host,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed_var<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match non_empty_var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} is not a valid value ({}), using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
