use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub jwt_secret: String,
    /// Absent means the process keeps its data in memory.
    pub database_url: Option<String>,
    pub api_prefix: String,
    pub approver_channel: String,
    pub holidays_file: Option<String>,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,

    // Rate limiting
    pub rate_submit_per_min: u32,
    pub rate_events_per_min: u32,
    pub rate_protected_per_min: u32,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parsed_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={raw} is invalid: {e}")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            jwt_secret: required("JWT_SECRET")?,
            database_url: optional("DATABASE_URL"),
            api_prefix: optional("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            approver_channel: optional("APPROVER_CHANNEL")
                .unwrap_or_else(|| "#leave-approvals".to_string()),
            holidays_file: optional("HOLIDAYS_FILE"),

            log_dir: optional("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parsed_or("LOG_LEVEL", tracing::Level::DEBUG)?,

            rate_submit_per_min: parsed_or("RATE_SUBMIT_PER_MIN", 30)?,
            rate_events_per_min: parsed_or("RATE_EVENTS_PER_MIN", 120)?,
            rate_protected_per_min: parsed_or("RATE_PROTECTED_PER_MIN", 1000)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_values_fall_back_to_defaults() {
        let value: u32 = parsed_or("LEAVEBOT_TEST_UNSET_RATE", 30).unwrap();
        assert_eq!(value, 30);
        assert!(optional("LEAVEBOT_TEST_UNSET_RATE").is_none());
        assert!(required("LEAVEBOT_TEST_UNSET_RATE").is_err());
    }
}
