use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow, ensure};
use chrono::FixedOffset;
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub db_max_connections: u32,
    pub sweep_interval: Duration,
    /// Offset of the time zone shift times are written in.
    pub business_offset: FixedOffset,
    pub run_migrations: bool,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{key} must be set"))
        };

        let rate_protected_per_min: u32 = parsed(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?;
        ensure!(rate_protected_per_min > 0, "RATE_PROTECTED_PER_MIN must be at least 1");

        let db_max_connections: u32 = parsed(&lookup, "DB_MAX_CONNECTIONS", 10)?;
        ensure!(db_max_connections > 0, "DB_MAX_CONNECTIONS must be at least 1");

        let sweep_secs: u64 = parsed(&lookup, "SWEEP_INTERVAL_SECS", 60)?;
        ensure!(sweep_secs > 0, "SWEEP_INTERVAL_SECS must be at least 1");

        let offset_hours: i32 = parsed(&lookup, "BUSINESS_UTC_OFFSET_HOURS", 9)?;
        let business_offset = FixedOffset::east_opt(offset_hours * 3600)
            .ok_or_else(|| anyhow!("BUSINESS_UTC_OFFSET_HOURS={offset_hours} is out of range"))?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),
            rate_protected_per_min,
            db_max_connections,
            sweep_interval: Duration::from_secs(sweep_secs),
            business_offset,
            run_migrations: parsed(&lookup, "RUN_MIGRATIONS", false)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    #[cfg(test)]
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            database_url: "mysql://localhost/alba_test".to_string(),
            jwt_secret: jwt_secret.to_string(),
            server_addr: "127.0.0.1:0".to_string(),
            api_prefix: "/api".to_string(),
            rate_protected_per_min: 1000,
            db_max_connections: 1,
            sweep_interval: Duration::from_secs(60),
            business_offset: FixedOffset::east_opt(9 * 3600).unwrap(),
            run_migrations: false,
            log_level: "debug".to_string(),
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key}={raw:?} is invalid: {e}")),
        None => Ok(default),
    }
}
