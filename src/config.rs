use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} must be a positive number, got '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Process settings, read from the environment (and `.env`, loaded by `main`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub pool_max_size: u32,
    /// Deadline applied to every service call made on behalf of a request.
    pub request_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = positive(&lookup, "PORT", 8080u16)?;
        let pool_max_size = positive(&lookup, "DB_POOL_MAX_SIZE", 10u32)?;
        let timeout_secs = positive(&lookup, "REQUEST_TIMEOUT_SECS", 60u64)?;

        Ok(Self {
            database_url,
            host,
            port,
            pool_max_size,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialOrd,
{
    let Some(value) = lookup(key) else {
        return Ok(default);
    };
    match value.parse::<T>() {
        Ok(parsed) if parsed > T::default() => Ok(parsed),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}
