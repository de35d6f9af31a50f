use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Connection settings for the ledger database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
    /// How long to wait for a pooled connection before reporting exhaustion
    pub acquire_timeout: Duration,
    /// Upper bound for one store operation, lock waits and commit included
    pub operation_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Config {
    /// Load configuration from the process environment (and `.env` if present).
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup. Missing or empty
    /// keys fall back to defaults; malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Config {
            server: ServerConfig {
                host: get("SERVER_HOST", "0.0.0.0"),
                port: parse_value("SERVER_PORT", &get("SERVER_PORT", "8080"))?,
            },
            database: DatabaseConfig {
                host: get("DB_HOST", "localhost"),
                port: parse_value("DB_PORT", &get("DB_PORT", "5432"))?,
                user: get("DB_USER", "postgres"),
                password: get("DB_PASSWORD", "postgres"),
                name: get("DB_NAME", "payments"),
                max_connections: parse_value(
                    "DB_MAX_CONNECTIONS",
                    &get("DB_MAX_CONNECTIONS", "10"),
                )?,
                acquire_timeout: Duration::from_secs(parse_value(
                    "DB_ACQUIRE_TIMEOUT_SECS",
                    &get("DB_ACQUIRE_TIMEOUT_SECS", "5"),
                )?),
                operation_timeout: Duration::from_secs(parse_value(
                    "DB_OPERATION_TIMEOUT_SECS",
                    &get("DB_OPERATION_TIMEOUT_SECS", "10"),
                )?),
            },
            log: LogConfig {
                level: get("LOG_LEVEL", "info"),
                json: parse_value("LOG_JSON", &get("LOG_JSON", "false"))?,
            },
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("Invalid value for {key}: {raw:?}"))
}
