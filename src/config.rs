//! Server configuration from environment variables (`.env` is loaded by the binary).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/pocket_miner";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::UnknownStore(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub store: StoreBackend,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub body_limit: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads through `lookup`; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match lookup("POCKET_MINER_STORE") {
            Some(v) => v.parse()?,
            None => StoreBackend::Postgres,
        };
        Ok(ServerConfig {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            store,
            bind_addr: parse_var(&lookup, "BIND_ADDR", DEFAULT_BIND_ADDR.parse().ok())?,
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS", Some(DEFAULT_MAX_CONNECTIONS))?,
            body_limit: parse_var(&lookup, "BODY_LIMIT_BYTES", Some(DEFAULT_BODY_LIMIT_BYTES))?,
        })
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: Option<T>) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
            var,
            reason: e.to_string(),
        }),
        None => default.ok_or_else(|| ConfigError::InvalidVar {
            var,
            reason: "no default".into(),
        }),
    }
}
