//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use splitledger_observability::LogFormat;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub service_name: String,
    pub http_address: String,
    pub http_port: u16,
    pub request_timeout: Duration,
    pub shutdown_grace: Duration,
    /// Postgres stores are used when set; in-memory stores otherwise.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "splitledger".to_string(),
            http_address: "0.0.0.0".to_string(),
            http_port: 8080,
            request_timeout: Duration::from_secs(30),
            shutdown_grace: Duration::from_secs(5),
            database_url: None,
            database_max_connections: 10,
            log_format: LogFormat::Json,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            service_name: get("SERVICE_NAME").unwrap_or(defaults.service_name),
            http_address: get("HTTP_ADDRESS").unwrap_or(defaults.http_address),
            http_port: parse(get("HTTP_PORT"), "HTTP_PORT")?.unwrap_or(defaults.http_port),
            request_timeout: parse(get("REQUEST_TIMEOUT_SECS"), "REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            shutdown_grace: parse(get("SHUTDOWN_GRACE_SECS"), "SHUTDOWN_GRACE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_grace),
            database_url: get("DATABASE_URL"),
            database_max_connections: parse(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.database_max_connections),
            log_format: match get("LOG_FORMAT") {
                Some(raw) => raw.parse().map_err(|e: splitledger_observability::UnknownLogFormat| {
                    ConfigError::Invalid {
                        key: "LOG_FORMAT",
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })?,
                None => defaults.log_format,
            },
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.http_address, self.http_port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key: "HTTP_ADDRESS",
            value: raw.clone(),
            reason: e.to_string(),
        })
    }
}

fn parse<T>(raw: Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        })
    })
    .transpose()
}
