//! Configuration for the booking server.
//!
//! Defaults can be overridden with environment variables:
//!
//! - `TRIP_BIND_ADDR` (default: "0.0.0.0")
//! - `TRIP_PORT`      (default: "8888")

use std::env;

use trip_core::limits::SERVER_PORT;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on; 0 lets the OS pick one.
    pub port: u16,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid {key}={value:?}: {source}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    #[source]
    pub source: std::num::ParseIntError,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: SERVER_PORT,
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();
        let bind_addr = lookup("TRIP_BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = match lookup("TRIP_PORT") {
            Some(value) => value.trim().parse().map_err(|source| ConfigError {
                key: "TRIP_PORT",
                value,
                source,
            })?,
            None => defaults.port,
        };

        Ok(Config { bind_addr, port })
    }

    /// `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}
