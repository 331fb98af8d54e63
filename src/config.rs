//! Where the engine lives and how to talk to it.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENGINE_VAR: &str = "FAAS_ENGINE";
pub const TIMEOUT_VAR: &str = "FAAS_TIMEOUT_MS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid engine address '{0}', expected tcp://<host>:<port>")]
    InvalidAddress(String),
    #[error("Invalid configuration")]
    Json(#[from] serde_json::Error),
    #[error("Environment variable {var} is {reason}")]
    Env { var: &'static str, reason: String },
}

/// Engine endpoint, written as `tcp://<host>:<port>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EngineAddress {
    host: String,
    port: u16,
}

impl EngineAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn localhost(port: u16) -> Self {
        Self::new("localhost", port)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, as accepted by `ToSocketAddrs`.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for EngineAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tcp://{}:{}", self.host, self.port)
    }
}

impl FromStr for EngineAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidAddress(s.to_owned());
        let rest = s.strip_prefix("tcp://").unwrap_or(s);
        let (host, port) = rest.rsplit_once(':').ok_or_else(invalid)?;
        // Bracketed IPv6 literals keep their brackets for `ToSocketAddrs`.
        if host.is_empty() || (host.contains(':') && !host.starts_with('[')) {
            return Err(invalid());
        }
        let port = port.parse().map_err(|_| invalid())?;
        Ok(Self::new(host, port))
    }
}

impl TryFrom<String> for EngineAddress {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EngineAddress> for String {
    fn from(value: EngineAddress) -> Self {
        value.to_string()
    }
}

/// Tokio runtime backing the blocking client.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeKind {
    #[default]
    SingleThreaded,
    MultiThreaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub address: EngineAddress,
    /// Give up on a reply after this many milliseconds. Unset waits forever.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub runtime: RuntimeKind,
}

impl ClientConfig {
    pub fn new(address: EngineAddress) -> Self {
        Self {
            address,
            timeout_ms: None,
            runtime: RuntimeKind::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis().try_into().unwrap_or(u64::MAX));
        self
    }

    pub fn with_runtime(mut self, runtime: RuntimeKind) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read the configuration from `FAAS_ENGINE` and `FAAS_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let address = lookup(ENGINE_VAR).ok_or(ConfigError::Env {
            var: ENGINE_VAR,
            reason: "not set".to_owned(),
        })?;
        let mut config = Self::new(address.parse()?);
        if let Some(timeout) = lookup(TIMEOUT_VAR) {
            let timeout = timeout.parse::<u64>().map_err(|e| ConfigError::Env {
                var: TIMEOUT_VAR,
                reason: format!("not a number of milliseconds: {e}"),
            })?;
            config.timeout_ms = Some(timeout);
        }
        Ok(config)
    }
}
