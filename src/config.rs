//! Configuration for resplite
//!
//! Connection settings with sensible defaults, plus a named set of them.
//! Loading these values from disk is up to the caller; both types
//! deserialize with serde so any format works.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RespError, Result};

/// Settings for one server endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Endpoint
    // -------------------------------------------------------------------------
    /// Server host name or IP address
    pub host: String,

    /// Server TCP port
    pub port: u16,

    // -------------------------------------------------------------------------
    // Handshake
    // -------------------------------------------------------------------------
    /// Password sent with AUTH; `None` or empty skips the exchange
    pub password: Option<String>,

    /// Logical database selected after AUTH; 0 skips SELECT
    pub database: u32,

    // -------------------------------------------------------------------------
    // Timeouts
    // -------------------------------------------------------------------------
    /// Connect timeout (milliseconds)
    pub connect_timeout_ms: u64,

    /// Per-call read timeout (milliseconds, 0 = block forever)
    pub read_timeout_ms: u64,

    /// Per-call write timeout (milliseconds, 0 = block forever)
    pub write_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Client Behaviour
    // -------------------------------------------------------------------------
    /// What the client does with `-ERR` replies
    pub error_policy: ErrorPolicy,
}

/// How the client surfaces server error replies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Hand `Reply::Error` back to the caller as data
    #[default]
    Return,

    /// Turn `Reply::Error` into `RespError::Server`
    Raise,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
            connect_timeout_ms: 5000,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            error_policy: ErrorPolicy::Return,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` form of the endpoint
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The password, if one is set and non-empty
    pub fn auth_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Option<Duration> {
        non_zero_millis(self.write_timeout_ms)
    }

    /// Check values that would otherwise fail deep inside the socket layer
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(RespError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(RespError::Config("port must not be 0".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(RespError::Config(
                "connect timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_zero_millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the AUTH password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Set the logical database index
    pub fn database(mut self, database: u32) -> Self {
        self.config.database = database;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the server error policy
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.config.error_policy = policy;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// A named set of configurations with a default entry
///
/// ```text
/// { "default": "main",
///   "configurations": { "main": { "host": "10.0.0.5", "port": 6379 } } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSet {
    /// Name used when the caller does not pick one
    pub default: String,

    /// Every defined configuration, by name
    #[serde(default)]
    pub configurations: HashMap<String, Config>,
}

impl ConfigSet {
    /// Create an empty set whose default is `default`
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            default: default.into(),
            configurations: HashMap::new(),
        }
    }

    /// Add or replace a named configuration
    pub fn insert(mut self, name: impl Into<String>, config: Config) -> Self {
        self.configurations.insert(name.into(), config);
        self
    }

    /// Pick the named configuration, or the default one when `name` is None
    pub fn select(&self, name: Option<&str>) -> Result<&Config> {
        let name = name.unwrap_or(&self.default);
        self.configurations.get(name).ok_or_else(|| {
            RespError::Config(format!("'{}' has not been defined in the configuration set", name))
        })
    }
}
