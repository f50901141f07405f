//! Configuration management for the RAX FTP client
//!
//! Holds the connection target, credentials, text encoding, per-operation
//! timeouts and upload behaviour. Values come from an optional TOML file with
//! environment overrides, or are built in code.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::transport::{TextEncoding, Timeouts};

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}

/// Complete client configuration. Immutable once a client is built from it.
#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    /// Server host name or IP address
    pub host: String,

    /// Control connection port (21 for most servers)
    pub port: u16,

    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Encoding of control replies and listings
    #[serde(default)]
    pub encoding: TextEncoding,

    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub receive_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub send_timeout_ms: u64,

    /// Create missing remote directories during upload
    #[serde(default = "default_true")]
    pub auto_create_directories: bool,

    /// Connect data channels to the control peer instead of the PASV host
    #[serde(default)]
    pub passive_nat_workaround: bool,
}

impl ClientConfig {
    /// Builds a configuration with default encoding and timeouts.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            encoding: TextEncoding::default(),
            connect_timeout_ms: DEFAULT_TIMEOUT_MS,
            receive_timeout_ms: DEFAULT_TIMEOUT_MS,
            send_timeout_ms: DEFAULT_TIMEOUT_MS,
            auto_create_directories: true,
            passive_nat_workaround: false,
        }
    }

    /// Load configuration from `path` (extension optional, file optional)
    /// with `RAX_FTP_CLIENT__*` environment overrides.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("RAX_FTP_CLIENT").separator("__"))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.host.trim().is_empty() {
            return Err(config::ConfigError::Message("host cannot be empty".into()));
        }

        if self.username.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "username cannot be empty".into(),
            ));
        }

        if self.connect_timeout_ms == 0 || self.receive_timeout_ms == 0 || self.send_timeout_ms == 0
        {
            return Err(config::ConfigError::Message(
                "timeouts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    // --- Builder methods ---

    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Sets connect, receive and send timeouts at once.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let ms = timeout.as_millis() as u64;
        self.connect_timeout_ms = ms;
        self.receive_timeout_ms = ms;
        self.send_timeout_ms = ms;
        self
    }

    pub fn with_receive_timeout(mut self, timeout: Duration) -> Self {
        self.receive_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_auto_create_directories(mut self, enabled: bool) -> Self {
        self.auto_create_directories = enabled;
        self
    }

    pub fn with_passive_nat_workaround(mut self, enabled: bool) -> Self {
        self.passive_nat_workaround = enabled;
        self
    }

    // --- Derived values ---

    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            receive: Duration::from_millis(self.receive_timeout_ms),
            send: Duration::from_millis(self.send_timeout_ms),
        }
    }

    /// Control endpoint as `host:port`
    pub fn control_endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
