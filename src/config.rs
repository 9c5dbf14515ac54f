//! Configuration for the CIL proxy
//!
//! Loads configuration from a TOML file. Every field has a default so a
//! minimal file (or none at all) gives a proxy aimed at a local simulator.

use crate::error::{Error, Result};
use crate::protocol::{HEADER_LEN, MAX_DATAGRAM_LEN};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// UDP link to the far end
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Local port used for sending and receiving (0 = ephemeral)
    #[serde(default)]
    pub local_port: u16,

    /// Far-end host name or address
    #[serde(default = "default_remote_host")]
    pub remote_host: String,

    /// Far-end UDP port
    #[serde(default = "default_remote_port")]
    pub remote_port: u16,

    /// Endpoint id written as txId in outgoing datagrams
    #[serde(default = "default_local_id")]
    pub local_id: i32,

    /// Endpoint id written as rxId in outgoing datagrams
    #[serde(default = "default_remote_id")]
    pub remote_id: i32,

    /// Service class tag written into outgoing datagrams
    #[serde(default = "default_service_class")]
    pub service_class: i32,

    /// Receive poll timeout; bounds how long shutdown waits on the receive loop
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Receive buffer size in bytes; longer datagrams are truncated
    #[serde(default = "default_receive_buffer")]
    pub receive_buffer: usize,
}

fn default_remote_host() -> String {
    "127.0.0.1".to_string()
}
fn default_remote_port() -> u16 {
    13021
}
fn default_local_id() -> i32 {
    17
}
fn default_remote_id() -> i32 {
    1
}
fn default_service_class() -> i32 {
    1
}
fn default_read_timeout_ms() -> u64 {
    250
}
fn default_receive_buffer() -> usize {
    MAX_DATAGRAM_LEN
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            local_port: 0,
            remote_host: default_remote_host(),
            remote_port: default_remote_port(),
            local_id: default_local_id(),
            remote_id: default_remote_id(),
            service_class: default_service_class(),
            read_timeout_ms: default_read_timeout_ms(),
            receive_buffer: default_receive_buffer(),
        }
    }
}

impl NetworkConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Proxy behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    /// Wire dialect: "tcs" or "simulator"
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Sequence counter start; the first command is sent with `start_sequence + 1`
    #[serde(default)]
    pub start_sequence: i32,

    /// Dispatch loop poll interval
    #[serde(default = "default_dispatch_poll_ms")]
    pub dispatch_poll_ms: u64,

    /// Handling time for command types missing from `timeouts`
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Handling time per command type name (e.g. "SLEW"), milliseconds
    #[serde(default)]
    pub timeouts: HashMap<String, u64>,
}

fn default_dialect() -> String {
    "tcs".to_string()
}
fn default_dispatch_poll_ms() -> u64 {
    200
}
fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            start_sequence: 0,
            dispatch_poll_ms: default_dispatch_poll_ms(),
            default_timeout_ms: default_timeout_ms(),
            timeouts: HashMap::new(),
        }
    }
}

impl ProxyConfig {
    pub fn dispatch_poll(&self) -> Duration {
        Duration::from_millis(self.dispatch_poll_ms)
    }

    /// Initial handling time for a command type
    pub fn handling_time(&self, command_type: &str) -> Duration {
        let ms = self
            .timeouts
            .get(command_type)
            .copied()
            .unwrap_or(self.default_timeout_ms);
        Duration::from_millis(ms)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Default log filter (trace, debug, info, warn, error); RUST_LOG overrides
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    ///
    /// # Example
    /// ```no_run
    /// use cil_proxy::config::Config;
    ///
    /// let config = Config::from_file("cil-proxy.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Render as pretty TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the proxy cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.network.remote_host.trim().is_empty() {
            return Err(Error::Config("network.remote_host is empty".to_string()));
        }
        if self.network.remote_port == 0 {
            return Err(Error::Config("network.remote_port must be non-zero".to_string()));
        }
        if self.network.read_timeout_ms == 0 {
            return Err(Error::Config(
                "network.read_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.network.receive_buffer <= HEADER_LEN {
            return Err(Error::Config(format!(
                "network.receive_buffer must exceed the {}-byte header, got {}",
                HEADER_LEN, self.network.receive_buffer
            )));
        }
        if self.proxy.dispatch_poll_ms == 0 {
            return Err(Error::Config(
                "proxy.dispatch_poll_ms must be non-zero".to_string(),
            ));
        }
        if self.proxy.start_sequence < 0 {
            return Err(Error::Config(format!(
                "proxy.start_sequence must be non-negative, got {}",
                self.proxy.start_sequence
            )));
        }
        Ok(())
    }
}
