//! # Runtime Configuration Module
//!
//! Configuration for the coroutine runtime and the bundled HTTP server.
//!
//! ## Environment Variables
//!
//! ### `PATHMUX_STACK_SIZE`
//!
//! Stack size of the coroutines that serve requests. Accepts decimal
//! (`32768`) or hexadecimal (`0x8000`). Default: `0x8000` (32 KB).
//!
//! Memory use is roughly `stack_size × concurrent requests`; a handler that
//! recurses deeply or keeps large locals needs a bigger stack.
//!
//! ### `PATHMUX_ADDR`
//!
//! Listen address of the server. Default: `127.0.0.1:8080`.
//!
//! ### `PATHMUX_LOG_REQUESTS`
//!
//! `true`/`false`: whether each served request is logged at INFO.
//! Default: `true`.
//!
//! ## Configuration File
//!
//! [`ServerConfig::load`] reads the same settings from YAML. Environment
//! variables override values from the file:
//!
//! ```yaml
//! addr: "0.0.0.0:9000"
//! stack_size: 0x10000
//! log_requests: false
//! ```

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default coroutine stack size in bytes.
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

/// Default listen address.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 32 KB / 0x8000)
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let stack_size = env::var("PATHMUX_STACK_SIZE")
            .ok()
            .and_then(|val| parse_size(&val))
            .unwrap_or(DEFAULT_STACK_SIZE);
        RuntimeConfig { stack_size }
    }

    /// Apply the stack size to coroutines spawned from now on.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}

/// Parse a decimal or `0x`-prefixed hexadecimal byte count.
#[must_use]
pub fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}

/// Settings of the bundled HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address
    pub addr: String,
    /// Coroutine stack size in bytes
    #[serde(deserialize_with = "deserialize_size")]
    pub stack_size: usize,
    /// Log one INFO line per served request
    pub log_requests: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            stack_size: DEFAULT_STACK_SIZE,
            log_requests: true,
        }
    }
}

impl ServerConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Read a YAML file, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse YAML without consulting the environment.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML, unknown keys or mistyped values.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Override fields from `PATHMUX_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("PATHMUX_ADDR") {
            self.addr = addr;
        }
        if let Some(val) = lookup("PATHMUX_STACK_SIZE") {
            match parse_size(&val) {
                Some(size) => self.stack_size = size,
                None => warn!(value = %val, "Ignoring invalid PATHMUX_STACK_SIZE"),
            }
        }
        if let Some(val) = lookup("PATHMUX_LOG_REQUESTS") {
            match val.trim().parse() {
                Ok(flag) => self.log_requests = flag,
                Err(_) => warn!(value = %val, "Ignoring invalid PATHMUX_LOG_REQUESTS"),
            }
        }
    }

    /// The runtime part of this configuration.
    #[must_use]
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            stack_size: self.stack_size,
        }
    }
}

fn deserialize_size<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(usize),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => parse_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid size: {s}"))),
    }
}
