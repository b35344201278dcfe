//! Global configuration parsing and validation.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// Configurable timeout values (seconds) for blocking workflow phases.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Per-task fetch timeout during fan-out.
    #[serde(default = "default_fetch_seconds")]
    pub fetch_seconds: u64,
    /// Approval request lifetime before automatic expiry.
    #[serde(default = "default_approval_seconds")]
    pub approval_seconds: u64,
    /// Interval between background expiry sweeps.
    #[serde(default = "default_sweep_seconds")]
    pub sweep_seconds: u64,
}

fn default_fetch_seconds() -> u64 {
    10
}

fn default_approval_seconds() -> u64 {
    3600
}

fn default_sweep_seconds() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            fetch_seconds: default_fetch_seconds(),
            approval_seconds: default_approval_seconds(),
            sweep_seconds: default_sweep_seconds(),
        }
    }
}

impl TimeoutConfig {
    /// Per-task fetch timeout as a [`Duration`].
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_seconds)
    }

    /// Approval lifetime as a [`Duration`].
    #[must_use]
    pub fn approval_ttl(&self) -> Duration {
        Duration::from_secs(self.approval_seconds)
    }
}

/// Bounded exponential backoff policy for transient source failures.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Total attempts per fetch, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound on the per-retry delay.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    8000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// HTTP port for the JSON API.
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// City assumed when the caller omits one.
    #[serde(default = "default_city")]
    pub default_city: String,
    /// Timeout configuration for blocking flows.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Backoff policy for transient fetch failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_http_port() -> u16 {
    3000
}

fn default_city() -> String {
    "Bengaluru".into()
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            http_port: default_http_port(),
            default_city: default_city(),
            timeouts: TimeoutConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be greater than zero".into(),
            ));
        }

        if self.timeouts.fetch_seconds == 0 {
            return Err(AppError::Config(
                "timeouts.fetch_seconds must be greater than zero".into(),
            ));
        }

        if self.timeouts.approval_seconds == 0 {
            return Err(AppError::Config(
                "timeouts.approval_seconds must be greater than zero".into(),
            ));
        }

        if self.timeouts.sweep_seconds == 0 {
            return Err(AppError::Config(
                "timeouts.sweep_seconds must be greater than zero".into(),
            ));
        }

        if self.default_city.trim().is_empty() {
            return Err(AppError::Config("default_city must not be empty".into()));
        }

        Ok(())
    }
}
