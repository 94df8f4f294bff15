//! Configuration for a report session.
//!
//! This module provides [`SessionConfig`] and its builder. Defaults match the
//! behaviour users expect from the report generator: a tick every 500 ms,
//! 10% progress per tick and a 28-day retention window.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable overriding [`SessionConfig::tick_interval_ms`].
pub const ENV_TICK_INTERVAL_MS: &str = "REPORT_TICK_INTERVAL_MS";
/// Environment variable overriding [`SessionConfig::progress_step`].
pub const ENV_PROGRESS_STEP: &str = "REPORT_PROGRESS_STEP";
/// Environment variable overriding [`SessionConfig::retention_days`].
pub const ENV_RETENTION_DAYS: &str = "REPORT_RETENTION_DAYS";
/// Environment variable overriding [`SessionConfig::download_base`].
pub const ENV_DOWNLOAD_BASE: &str = "REPORT_DOWNLOAD_BASE";

/// Configuration for a [`ReportSession`](crate::ReportSession).
///
/// Use [`SessionConfig::builder()`] for a validated configuration.
///
/// # Example
///
/// ```
/// use report_session::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .tick_interval_ms(100)
///     .progress_step(20)
///     .build()
///     .expect("valid config");
///
/// assert_eq!(config.ticks_to_complete(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interval between progress ticks, in milliseconds.
    /// Default: 500
    pub tick_interval_ms: u64,

    /// Percentage points added on every tick (1 - 100).
    /// Default: 10
    pub progress_step: u8,

    /// Days a generated report stays active.
    /// Default: 28
    pub retention_days: u32,

    /// Prefix of minted download references.
    /// Default: "reports://generated"
    pub download_base: String,

    /// Extension appended to download references.
    /// Default: "pdf"
    pub download_format: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            progress_step: 10,
            retention_days: 28,
            download_base: "reports://generated".to_string(),
            download_format: "pdf".to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Default configuration with environment overrides applied.
    ///
    /// Unset variables keep their defaults; set-but-unparsable variables are
    /// reported rather than silently ignored.
    pub fn from_env() -> Result<Self, ConfigValidationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_TICK_INTERVAL_MS) {
            config.tick_interval_ms = parse_env(ENV_TICK_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PROGRESS_STEP) {
            config.progress_step = parse_env(ENV_PROGRESS_STEP, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RETENTION_DAYS) {
            config.retention_days = parse_env(ENV_RETENTION_DAYS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DOWNLOAD_BASE) {
            config.download_base = raw;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigValidationError::ZeroTickInterval);
        }

        if !(1..=100).contains(&self.progress_step) {
            return Err(ConfigValidationError::InvalidProgressStep(
                self.progress_step,
            ));
        }

        if self.retention_days == 0 {
            return Err(ConfigValidationError::ZeroRetention);
        }

        if self.download_format.is_empty() || self.download_format.contains('/') {
            return Err(ConfigValidationError::InvalidDownloadFormat(
                self.download_format.clone(),
            ));
        }

        Ok(())
    }

    /// Interval between progress ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Retention window as a chrono duration.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    /// Number of ticks an uncancelled attempt needs to reach 100%.
    pub fn ticks_to_complete(&self) -> u32 {
        let step = u32::from(self.progress_step.max(1));
        100_u32.div_ceil(step)
    }
}

fn parse_env<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T, ConfigValidationError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigValidationError::InvalidEnvValue {
            var: var.to_string(),
            value: raw.to_string(),
        })
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid tick interval: must be at least 1 ms")]
    ZeroTickInterval,

    #[error("Invalid progress step: {0} (must be between 1 and 100)")]
    InvalidProgressStep(u8),

    #[error("Invalid retention: must be at least 1 day")]
    ZeroRetention,

    #[error("Invalid download format '{0}'")]
    InvalidDownloadFormat(String),

    #[error("Invalid value '{value}' for environment variable {var}")]
    InvalidEnvValue { var: String, value: String },
}

/// Builder for [`SessionConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    base: Option<SessionConfig>,
    tick_interval_ms: Option<u64>,
    progress_step: Option<u8>,
    retention_days: Option<u32>,
    download_base: Option<String>,
    download_format: Option<String>,
}

impl SessionConfigBuilder {
    /// Start from an existing configuration instead of the defaults.
    ///
    /// Used by the CLI to layer flags over [`SessionConfig::from_env`].
    pub fn base(mut self, base: SessionConfig) -> Self {
        self.base = Some(base);
        self
    }

    /// Set the interval between ticks in milliseconds.
    pub fn tick_interval_ms(mut self, millis: u64) -> Self {
        self.tick_interval_ms = Some(millis);
        self
    }

    /// Set the percentage added per tick.
    pub fn progress_step(mut self, step: u8) -> Self {
        self.progress_step = Some(step);
        self
    }

    /// Set how many days generated reports stay active.
    pub fn retention_days(mut self, days: u32) -> Self {
        self.retention_days = Some(days);
        self
    }

    /// Set the prefix used for download references.
    pub fn download_base(mut self, base: impl Into<String>) -> Self {
        self.download_base = Some(base.into());
        self
    }

    /// Set the file extension used for download references.
    pub fn download_format(mut self, format: impl Into<String>) -> Self {
        self.download_format = Some(format.into());
        self
    }

    /// Build the configuration, validating all values.
    pub fn build(self) -> Result<SessionConfig, ConfigValidationError> {
        let base = self.base.unwrap_or_default();
        let config = SessionConfig {
            tick_interval_ms: self.tick_interval_ms.unwrap_or(base.tick_interval_ms),
            progress_step: self.progress_step.unwrap_or(base.progress_step),
            retention_days: self.retention_days.unwrap_or(base.retention_days),
            download_base: self.download_base.unwrap_or(base.download_base),
            download_format: self.download_format.unwrap_or(base.download_format),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_millis(500));
        assert_eq!(config.progress_step, 10);
        assert_eq!(config.retention(), chrono::Duration::days(28));
        assert_eq!(config.ticks_to_complete(), 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_overrides() {
        let config = SessionConfig::builder()
            .tick_interval_ms(50)
            .progress_step(25)
            .retention_days(7)
            .download_base("https://files.example.com")
            .download_format("csv")
            .build()
            .unwrap();

        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.ticks_to_complete(), 4);
        assert_eq!(config.retention_days, 7);
        assert_eq!(config.download_base, "https://files.example.com");
        assert_eq!(config.download_format, "csv");
    }

    #[test]
    fn test_uneven_step_rounds_up() {
        let config = SessionConfig::builder().progress_step(30).build().unwrap();
        assert_eq!(config.ticks_to_complete(), 4);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(matches!(
            SessionConfig::builder().tick_interval_ms(0).build(),
            Err(ConfigValidationError::ZeroTickInterval)
        ));
        assert!(matches!(
            SessionConfig::builder().progress_step(0).build(),
            Err(ConfigValidationError::InvalidProgressStep(0))
        ));
        assert!(matches!(
            SessionConfig::builder().progress_step(101).build(),
            Err(ConfigValidationError::InvalidProgressStep(101))
        ));
        assert!(matches!(
            SessionConfig::builder().retention_days(0).build(),
            Err(ConfigValidationError::ZeroRetention)
        ));
        assert!(matches!(
            SessionConfig::builder().download_format("").build(),
            Err(ConfigValidationError::InvalidDownloadFormat(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_TICK_INTERVAL_MS, "25"),
            (ENV_PROGRESS_STEP, " 20 "),
            (ENV_DOWNLOAD_BASE, "file:///tmp/reports"),
        ]
        .into_iter()
        .collect();

        let config =
            SessionConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.tick_interval_ms, 25);
        assert_eq!(config.progress_step, 20);
        assert_eq!(config.retention_days, 28);
        assert_eq!(config.download_base, "file:///tmp/reports");
    }

    #[test]
    fn test_env_rejects_unparsable_value() {
        let err = SessionConfig::from_lookup(|key| {
            (key == ENV_RETENTION_DAYS).then(|| "four weeks".to_string())
        })
        .unwrap_err();

        assert!(err.to_string().contains(ENV_RETENTION_DAYS));
        assert!(err.to_string().contains("four weeks"));
    }

    #[test]
    fn test_builder_layers_over_base() {
        let base = SessionConfig::builder().tick_interval_ms(10).build().unwrap();
        let config = SessionConfig::builder()
            .base(base)
            .progress_step(50)
            .build()
            .unwrap();

        assert_eq!(config.tick_interval_ms, 10);
        assert_eq!(config.progress_step, 50);
    }

    #[test]
    fn test_config_json_roundtrip_fields() {
        let json = serde_json::to_string(&SessionConfig::default()).unwrap();
        assert!(json.contains("\"tick_interval_ms\":500"));
        assert!(json.contains("\"retention_days\":28"));
    }
}
