//! Logging configuration built on `tracing-subscriber`.
//!
//! The resilience layer emits structured `tracing` events (trips, failed
//! trials, refusals, heals). Embedders that do not install their own
//! subscriber can initialise one from [`LoggingConfig`].

use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::errors::{PrintError, PrintResult};

/// Log verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Finest-grained events.
    Trace,
    /// Debugging events, including gate decisions.
    Debug,
    /// Normal operational events.
    #[default]
    Info,
    /// Trips, failed trials, and masked causes.
    Warn,
    /// Unrecoverable problems.
    Error,
}

impl LogLevel {
    /// Filter directive string for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Newline-delimited JSON, for log shippers.
    Json,
    /// Multi-line human-readable output.
    #[default]
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

/// Logging configuration.
///
/// ```
/// use printserv_resilience::{LogFormat, LogLevel, LoggingConfig};
///
/// let config = LoggingConfig::default()
///     .with_level(LogLevel::Debug)
///     .with_format(LogFormat::Json);
/// assert_eq!(config.level, LogLevel::Debug);
/// assert_eq!(config.format, LogFormat::Json);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default verbosity, overridden by `RUST_LOG` when set.
    #[serde(default)]
    pub level: LogLevel,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Include the event's target module in the output.
    #[serde(default)]
    pub include_target: bool,
}

impl LoggingConfig {
    /// Sets the verbosity level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Enables or disables the event target in the output.
    pub fn with_target(mut self, include: bool) -> Self {
        self.include_target = include;
        self
    }

    /// Installs a global subscriber for this configuration.
    ///
    /// Fails if a global subscriber is already installed.
    pub fn init(self) -> PrintResult<()> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));

        let result = match self.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_target(self.include_target))
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().pretty().with_target(self.include_target))
                .try_init(),
            LogFormat::Compact => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact().with_target(self.include_target))
                .try_init(),
        };
        result.map_err(|e| PrintError::configuration(format!("failed to initialise logging: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogFormat::default(), LogFormat::Pretty);

        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.include_target);
    }

    #[test]
    fn test_builder_methods() {
        let config = LoggingConfig::default()
            .with_level(LogLevel::Trace)
            .with_format(LogFormat::Compact)
            .with_target(true);
        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.include_target);
    }

    #[test]
    fn test_level_conversions() {
        assert_eq!(LogLevel::Warn.as_str(), "warn");
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(tracing::Level::from(LogLevel::Error), tracing::Level::ERROR);
    }

    #[test]
    fn test_serde_forms() {
        let json = serde_json::to_string(&LogFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");

        let config: LoggingConfig =
            serde_json::from_str(r#"{"level": "debug", "format": "compact"}"#).unwrap();
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Compact);
    }
}
