//! Configuration for circuit breakers and the registry.
//!
//! All types are serde-friendly so deployments can describe their circuits
//! in configuration files; durations accept humantime strings such as
//! `"30s"` or `"1s 500ms"`. Builders validate on `build()`, and every type
//! exposes `validate()` for configurations assembled field by field.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{PrintError, PrintErrorKind, PrintResult};

/// Well-known circuit names for the server's external collaborators.
pub mod circuit_names {
    /// Billing/accounting server.
    pub const ACCOUNTING: &str = "accounting";
    /// SOAP print portal.
    pub const PRINT_PORTAL: &str = "print-portal";
    /// SNMP printer polling.
    pub const PRINTER_POLLING: &str = "printer-polling";
    /// E-mail/notification API.
    pub const NOTIFICATIONS: &str = "notifications";
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_cooldown() -> Duration {
    Duration::from_secs(30)
}

/// Configuration for a single circuit breaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive tripping failures after which the circuit opens.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// How long the circuit refuses all calls after opening or after a
    /// failed trial.
    #[serde(default = "default_cooldown", with = "humantime_serde")]
    pub cooldown: Duration,

    /// Error kinds that never increment the failure count while closed.
    ///
    /// Kinds not listed here count against the threshold. The set is not
    /// consulted while the circuit is open.
    #[serde(default)]
    pub non_tripping: Vec<PrintErrorKind>,

    /// Log masked causes with their full debug representation instead of
    /// the display form.
    #[serde(default)]
    pub log_error_detail: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown: default_cooldown(),
            non_tripping: Vec::new(),
            log_error_detail: false,
        }
    }
}

impl CircuitBreakerConfig {
    /// Creates a configuration builder.
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> PrintResult<()> {
        if self.failure_threshold == 0 {
            return Err(PrintError::configuration(
                "failure_threshold must be at least 1",
            ));
        }
        Ok(())
    }

    /// Returns true when `kind` is registered as non-tripping.
    pub fn is_non_tripping(&self, kind: PrintErrorKind) -> bool {
        self.non_tripping.contains(&kind)
    }

    /// Defaults for the billing/accounting server circuit.
    ///
    /// Business refusals say nothing about the server's health, so they do
    /// not count against the threshold.
    pub fn for_accounting() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(60),
            non_tripping: vec![
                PrintErrorKind::InsufficientCredit,
                PrintErrorKind::AccountNotFound,
                PrintErrorKind::ValidationFailed,
            ],
            log_error_detail: false,
        }
    }

    /// Defaults for the SOAP print portal circuit.
    pub fn for_print_portal() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(120),
            non_tripping: vec![
                PrintErrorKind::InvalidJobTicket,
                PrintErrorKind::ValidationFailed,
            ],
            log_error_detail: false,
        }
    }

    /// Defaults for the SNMP printer polling circuit.
    ///
    /// Printers stay offline for long stretches; a short threshold and a
    /// long cooldown avoid hammering devices that are switched off.
    pub fn for_printer_polling() -> Self {
        Self {
            failure_threshold: 2,
            cooldown: Duration::from_secs(300),
            non_tripping: Vec::new(),
            log_error_detail: false,
        }
    }

    /// Defaults for the e-mail/notification API circuit.
    pub fn for_notifications() -> Self {
        Self {
            failure_threshold: 4,
            cooldown: Duration::from_secs(60),
            non_tripping: vec![PrintErrorKind::ValidationFailed],
            log_error_detail: false,
        }
    }
}

/// Builder for [`CircuitBreakerConfig`].
#[derive(Debug, Clone, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    /// Sets the failure threshold.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Sets the cooldown.
    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    /// Sets the cooldown in milliseconds.
    pub fn cooldown_ms(mut self, millis: u64) -> Self {
        self.config.cooldown = Duration::from_millis(millis);
        self
    }

    /// Replaces the set of non-tripping error kinds.
    pub fn non_tripping(mut self, kinds: impl IntoIterator<Item = PrintErrorKind>) -> Self {
        self.config.non_tripping = kinds.into_iter().collect();
        self
    }

    /// Enables or disables detailed logging of masked causes.
    pub fn log_error_detail(mut self, enabled: bool) -> Self {
        self.config.log_error_detail = enabled;
        self
    }

    /// Validates and returns the configuration.
    pub fn build(self) -> PrintResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Registry-wide configuration: defaults for lazily created circuits plus
/// the circuits registered at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Configuration applied to circuits created lazily by name.
    #[serde(default)]
    pub defaults: CircuitBreakerConfig,

    /// Per-circuit configurations registered when the registry is built.
    #[serde(default)]
    pub circuits: HashMap<String, CircuitBreakerConfig>,
}

impl RegistryConfig {
    /// The configuration the server ships with: one circuit per external
    /// collaborator, each with its preset.
    pub fn with_server_defaults() -> Self {
        let mut circuits = HashMap::new();
        circuits.insert(
            circuit_names::ACCOUNTING.to_string(),
            CircuitBreakerConfig::for_accounting(),
        );
        circuits.insert(
            circuit_names::PRINT_PORTAL.to_string(),
            CircuitBreakerConfig::for_print_portal(),
        );
        circuits.insert(
            circuit_names::PRINTER_POLLING.to_string(),
            CircuitBreakerConfig::for_printer_polling(),
        );
        circuits.insert(
            circuit_names::NOTIFICATIONS.to_string(),
            CircuitBreakerConfig::for_notifications(),
        );
        Self {
            defaults: CircuitBreakerConfig::default(),
            circuits,
        }
    }

    /// Validates the defaults and every configured circuit.
    pub fn validate(&self) -> PrintResult<()> {
        self.defaults.validate()?;
        for (name, config) in &self.circuits {
            if name.trim().is_empty() {
                return Err(PrintError::configuration(
                    "circuit names must not be empty",
                ));
            }
            config.validate()?;
        }
        Ok(())
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn test_default_config() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.cooldown, Duration::from_secs(30));
        assert!(config.non_tripping.is_empty());
        assert!(!config.log_error_detail);
        assert!(config.validate().is_ok());
    }

    #[test_case(1)]
    #[test_case(2)]
    #[test_case(100)]
    fn test_builder_accepts_valid_thresholds(threshold: u32) {
        let config = CircuitBreakerConfig::builder()
            .failure_threshold(threshold)
            .build()
            .unwrap();
        assert_eq!(config.failure_threshold, threshold);
    }

    #[test]
    fn test_builder_rejects_zero_threshold() {
        let err = CircuitBreakerConfig::builder()
            .failure_threshold(0)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), PrintErrorKind::Configuration);
    }

    #[test]
    fn test_builder_sets_all_fields() {
        let config = CircuitBreakerConfig::builder()
            .failure_threshold(2)
            .cooldown_ms(1000)
            .non_tripping([PrintErrorKind::InsufficientCredit])
            .log_error_detail(true)
            .build()
            .unwrap();

        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.cooldown, Duration::from_millis(1000));
        assert!(config.is_non_tripping(PrintErrorKind::InsufficientCredit));
        assert!(!config.is_non_tripping(PrintErrorKind::ConnectionRefused));
        assert!(config.log_error_detail);
    }

    #[test]
    fn test_deserialize_with_humantime_durations() {
        let json = r#"{
            "failure_threshold": 2,
            "cooldown": "1s 500ms",
            "non_tripping": ["insufficient_credit", "account_not_found"]
        }"#;
        let config: CircuitBreakerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.failure_threshold, 2);
        assert_eq!(config.cooldown, Duration::from_millis(1500));
        assert!(config.is_non_tripping(PrintErrorKind::AccountNotFound));
    }

    #[test]
    fn test_deserialize_empty_object_uses_defaults() {
        let config: CircuitBreakerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CircuitBreakerConfig::default());
    }

    #[test]
    fn test_serde_round_trip() {
        let config = CircuitBreakerConfig::for_print_portal();
        let json = serde_json::to_string(&config).unwrap();
        let back: CircuitBreakerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_presets_are_valid() {
        for preset in [
            CircuitBreakerConfig::for_accounting(),
            CircuitBreakerConfig::for_print_portal(),
            CircuitBreakerConfig::for_printer_polling(),
            CircuitBreakerConfig::for_notifications(),
        ] {
            assert!(preset.validate().is_ok());
        }
        assert!(CircuitBreakerConfig::for_accounting()
            .is_non_tripping(PrintErrorKind::InsufficientCredit));
    }

    #[test]
    fn test_server_defaults_cover_all_collaborators() {
        let config = RegistryConfig::with_server_defaults();
        assert!(config.validate().is_ok());
        assert_eq!(config.circuits.len(), 4);
        for name in [
            circuit_names::ACCOUNTING,
            circuit_names::PRINT_PORTAL,
            circuit_names::PRINTER_POLLING,
            circuit_names::NOTIFICATIONS,
        ] {
            assert!(config.circuits.contains_key(name), "missing {}", name);
        }
    }

    #[test]
    fn test_registry_config_rejects_empty_names() {
        let mut config = RegistryConfig::default();
        config
            .circuits
            .insert("  ".to_string(), CircuitBreakerConfig::default());
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), PrintErrorKind::Configuration);
    }

    #[test]
    fn test_registry_config_rejects_invalid_circuit() {
        let mut config = RegistryConfig::default();
        config.circuits.insert(
            "accounting".to_string(),
            CircuitBreakerConfig {
                failure_threshold: 0,
                ..CircuitBreakerConfig::default()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_registry_config_deserializes_nested_circuits() {
        let json = r#"{
            "defaults": { "failure_threshold": 3 },
            "circuits": {
                "accounting": { "cooldown": "2m" }
            }
        }"#;
        let config: RegistryConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.defaults.failure_threshold, 3);
        let accounting = &config.circuits["accounting"];
        assert_eq!(accounting.cooldown, Duration::from_secs(120));
        assert_eq!(accounting.failure_threshold, 5);
    }
}
