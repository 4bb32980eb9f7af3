//! # Print Server Resilience
//!
//! Circuit breakers guarding the print server's external collaborators
//! (accounting backend, print portal, printer SNMP polling, notification
//! relay).
//!
//! - Two-state breaker: closed until a run of consecutive qualifying
//!   failures, then open for a fixed cooldown
//! - Single trial call per cooldown window; a successful trial heals the
//!   circuit, a failed one restarts the window
//! - Business errors (insufficient credit, validation) configurable as
//!   non-tripping per circuit
//! - Named registry handing out one shared breaker per collaborator
//! - Sync and async execution over the same gate
//! - Hooks, counters, and structured `tracing` events for observability
//!
//! ## Quick Start
//!
//! ```rust
//! use printserv_resilience::{
//!     circuit_names, CircuitBreakerRegistry, PrintError, RegistryConfig,
//! };
//!
//! fn main() -> Result<(), PrintError> {
//!     let registry = CircuitBreakerRegistry::from_config(&RegistryConfig::with_server_defaults())?;
//!
//!     let breaker = registry.get(circuit_names::ACCOUNTING)?;
//!     let receipt = breaker.execute(|_| Ok("charged 3 pages".to_string()))?;
//!     assert_eq!(receipt, "charged 3 pages");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - `resilience` - Circuit breaker state machine and named registry
//! - `config` - Breaker and registry configuration with per-circuit presets
//! - `errors` - Error taxonomy shared with the guarded collaborators
//! - `observability` - Logging setup and activity counters
//! - `mocks` - Scripted collaborators for testing

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;

// Resilience
pub mod resilience;

// Observability
pub mod observability;

// Mocks for testing
pub mod mocks;

// Re-exports for convenience
pub use config::{
    circuit_names, CircuitBreakerConfig, CircuitBreakerConfigBuilder, RegistryConfig,
};
pub use errors::{PrintError, PrintErrorKind, PrintResult};
pub use observability::{
    CircuitMetrics, LogFormat, LogLevel, LoggingConfig, MetricsHook, MetricsSnapshot,
};
pub use resilience::{
    CircuitBreaker, CircuitBreakerHook, CircuitBreakerRegistry, CircuitState, CircuitStatus,
};
