//! Keyed registry of circuit breakers, one per collaborator name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::circuit_breaker::{CircuitBreaker, CircuitBreakerHook, CircuitStatus};
use crate::config::{CircuitBreakerConfig, RegistryConfig};
use crate::errors::{PrintError, PrintResult};

/// Registry of named circuit breakers.
///
/// One instance is shared behind an `Arc` by every component that talks to
/// an external collaborator; it is injected where needed rather than held
/// in process-wide state. Creation is lazy and atomic: under concurrent
/// first access to a name, at most one breaker instance is ever visible.
pub struct CircuitBreakerRegistry {
    circuits: RwLock<HashMap<String, Arc<CircuitBreaker>>>,
    defaults: CircuitBreakerConfig,
    hook: Option<Arc<dyn CircuitBreakerHook>>,
}

impl CircuitBreakerRegistry {
    /// Creates an empty registry with default breaker configuration.
    pub fn new() -> Self {
        Self::with_defaults(CircuitBreakerConfig::default())
    }

    /// Creates an empty registry; lazily created breakers use `defaults`.
    pub fn with_defaults(defaults: CircuitBreakerConfig) -> Self {
        Self {
            circuits: RwLock::new(HashMap::new()),
            defaults,
            hook: None,
        }
    }

    /// Builds a registry from configuration, pre-registering every circuit
    /// it lists.
    pub fn from_config(config: &RegistryConfig) -> PrintResult<Self> {
        config.validate()?;
        let registry = Self::with_defaults(config.defaults.clone());
        registry.register_configured(config);
        Ok(registry)
    }

    /// Like [`from_config`](Self::from_config), attaching `hook` to every
    /// breaker the registry creates, pre-registered ones included.
    pub fn from_config_with_hook(
        config: &RegistryConfig,
        hook: Arc<dyn CircuitBreakerHook>,
    ) -> PrintResult<Self> {
        config.validate()?;
        let registry = Self::with_defaults(config.defaults.clone()).with_hook(hook);
        registry.register_configured(config);
        Ok(registry)
    }

    /// Attaches a hook propagated to every breaker created afterwards.
    pub fn with_hook(mut self, hook: Arc<dyn CircuitBreakerHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    fn register_configured(&self, config: &RegistryConfig) {
        for (name, circuit_config) in &config.circuits {
            self.get_or_create_with(name, circuit_config.clone());
        }
    }

    /// Returns the breaker registered under `name`, creating it with the
    /// registry defaults if absent.
    pub fn get_or_create(&self, name: &str) -> Arc<CircuitBreaker> {
        self.get_or_create_with(name, self.defaults.clone())
    }

    /// Like [`get_or_create`](Self::get_or_create) with an explicit
    /// configuration for the first registration.
    ///
    /// An existing breaker is returned untouched; live configuration is
    /// only replaced through
    /// [`CircuitBreaker::reconfigure`](super::CircuitBreaker::reconfigure).
    pub fn get_or_create_with(
        &self,
        name: &str,
        config: CircuitBreakerConfig,
    ) -> Arc<CircuitBreaker> {
        if let Some(breaker) = self.circuits.read().get(name) {
            return Arc::clone(breaker);
        }

        let mut circuits = self.circuits.write();
        // Double-checked: another caller may have registered between locks.
        let breaker = circuits.entry(name.to_string()).or_insert_with(|| {
            debug!(circuit = %name, "registering circuit breaker");
            let mut breaker = CircuitBreaker::new(name, config);
            if let Some(hook) = &self.hook {
                breaker = breaker.with_hook(Arc::clone(hook));
            }
            Arc::new(breaker)
        });
        Arc::clone(breaker)
    }

    /// Returns the breaker registered under `name`.
    ///
    /// Fails with an unknown-circuit error when nothing is registered; use
    /// this where startup configuration is expected to have registered the
    /// circuit already.
    pub fn get(&self, name: &str) -> PrintResult<Arc<CircuitBreaker>> {
        self.circuits
            .read()
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| PrintError::unknown_circuit(name))
    }

    /// Returns true when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.circuits.read().contains_key(name)
    }

    /// Registered circuit names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.circuits.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Status snapshots of every registered breaker, sorted by name.
    pub fn statuses(&self) -> Vec<CircuitStatus> {
        let breakers: Vec<Arc<CircuitBreaker>> =
            self.circuits.read().values().cloned().collect();
        let mut statuses: Vec<CircuitStatus> = breakers.iter().map(|b| b.status()).collect();
        statuses.sort_by(|a, b| a.circuit.cmp(&b.circuit));
        statuses
    }

    /// Number of registered circuits.
    pub fn len(&self) -> usize {
        self.circuits.read().len()
    }

    /// Returns true when no circuit is registered.
    pub fn is_empty(&self) -> bool {
        self.circuits.read().is_empty()
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CircuitBreakerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreakerRegistry")
            .field("circuits", &self.names())
            .finish()
    }
}
