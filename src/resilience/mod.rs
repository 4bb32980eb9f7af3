//! Resilience primitives guarding the server's external collaborators.
//!
//! A [`CircuitBreaker`] wraps every outbound call to one collaborator; the
//! [`CircuitBreakerRegistry`] hands out one shared breaker per circuit name.

mod circuit_breaker;
mod registry;


pub use circuit_breaker::{CircuitBreaker, CircuitBreakerHook, CircuitState, CircuitStatus};
pub use registry::CircuitBreakerRegistry;
