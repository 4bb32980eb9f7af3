//! Accounting Backend Guarding Example
//!
//! This example demonstrates how to:
//! - Create a circuit breaker for the accounting backend
//! - Run guarded calls through an outage and watch the circuit trip
//! - Wait out the cooldown and heal through the trial call

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use printserv_resilience::{
    circuit_names, CircuitBreakerConfig, CircuitBreakerRegistry, PrintError, PrintErrorKind,
};

#[tokio::main]
async fn main() -> Result<(), PrintError> {
    let registry = CircuitBreakerRegistry::new();

    // A short cooldown so the demo runs in under a second; the server
    // defaults use 60 seconds for accounting.
    let breaker = registry.get_or_create_with(
        circuit_names::ACCOUNTING,
        CircuitBreakerConfig::builder()
            .failure_threshold(2)
            .cooldown(Duration::from_millis(500))
            .non_tripping([PrintErrorKind::InsufficientCredit])
            .build()?,
    );

    // Simulated backend: the first two calls fail, later ones succeed.
    let backend_calls = AtomicU32::new(0);
    let charge = |pages: u32| {
        let call = backend_calls.fetch_add(1, Ordering::SeqCst);
        if call < 2 {
            Err(PrintError::connection_refused("accounting backend is down"))
        } else {
            Ok(format!("charged {pages} pages"))
        }
    };

    println!("Charging jobs while the backend is down...");
    for job in 1..=4 {
        match breaker.execute(|_| charge(3)) {
            Ok(receipt) => println!("  job {job}: {receipt}"),
            Err(e) => println!("  job {job}: {e}"),
        }
    }
    println!("Circuit state: {}", breaker.state());
    if let Some(wait) = breaker.time_until_retry() {
        println!("Next trial allowed in {wait:?}");
    }

    println!("Waiting out the cooldown...");
    tokio::time::sleep(Duration::from_millis(550)).await;

    // The first call after the cooldown is the trial; the backend has
    // recovered, so it heals the circuit.
    let receipt = breaker.execute_async(|_| async { charge(3) }).await?;
    println!("Trial call succeeded: {receipt}");
    println!("Circuit state: {}", breaker.state());

    Ok(())
}
