//! Observability Example
//!
//! This example demonstrates how to:
//! - Install a tracing subscriber from `LoggingConfig`
//! - Wire shared metrics counters into every registry breaker
//! - Read the counters and circuit statuses after a simulated outage

use std::sync::Arc;
use std::time::Duration;

use printserv_resilience::{
    circuit_names, CircuitBreakerConfig, CircuitBreakerRegistry, CircuitMetrics, LogFormat,
    LogLevel, LoggingConfig, MetricsHook, PrintError, RegistryConfig,
};

fn main() -> Result<(), PrintError> {
    LoggingConfig::default()
        .with_level(LogLevel::Debug)
        .with_format(LogFormat::Compact)
        .init()?;

    // Server defaults, with a short polling cooldown so the demo heals
    // within a second.
    let mut config = RegistryConfig::with_server_defaults();
    config.circuits.insert(
        circuit_names::PRINTER_POLLING.to_string(),
        CircuitBreakerConfig::builder()
            .failure_threshold(2)
            .cooldown(Duration::from_millis(300))
            .build()?,
    );

    let metrics = Arc::new(CircuitMetrics::new());
    let registry = CircuitBreakerRegistry::from_config_with_hook(
        &config,
        Arc::new(MetricsHook::new(Arc::clone(&metrics))),
    )?;

    // Two SNMP timeouts trip the polling circuit.
    let polling = registry.get(circuit_names::PRINTER_POLLING)?;
    for _ in 0..2 {
        let _ = polling.execute::<(), _>(|_| Err(PrintError::snmp_timeout("printer 10.0.0.31")));
    }

    // Refused while open.
    let _ = polling.execute(|_| Ok(()));

    // After the cooldown the trial heals the circuit.
    std::thread::sleep(Duration::from_millis(350));
    polling.execute(|_| Ok(()))?;

    let snapshot = metrics.snapshot();
    println!("trips:      {}", snapshot.trips);
    println!("heals:      {}", snapshot.heals);
    println!("rejections: {}", snapshot.rejections);

    println!("Circuits:");
    for status in registry.statuses() {
        println!(
            "  {}: {} ({} consecutive failures)",
            status.circuit, status.state, status.failure_count
        );
    }

    Ok(())
}
