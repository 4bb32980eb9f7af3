//! Counters for circuit breaker activity.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::resilience::{CircuitBreakerHook, CircuitState};

/// Process-wide counters for circuit breaker activity.
///
/// Counters are plain atomics and safe to share across threads; read them
/// with [`snapshot`](Self::snapshot). Wire them to breakers through
/// [`MetricsHook`].
#[derive(Debug, Default)]
pub struct CircuitMetrics {
    trips: AtomicU64,
    heals: AtomicU64,
    rejections: AtomicU64,
}

impl CircuitMetrics {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a closed-to-open transition.
    pub fn record_trip(&self) {
        self.trips.fetch_add(1, Ordering::Relaxed);
    }

    /// Records an open-to-closed transition.
    pub fn record_heal(&self) {
        self.heals.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a call refused by an open circuit.
    pub fn record_rejection(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a point-in-time view of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            trips: self.trips.load(Ordering::Relaxed),
            heals: self.heals.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of [`CircuitMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Closed-to-open transitions.
    pub trips: u64,
    /// Open-to-closed transitions.
    pub heals: u64,
    /// Calls refused by open circuits.
    pub rejections: u64,
}

/// Hook adapter that feeds breaker events into [`CircuitMetrics`].
#[derive(Debug, Clone)]
pub struct MetricsHook {
    metrics: Arc<CircuitMetrics>,
}

impl MetricsHook {
    /// Creates a hook recording into `metrics`.
    pub fn new(metrics: Arc<CircuitMetrics>) -> Self {
        Self { metrics }
    }
}

impl CircuitBreakerHook for MetricsHook {
    fn on_state_change(&self, _circuit: &str, old: CircuitState, new: CircuitState) {
        match (old, new) {
            (CircuitState::Closed, CircuitState::Open) => self.metrics.record_trip(),
            (CircuitState::Open, CircuitState::Closed) => self.metrics.record_heal(),
            _ => {}
        }
    }

    fn on_rejected(&self, _circuit: &str) {
        self.metrics.record_rejection();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = CircuitMetrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.trips, 0);
        assert_eq!(snapshot.heals, 0);
        assert_eq!(snapshot.rejections, 0);
    }

    #[test]
    fn test_record_and_snapshot() {
        let metrics = CircuitMetrics::new();
        metrics.record_trip();
        metrics.record_trip();
        metrics.record_heal();
        metrics.record_rejection();

        let snapshot = metrics.snapshot();
        assert_eq!(
            snapshot,
            MetricsSnapshot {
                trips: 2,
                heals: 1,
                rejections: 1,
            }
        );
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Arc::new(CircuitMetrics::new());

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        metrics.record_rejection();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.snapshot().rejections, 1000);
    }

    #[test]
    fn test_hook_maps_transitions() {
        let metrics = Arc::new(CircuitMetrics::new());
        let hook = MetricsHook::new(Arc::clone(&metrics));

        hook.on_state_change("accounting", CircuitState::Closed, CircuitState::Open);
        hook.on_state_change("accounting", CircuitState::Open, CircuitState::Closed);
        hook.on_state_change("accounting", CircuitState::Closed, CircuitState::Closed);
        hook.on_rejected("accounting");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.trips, 1);
        assert_eq!(snapshot.heals, 1);
        assert_eq!(snapshot.rejections, 1);
    }
}
