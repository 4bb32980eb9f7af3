//! Circuit breaker guarding calls to one external collaborator.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::CircuitBreakerConfig;
use crate::errors::{PrintError, PrintResult};

/// Circuit state.
///
/// There is no half-open variant: while [`Open`](CircuitState::Open), the
/// breaker admits a single trial call once the cooldown elapses, and the
/// trial's outcome either closes the circuit or restarts the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls are admitted; consecutive tripping failures are counted.
    Closed,
    /// Calls are refused until the cooldown elapses, then one trial runs.
    Open,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
        }
    }
}

/// Observer notified of breaker events.
///
/// Hooks are invoked after the breaker's state lock is released.
pub trait CircuitBreakerHook: Send + Sync {
    /// Called when `circuit` transitions between states.
    fn on_state_change(&self, circuit: &str, old: CircuitState, new: CircuitState) {
        let _ = (circuit, old, new);
    }

    /// Called when `circuit` refuses a call while open.
    fn on_rejected(&self, circuit: &str) {
        let _ = circuit;
    }
}

/// Point-in-time view of one breaker, for dashboards and logs.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitStatus {
    /// Circuit name.
    pub circuit: String,
    /// Current state.
    pub state: CircuitState,
    /// Consecutive tripping failures counted since the last reset.
    pub failure_count: u32,
    /// Remaining cooldown while open; `None` while closed.
    pub time_until_retry: Option<Duration>,
}

struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    // Set while open; re-armed when a trial is claimed or fails.
    opened_at: Option<Instant>,
}

impl BreakerState {
    fn time_until_retry(&self, cooldown: Duration) -> Option<Duration> {
        match (self.state, self.opened_at) {
            (CircuitState::Open, Some(opened_at)) => {
                Some(cooldown.saturating_sub(opened_at.elapsed()))
            }
            _ => None,
        }
    }
}

/// Named circuit breaker for one external collaborator.
///
/// Counts consecutive tripping failures while closed, opens at the
/// configured threshold, refuses every call during the cooldown, and heals
/// through a single trial call once the cooldown elapses. Obtain shared
/// instances from
/// [`CircuitBreakerRegistry`](crate::resilience::CircuitBreakerRegistry).
pub struct CircuitBreaker {
    name: String,
    config: RwLock<CircuitBreakerConfig>,
    state: Mutex<BreakerState>,
    hook: Option<Arc<dyn CircuitBreakerHook>>,
}

impl CircuitBreaker {
    /// Creates a closed breaker named `name`.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config: RwLock::new(config),
            state: Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
            }),
            hook: None,
        }
    }

    /// Attaches a hook notified of state changes and rejections.
    pub fn with_hook(mut self, hook: Arc<dyn CircuitBreakerHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a snapshot of the current configuration.
    pub fn config(&self) -> CircuitBreakerConfig {
        self.config.read().clone()
    }

    /// Replaces the configuration.
    ///
    /// Takes effect for subsequent calls; a call already in flight settles
    /// under the configuration it started with.
    pub fn reconfigure(&self, config: CircuitBreakerConfig) -> PrintResult<()> {
        config.validate()?;
        *self.config.write() = config;
        debug!(circuit = %self.name, "circuit breaker reconfigured");
        Ok(())
    }

    /// Returns true while the circuit is open. Pure read, never mutates.
    pub fn is_open(&self) -> bool {
        self.state.lock().state == CircuitState::Open
    }

    /// Returns true while the circuit is closed. Pure read, never mutates.
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }

    /// Consecutive tripping failures counted since the last reset.
    pub fn failure_count(&self) -> u32 {
        self.state.lock().failure_count
    }

    /// Remaining cooldown while open; `Some(ZERO)` once a trial is due and
    /// `None` while closed.
    pub fn time_until_retry(&self) -> Option<Duration> {
        let cooldown = self.config.read().cooldown;
        self.state.lock().time_until_retry(cooldown)
    }

    /// Point-in-time status snapshot.
    pub fn status(&self) -> CircuitStatus {
        let cooldown = self.config.read().cooldown;
        let st = self.state.lock();
        CircuitStatus {
            circuit: self.name.clone(),
            state: st.state,
            failure_count: st.failure_count,
            time_until_retry: st.time_until_retry(cooldown),
        }
    }

    /// Runs `operation` under the breaker's protection.
    ///
    /// While open and within the cooldown, the call is refused with a
    /// [`PrintErrorKind::CircuitOpen`](crate::errors::PrintErrorKind)
    /// error and `operation` is never invoked; this masks would-be
    /// successes and non-tripping errors alike. The operation receives a
    /// reference to this breaker for introspection and runs outside the
    /// breaker's lock.
    pub fn execute<T, F>(&self, operation: F) -> PrintResult<T>
    where
        F: FnOnce(&CircuitBreaker) -> PrintResult<T>,
    {
        let config = self.config.read().clone();
        let trial = self.admit(&config)?;
        let result = operation(self);
        self.settle(&config, trial, result)
    }

    /// Async counterpart of [`execute`](Self::execute).
    ///
    /// The future runs outside the breaker's lock; no particular runtime is
    /// assumed.
    pub async fn execute_async<'a, T, F, Fut>(&'a self, operation: F) -> PrintResult<T>
    where
        F: FnOnce(&'a CircuitBreaker) -> Fut,
        Fut: Future<Output = PrintResult<T>> + 'a,
    {
        let config = self.config.read().clone();
        let trial = self.admit(&config)?;
        let result = operation(self).await;
        self.settle(&config, trial, result)
    }

    // Gate decision. Ok(false) admits a normal closed-state call, Ok(true)
    // admits this call as the trial, Err refuses.
    fn admit(&self, config: &CircuitBreakerConfig) -> PrintResult<bool> {
        let mut st = self.state.lock();
        match st.state {
            CircuitState::Closed => Ok(false),
            CircuitState::Open => {
                let elapsed = st.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed < config.cooldown {
                    drop(st);
                    debug!(circuit = %self.name, "circuit open, refusing call");
                    if let Some(hook) = &self.hook {
                        hook.on_rejected(&self.name);
                    }
                    Err(PrintError::circuit_open(&self.name))
                } else {
                    // Claim the trial. Re-arming the window here keeps
                    // concurrent callers refused until the trial settles or
                    // another full cooldown passes.
                    st.opened_at = Some(Instant::now());
                    drop(st);
                    debug!(circuit = %self.name, "cooldown elapsed, admitting trial call");
                    Ok(true)
                }
            }
        }
    }

    fn settle<T>(
        &self,
        config: &CircuitBreakerConfig,
        trial: bool,
        result: PrintResult<T>,
    ) -> PrintResult<T> {
        match result {
            Ok(value) => {
                self.record_success(trial);
                Ok(value)
            }
            Err(error) => Err(self.record_failure(config, trial, error)),
        }
    }

    fn record_success(&self, trial: bool) {
        let mut st = self.state.lock();
        if trial {
            let old = st.state;
            st.state = CircuitState::Closed;
            st.failure_count = 0;
            st.opened_at = None;
            drop(st);
            if old == CircuitState::Open {
                info!(circuit = %self.name, "trial call succeeded, circuit closed");
                self.notify(old, CircuitState::Closed);
            }
        } else if st.state == CircuitState::Closed {
            // Failures count consecutively; any success resets the run.
            st.failure_count = 0;
        }
        // A success outside a trial while the circuit is open is ignored:
        // healing goes through the trial mechanism only.
    }

    // Returns the error the caller sees: the original, or the circuit-open
    // error wrapping it.
    fn record_failure(
        &self,
        config: &CircuitBreakerConfig,
        trial: bool,
        error: PrintError,
    ) -> PrintError {
        let mut st = self.state.lock();
        match st.state {
            CircuitState::Open if trial => {
                // Failed trial, any kind: restart the window, mask the cause.
                st.opened_at = Some(Instant::now());
                drop(st);
                self.log_masked("trial call failed, circuit stays open", config, &error);
                PrintError::circuit_open(&self.name).with_cause(error)
            }
            CircuitState::Open => {
                // Admitted while closed; the circuit opened behind this call.
                error
            }
            CircuitState::Closed => {
                if config.is_non_tripping(error.kind()) {
                    debug!(
                        circuit = %self.name,
                        kind = %error.kind(),
                        "non-tripping failure, counter unchanged"
                    );
                    return error;
                }
                st.failure_count = st.failure_count.saturating_add(1);
                if st.failure_count >= config.failure_threshold {
                    let old = st.state;
                    st.state = CircuitState::Open;
                    st.opened_at = Some(Instant::now());
                    drop(st);
                    self.log_masked("failure threshold reached, circuit opened", config, &error);
                    self.notify(old, CircuitState::Open);
                    PrintError::circuit_open(&self.name).with_cause(error)
                } else {
                    debug!(
                        circuit = %self.name,
                        failure_count = st.failure_count,
                        threshold = config.failure_threshold,
                        "failure recorded"
                    );
                    error
                }
            }
        }
    }

    // The only place a masked cause is logged.
    fn log_masked(&self, what: &str, config: &CircuitBreakerConfig, cause: &PrintError) {
        if config.log_error_detail {
            warn!(circuit = %self.name, cause = ?cause, "{}", what);
        } else {
            warn!(circuit = %self.name, cause = %cause, "{}", what);
        }
    }

    fn notify(&self, old: CircuitState, new: CircuitState) {
        if let Some(hook) = &self.hook {
            hook.on_state_change(&self.name, old, new);
        }
    }
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.state.lock();
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &st.state)
            .field("failure_count", &st.failure_count)
            .finish()
    }
}
