//! Mock collaborators for testing.
//!
//! Provides scripted stand-ins for the external services a breaker guards.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::errors::{PrintError, PrintErrorKind, PrintResult};

/// Scripted stand-in for a guarded collaborator call.
///
/// Outcomes are queued up front and popped per invocation; an empty queue
/// yields `Ok("ok")`. The invocation counter shows whether the breaker
/// actually reached the collaborator or refused the call at the gate.
#[derive(Debug)]
pub struct ScriptedOperation {
    /// Queued outcomes, oldest first.
    outcomes: Mutex<VecDeque<PrintResult<String>>>,
    /// Number of times `call` ran.
    invocations: AtomicU32,
}

impl ScriptedOperation {
    /// Creates an operation with an empty script.
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            invocations: AtomicU32::new(0),
        }
    }

    /// Queues `n` failures of the given kind.
    pub fn fail_times(&self, n: usize, kind: PrintErrorKind) -> &Self {
        let mut outcomes = self.outcomes.lock();
        for _ in 0..n {
            outcomes.push_back(Err(PrintError::new(kind, "scripted failure")));
        }
        self
    }

    /// Queues a single success carrying `value`.
    pub fn succeed_with(&self, value: &str) -> &Self {
        self.outcomes.lock().push_back(Ok(value.to_string()));
        self
    }

    /// Runs the next scripted outcome.
    pub fn call(&self) -> PrintResult<String> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }

    /// Number of times [`call`](Self::call) ran.
    pub fn invocations(&self) -> u32 {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedOperation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_script_succeeds() {
        let op = ScriptedOperation::new();
        assert_eq!(op.call().unwrap(), "ok");
        assert_eq!(op.invocations(), 1);
    }

    #[test]
    fn test_scripted_outcomes_pop_in_order() {
        let op = ScriptedOperation::new();
        op.fail_times(2, PrintErrorKind::ConnectionRefused)
            .succeed_with("receipt-1");

        assert_eq!(
            op.call().unwrap_err().kind(),
            PrintErrorKind::ConnectionRefused
        );
        assert_eq!(
            op.call().unwrap_err().kind(),
            PrintErrorKind::ConnectionRefused
        );
        assert_eq!(op.call().unwrap(), "receipt-1");
        assert_eq!(op.invocations(), 3);
    }

    #[test]
    fn test_counter_tracks_every_call() {
        let op = ScriptedOperation::new();
        for _ in 0..5 {
            let _ = op.call();
        }
        assert_eq!(op.invocations(), 5);
    }
}
