//! Atomic, forward-only handler lifecycle state machine.

use std::sync::atomic::{AtomicU8, Ordering};

use super::HandlerError;

/// Lifecycle states of a handler instance.
///
/// `FailedToStart` and `Stopped` are terminal; no handler transitions
/// backward. An updated API always gets a fresh handler instead of a
/// restarted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Started,
    Stopped,
    FailedToStart,
}

const CREATED: u8 = 0;
const STARTED: u8 = 1;
const STOPPED: u8 = 2;
const FAILED_TO_START: u8 = 3;

/// Shared lifecycle flag, safe to read from any thread.
#[derive(Debug)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(CREATED),
        }
    }

    pub fn state(&self) -> LifecycleState {
        match self.state.load(Ordering::Acquire) {
            CREATED => LifecycleState::Created,
            STARTED => LifecycleState::Started,
            STOPPED => LifecycleState::Stopped,
            _ => LifecycleState::FailedToStart,
        }
    }

    pub fn is_started(&self) -> bool {
        self.state.load(Ordering::Acquire) == STARTED
    }

    /// Created → Started.
    pub fn mark_started(&self) -> Result<(), HandlerError> {
        self.transition(CREATED, STARTED)
    }

    /// Created → FailedToStart (terminal).
    pub fn mark_failed(&self) {
        let _ = self.transition(CREATED, FAILED_TO_START);
    }

    /// Started → Stopped (terminal).
    pub fn mark_stopped(&self) -> Result<(), HandlerError> {
        self.transition(STARTED, STOPPED)
    }

    fn transition(&self, from: u8, to: u8) -> Result<(), HandlerError> {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| HandlerError::InvalidTransition(self.state()))
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normal_lifecycle() {
        let lc = Lifecycle::new();
        assert_eq!(lc.state(), LifecycleState::Created);
        lc.mark_started().unwrap();
        assert!(lc.is_started());
        lc.mark_stopped().unwrap();
        assert_eq!(lc.state(), LifecycleState::Stopped);
    }

    #[test]
    fn failed_start_is_terminal() {
        let lc = Lifecycle::new();
        lc.mark_failed();
        assert_eq!(lc.state(), LifecycleState::FailedToStart);
        assert!(lc.mark_started().is_err());
    }

    #[test]
    fn no_backward_transition() {
        let lc = Lifecycle::new();
        lc.mark_started().unwrap();
        lc.mark_stopped().unwrap();
        assert!(lc.mark_started().is_err());
        assert!(lc.mark_stopped().is_err());
    }

    #[test]
    fn double_start_rejected() {
        let lc = Lifecycle::new();
        lc.mark_started().unwrap();
        assert!(lc.mark_started().is_err());
    }
}
