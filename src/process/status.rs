//! Engine lifecycle state shared between a handle and its watcher.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lifecycle of an engine instance. `Terminated` is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(u8)]
pub enum EngineState {
    NotStarted = 0,
    Running = 1,
    Terminated = 2,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => EngineState::NotStarted,
            1 => EngineState::Running,
            _ => EngineState::Terminated,
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::NotStarted => "not started",
            EngineState::Running => "running",
            EngineState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// Atomic, shareable engine state.
///
/// Cloning shares the same underlying cell. Transitions only move forward.
#[derive(Clone, Debug)]
pub struct StatusCell(Arc<AtomicU8>);

impl StatusCell {
    /// Cell in the `NotStarted` state.
    #[must_use]
    pub fn new() -> Self {
        StatusCell(Arc::new(AtomicU8::new(EngineState::NotStarted as u8)))
    }

    /// Cell for an engine that is already up.
    #[must_use]
    pub fn running() -> Self {
        StatusCell(Arc::new(AtomicU8::new(EngineState::Running as u8)))
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub fn get(&self) -> EngineState {
        EngineState::from_u8(self.0.load(Ordering::Acquire))
    }

    #[inline]
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.get() == EngineState::Terminated
    }

    /// Move `NotStarted` to `Running`. Returns false if the cell had already
    /// left `NotStarted`.
    pub fn start(&self) -> bool {
        self.0
            .compare_exchange(
                EngineState::NotStarted as u8,
                EngineState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to `Terminated`. Returns true only for the call that performed
    /// the transition.
    pub fn terminate(&self) -> bool {
        self.0.swap(EngineState::Terminated as u8, Ordering::AcqRel)
            != EngineState::Terminated as u8
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lifecycle() {
        let status = StatusCell::new();
        assert_eq!(status.get(), EngineState::NotStarted);

        assert!(status.start());
        assert_eq!(status.get(), EngineState::Running);
        assert!(!status.start());

        assert!(status.terminate());
        assert!(status.is_terminated());
    }

    #[test]
    fn test_terminate_reports_once() {
        let status = StatusCell::running();
        let shared = status.clone();

        assert!(shared.terminate());
        assert!(!status.terminate());
        assert!(status.is_terminated());
    }

    #[test]
    fn test_terminated_is_final() {
        let status = StatusCell::new();
        status.terminate();
        assert!(!status.start());
        assert_eq!(status.get(), EngineState::Terminated);
    }
}
