//! Published connectivity snapshot
//!
//! One writer (the connectivity supervisor), any number of readers (status
//! bar, init sequencer, time sync). Readers get a consistent state value and
//! a change counter they can use to skip redundant work.

use portable_atomic::{AtomicU32, AtomicU8, Ordering};

use super::state::ConnectivityState;

/// Lock-free single-writer connectivity snapshot
#[derive(Debug)]
pub struct SharedConnectivity {
    state: AtomicU8,
    changes: AtomicU32,
}

impl SharedConnectivity {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(ConnectivityState::Idle.as_u8()),
            changes: AtomicU32::new(0),
        }
    }

    /// Publish a new state
    ///
    /// Only the supervisor calls this.
    pub fn publish(&self, state: ConnectivityState) {
        let previous = self.state.swap(state.as_u8(), Ordering::AcqRel);
        if previous != state.as_u8() {
            self.changes.fetch_add(1, Ordering::Release);
        }
    }

    /// Current state
    pub fn get(&self) -> ConnectivityState {
        ConnectivityState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_connected(&self) -> bool {
        self.get().is_connected()
    }

    /// Number of state changes published since boot
    pub fn changes(&self) -> u32 {
        self.changes.load(Ordering::Acquire)
    }
}

impl Default for SharedConnectivity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_idle() {
        let shared = SharedConnectivity::new();
        assert_eq!(shared.get(), ConnectivityState::Idle);
        assert!(!shared.is_connected());
        assert_eq!(shared.changes(), 0);
    }

    #[test]
    fn test_publish_counts_changes_only() {
        let shared = SharedConnectivity::new();
        shared.publish(ConnectivityState::Connecting);
        shared.publish(ConnectivityState::Connecting);
        shared.publish(ConnectivityState::Connected);
        assert!(shared.is_connected());
        assert_eq!(shared.changes(), 2);
    }
}
