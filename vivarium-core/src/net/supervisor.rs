//! Connectivity supervisor
//!
//! Owns the connectivity state, reacts to link events, and decides when to
//! issue connect commands. It never touches the radio itself: the Wi-Fi
//! task executes the returned [`ConnectRequest`] and reports back through
//! [`ConnectivitySupervisor::attempt_started`].

use super::backoff::{BackoffPolicy, ReconnectBackoff};
use super::shared::SharedConnectivity;
use super::state::{ConnectivityState, LinkEvent};

/// A connect command to execute after `delay_ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectRequest {
    /// Connect attempts since the last success, this one included
    pub attempt: u32,
    /// Wait before connecting
    pub delay_ms: u32,
}

/// Event-driven connectivity state owner
pub struct ConnectivitySupervisor<'a> {
    state: ConnectivityState,
    backoff: ReconnectBackoff,
    shared: &'a SharedConnectivity,
    connects: u32,
}

impl<'a> ConnectivitySupervisor<'a> {
    /// Create a supervisor publishing to `shared`
    pub fn new(shared: &'a SharedConnectivity, policy: BackoffPolicy, seed: u32) -> Self {
        shared.publish(ConnectivityState::Idle);
        Self {
            state: ConnectivityState::Idle,
            backoff: ReconnectBackoff::new(policy, seed),
            shared,
            connects: 0,
        }
    }

    /// Feed one link event
    ///
    /// Returns the connect command to execute, if any. Exactly one command
    /// comes out of every accepted `Started` or `LinkDown`.
    pub fn handle(&mut self, event: LinkEvent) -> Option<ConnectRequest> {
        let next = self.state.transition(event);
        if next == self.state {
            return None;
        }

        self.set_state(next);

        match next {
            ConnectivityState::Connecting => {
                // Idle -> Connecting: first connect goes out immediately
                self.connects = self.connects.wrapping_add(1);
                Some(ConnectRequest {
                    attempt: 1,
                    delay_ms: 0,
                })
            }
            ConnectivityState::Disconnected => {
                let delay_ms = self.backoff.next_delay();
                Some(ConnectRequest {
                    attempt: self.backoff.attempt(),
                    delay_ms,
                })
            }
            ConnectivityState::Connected => {
                self.backoff.reset();
                None
            }
            ConnectivityState::Idle => None,
        }
    }

    /// The delayed connect command is being issued now
    ///
    /// Takes the `Disconnected -> Connecting` edge. Returns `false` (and
    /// changes nothing) in any other state.
    pub fn attempt_started(&mut self) -> bool {
        if self.state != ConnectivityState::Disconnected {
            return false;
        }
        self.connects = self.connects.wrapping_add(1);
        self.set_state(ConnectivityState::Connecting);
        true
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Connect commands actually issued since boot
    pub fn connects(&self) -> u32 {
        self.connects
    }

    fn set_state(&mut self, state: ConnectivityState) {
        self.state = state;
        self.shared.publish(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_jitter() -> BackoffPolicy {
        BackoffPolicy {
            jitter_percent: 0,
            ..BackoffPolicy::default()
        }
    }

    #[test]
    fn test_start_issues_connect() {
        let shared = SharedConnectivity::new();
        let mut sup = ConnectivitySupervisor::new(&shared, no_jitter(), 1);

        let cmd = sup.handle(LinkEvent::Started);
        assert_eq!(
            cmd,
            Some(ConnectRequest {
                attempt: 1,
                delay_ms: 0
            })
        );
        assert_eq!(shared.get(), ConnectivityState::Connecting);
    }

    #[test]
    fn test_connected_publishes() {
        let shared = SharedConnectivity::new();
        let mut sup = ConnectivitySupervisor::new(&shared, no_jitter(), 1);
        sup.handle(LinkEvent::Started);

        assert_eq!(sup.handle(LinkEvent::AddressAcquired), None);
        assert!(shared.is_connected());
    }

    #[test]
    fn test_link_down_goes_through_disconnected() {
        let shared = SharedConnectivity::new();
        let mut sup = ConnectivitySupervisor::new(&shared, no_jitter(), 1);
        sup.handle(LinkEvent::Started);
        sup.handle(LinkEvent::AddressAcquired);

        let cmd = sup.handle(LinkEvent::LinkDown).unwrap();
        assert_eq!(cmd.delay_ms, 0);
        assert_eq!(sup.state(), ConnectivityState::Disconnected);
        assert_eq!(shared.get(), ConnectivityState::Disconnected);

        assert!(sup.attempt_started());
        assert_eq!(sup.state(), ConnectivityState::Connecting);
    }

    #[test]
    fn test_repeated_failures_back_off() {
        let shared = SharedConnectivity::new();
        let mut sup = ConnectivitySupervisor::new(&shared, no_jitter(), 1);
        sup.handle(LinkEvent::Started);

        let mut delays = [0u32; 4];
        for delay in delays.iter_mut() {
            *delay = sup.handle(LinkEvent::LinkDown).unwrap().delay_ms;
            sup.attempt_started();
        }
        assert_eq!(delays, [0, 500, 1000, 2000]);

        // Success resets the schedule
        sup.handle(LinkEvent::AddressAcquired);
        assert_eq!(sup.handle(LinkEvent::LinkDown).unwrap().delay_ms, 0);
    }

    #[test]
    fn test_link_down_while_disconnected_ignored() {
        let shared = SharedConnectivity::new();
        let mut sup = ConnectivitySupervisor::new(&shared, no_jitter(), 1);
        sup.handle(LinkEvent::Started);
        assert!(sup.handle(LinkEvent::LinkDown).is_some());
        assert_eq!(sup.handle(LinkEvent::LinkDown), None);
        assert_eq!(sup.handle(LinkEvent::AddressAcquired), None);
    }

    #[test]
    fn test_attempt_started_only_when_disconnected() {
        let shared = SharedConnectivity::new();
        let mut sup = ConnectivitySupervisor::new(&shared, no_jitter(), 1);
        assert!(!sup.attempt_started());
        sup.handle(LinkEvent::Started);
        assert!(!sup.attempt_started());
        assert_eq!(sup.connects(), 1);
    }
}
