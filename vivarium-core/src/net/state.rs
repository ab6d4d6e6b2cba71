//! Connectivity state machine
//!
//! The link state is a pure function of the current state and a link event.
//! Commands (connect requests) are decided by the supervisor on top of this.

/// Link events reported by the network driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// Station interface started
    Started,
    /// Association or link lost
    LinkDown,
    /// DHCP lease obtained
    AddressAcquired,
}

/// Connectivity states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectivityState {
    /// Interface not started
    #[default]
    Idle,
    /// Connect command issued, waiting for an address
    Connecting,
    /// Address acquired
    Connected,
    /// Link lost, reconnect pending
    Disconnected,
}

impl ConnectivityState {
    /// Process a link event and return the next state
    ///
    /// `Disconnected -> Connecting` is not an event edge; the supervisor
    /// takes it when the reconnect command is actually issued.
    pub fn transition(self, event: LinkEvent) -> Self {
        use ConnectivityState::*;
        use LinkEvent::*;

        match (self, event) {
            (Idle, Started) => Connecting,

            (Connecting, LinkDown) => Disconnected,
            (Connecting, AddressAcquired) => Connected,

            (Connected, LinkDown) => Disconnected,

            // Default: stay in current state
            _ => self,
        }
    }

    /// Check if an address is held
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectivityState::Connected)
    }

    /// Check if a connect is pending or in progress
    pub fn is_reconnecting(&self) -> bool {
        matches!(
            self,
            ConnectivityState::Connecting | ConnectivityState::Disconnected
        )
    }

    /// Encode for atomic storage
    pub const fn as_u8(self) -> u8 {
        match self {
            ConnectivityState::Idle => 0,
            ConnectivityState::Connecting => 1,
            ConnectivityState::Connected => 2,
            ConnectivityState::Disconnected => 3,
        }
    }

    /// Decode from atomic storage, unknown values read as `Idle`
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => ConnectivityState::Connecting,
            2 => ConnectivityState::Connected,
            3 => ConnectivityState::Disconnected,
            _ => ConnectivityState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATES: [ConnectivityState; 4] = [
        ConnectivityState::Idle,
        ConnectivityState::Connecting,
        ConnectivityState::Connected,
        ConnectivityState::Disconnected,
    ];

    #[test]
    fn test_start_connects() {
        assert_eq!(
            ConnectivityState::Idle.transition(LinkEvent::Started),
            ConnectivityState::Connecting
        );
    }

    #[test]
    fn test_address_acquired_only_while_connecting() {
        assert_eq!(
            ConnectivityState::Connecting.transition(LinkEvent::AddressAcquired),
            ConnectivityState::Connected
        );
        assert_eq!(
            ConnectivityState::Idle.transition(LinkEvent::AddressAcquired),
            ConnectivityState::Idle
        );
        assert_eq!(
            ConnectivityState::Disconnected.transition(LinkEvent::AddressAcquired),
            ConnectivityState::Disconnected
        );
    }

    #[test]
    fn test_link_down() {
        assert_eq!(
            ConnectivityState::Connecting.transition(LinkEvent::LinkDown),
            ConnectivityState::Disconnected
        );
        assert_eq!(
            ConnectivityState::Connected.transition(LinkEvent::LinkDown),
            ConnectivityState::Disconnected
        );
        assert_eq!(
            ConnectivityState::Idle.transition(LinkEvent::LinkDown),
            ConnectivityState::Idle
        );
        assert_eq!(
            ConnectivityState::Disconnected.transition(LinkEvent::LinkDown),
            ConnectivityState::Disconnected
        );
    }

    #[test]
    fn test_repeated_start_ignored() {
        for state in [
            ConnectivityState::Connecting,
            ConnectivityState::Connected,
            ConnectivityState::Disconnected,
        ] {
            assert_eq!(state.transition(LinkEvent::Started), state);
        }
    }

    #[test]
    fn test_u8_encoding() {
        for state in ALL_STATES {
            assert_eq!(ConnectivityState::from_u8(state.as_u8()), state);
        }
        assert_eq!(ConnectivityState::from_u8(0xFF), ConnectivityState::Idle);
    }
}
