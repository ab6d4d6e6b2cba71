//! Fault taxonomy and restart bookkeeping
//!
//! Every fault maps to one recovery. Faults that end in a restart leave a
//! [`RestartRecord`] in memory that survives the reset (the watchdog scratch
//! registers on the RP2040) so the next boot can log why it happened and
//! how many times in a row.

/// Fault classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FaultKind {
    /// Link lost at runtime
    TransientNetworkLoss,
    /// Display did not initialise, or a flush failed twice
    HardwareInitFailure,
    /// Storage volume could not be mounted
    StorageUnavailable,
    /// Render cycle ran past its tick
    TimingOverrun,
    /// A supervised task stopped refreshing its token
    LivenessTimeout,
}

/// What the system does about a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recovery {
    /// Connectivity supervisor reconnects in the background
    Reconnect,
    /// Feature disabled, everything else continues
    Degrade,
    /// Current frame skipped
    DropFrame,
    /// Full device reset
    Restart,
}

impl FaultKind {
    pub const fn recovery(self) -> Recovery {
        match self {
            FaultKind::TransientNetworkLoss => Recovery::Reconnect,
            FaultKind::HardwareInitFailure => Recovery::Restart,
            FaultKind::StorageUnavailable => Recovery::Degrade,
            FaultKind::TimingOverrun => Recovery::DropFrame,
            FaultKind::LivenessTimeout => Recovery::Restart,
        }
    }

    /// Check if this fault ends in a device reset
    pub const fn is_fatal(self) -> bool {
        matches!(self.recovery(), Recovery::Restart)
    }
}

/// Why the device restarted itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestartCause {
    /// Display init failed after local retries
    DisplayInit,
    /// A flush failed on retry
    FlushFailure,
    /// Liveness supervisor escalated
    LivenessTimeout,
}

impl RestartCause {
    const fn code(self) -> u8 {
        match self {
            RestartCause::DisplayInit => 1,
            RestartCause::FlushFailure => 2,
            RestartCause::LivenessTimeout => 3,
        }
    }

    const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(RestartCause::DisplayInit),
            2 => Some(RestartCause::FlushFailure),
            3 => Some(RestartCause::LivenessTimeout),
            _ => None,
        }
    }
}

/// Cause of the last deliberate restart and the consecutive count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RestartRecord {
    pub cause: RestartCause,
    /// Deliberate restarts in a row without a healthy run in between
    pub count: u16,
}

/// Marker byte so random power-on RAM is not read as a record
const RECORD_MAGIC: u32 = 0xA5;

impl RestartRecord {
    /// Record for a restart about to happen, given what the last boot found
    pub fn next(previous: Option<RestartRecord>, cause: RestartCause) -> Self {
        let count = previous.map_or(0, |r| r.count).saturating_add(1);
        Self { cause, count }
    }

    /// Pack into one 32-bit scratch word
    pub const fn encode(&self) -> u32 {
        (RECORD_MAGIC << 24) | ((self.cause.code() as u32) << 16) | self.count as u32
    }

    /// Unpack a scratch word; anything without the marker reads as no record
    pub const fn decode(word: u32) -> Option<Self> {
        if word >> 24 != RECORD_MAGIC {
            return None;
        }
        let cause = match RestartCause::from_code(((word >> 16) & 0xFF) as u8) {
            Some(cause) => cause,
            None => return None,
        };
        Some(Self {
            cause,
            count: (word & 0xFFFF) as u16,
        })
    }
}

impl From<RestartCause> for FaultKind {
    fn from(cause: RestartCause) -> Self {
        match cause {
            RestartCause::DisplayInit | RestartCause::FlushFailure => {
                FaultKind::HardwareInitFailure
            }
            RestartCause::LivenessTimeout => FaultKind::LivenessTimeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_table() {
        assert_eq!(FaultKind::TransientNetworkLoss.recovery(), Recovery::Reconnect);
        assert_eq!(FaultKind::HardwareInitFailure.recovery(), Recovery::Restart);
        assert_eq!(FaultKind::StorageUnavailable.recovery(), Recovery::Degrade);
        assert_eq!(FaultKind::TimingOverrun.recovery(), Recovery::DropFrame);
        assert_eq!(FaultKind::LivenessTimeout.recovery(), Recovery::Restart);
        assert!(!FaultKind::TimingOverrun.is_fatal());
    }

    #[test]
    fn test_record_encoding() {
        let record = RestartRecord {
            cause: RestartCause::LivenessTimeout,
            count: 7,
        };
        assert_eq!(record.encode(), 0xA503_0007);
        assert_eq!(RestartRecord::decode(record.encode()), Some(record));
    }

    #[test]
    fn test_garbage_is_not_a_record() {
        assert_eq!(RestartRecord::decode(0), None);
        assert_eq!(RestartRecord::decode(0xFFFF_FFFF), None);
        assert_eq!(RestartRecord::decode(0xA509_0001), None);
    }

    #[test]
    fn test_consecutive_count() {
        let first = RestartRecord::next(None, RestartCause::DisplayInit);
        assert_eq!(first.count, 1);
        let second = RestartRecord::next(Some(first), RestartCause::FlushFailure);
        assert_eq!(second.count, 2);
        assert_eq!(second.cause, RestartCause::FlushFailure);
    }

    #[test]
    fn test_restart_causes_are_fatal_faults() {
        for cause in [
            RestartCause::DisplayInit,
            RestartCause::FlushFailure,
            RestartCause::LivenessTimeout,
        ] {
            assert!(FaultKind::from(cause).is_fatal());
        }
    }
}
