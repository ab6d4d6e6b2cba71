//! Subsystem bring-up status

/// Subsystems brought up at boot, in bring-up order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Subsystem {
    Display,
    Storage,
    Network,
    AuxRadio,
    TimeSync,
}

impl Subsystem {
    /// Bring-up order
    pub const ALL: [Subsystem; 5] = [
        Subsystem::Display,
        Subsystem::Storage,
        Subsystem::Network,
        Subsystem::AuxRadio,
        Subsystem::TimeSync,
    ];

    pub const fn index(self) -> usize {
        match self {
            Subsystem::Display => 0,
            Subsystem::Storage => 1,
            Subsystem::Network => 2,
            Subsystem::AuxRadio => 3,
            Subsystem::TimeSync => 4,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Subsystem::Display => "display",
            Subsystem::Storage => "storage",
            Subsystem::Network => "network",
            Subsystem::AuxRadio => "aux radio",
            Subsystem::TimeSync => "time sync",
        }
    }

    /// Status recorded when bring-up of this subsystem fails
    ///
    /// Only the display is fatal; everything else runs degraded.
    pub const fn on_failure(self) -> SubsystemStatus {
        match self {
            Subsystem::Display => SubsystemStatus::Failed,
            _ => SubsystemStatus::Degraded,
        }
    }
}

/// Outcome of one subsystem bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubsystemStatus {
    Ok,
    /// Running without this feature
    Degraded,
    /// Fatal, device restart required
    Failed,
}

/// Why a bring-up step did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepFailure {
    /// Hardware or driver error
    Fault,
    /// Bounded wait expired
    Timeout,
    /// Disabled by configuration or not fitted
    Unavailable,
}

/// Per-subsystem bring-up state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepState {
    /// Not attempted yet
    #[default]
    Pending,
    /// Attempted, with the recorded outcome
    Up(SubsystemStatus),
}

/// Bring-up results for every subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    steps: [StepState; 5],
}

impl BootReport {
    pub const fn new() -> Self {
        Self {
            steps: [StepState::Pending; 5],
        }
    }

    pub fn record(&mut self, subsystem: Subsystem, status: SubsystemStatus) {
        self.steps[subsystem.index()] = StepState::Up(status);
    }

    pub fn state(&self, subsystem: Subsystem) -> StepState {
        self.steps[subsystem.index()]
    }

    /// Recorded status, `None` while pending
    pub fn status(&self, subsystem: Subsystem) -> Option<SubsystemStatus> {
        match self.state(subsystem) {
            StepState::Up(status) => Some(status),
            StepState::Pending => None,
        }
    }

    /// Check if the subsystem came up cleanly
    pub fn is_ok(&self, subsystem: Subsystem) -> bool {
        self.status(subsystem) == Some(SubsystemStatus::Ok)
    }

    /// Subsystems running degraded
    pub fn degraded(&self) -> impl Iterator<Item = Subsystem> + '_ {
        Subsystem::ALL
            .into_iter()
            .filter(|s| self.status(*s) == Some(SubsystemStatus::Degraded))
    }

    /// Check if every subsystem has been attempted
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| *s != StepState::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_matches_index() {
        for (i, subsystem) in Subsystem::ALL.iter().enumerate() {
            assert_eq!(subsystem.index(), i);
        }
    }

    #[test]
    fn test_only_display_is_fatal() {
        assert_eq!(Subsystem::Display.on_failure(), SubsystemStatus::Failed);
        for subsystem in &Subsystem::ALL[1..] {
            assert_eq!(subsystem.on_failure(), SubsystemStatus::Degraded);
        }
    }

    #[test]
    fn test_report_tracks_states() {
        let mut report = BootReport::new();
        assert_eq!(report.state(Subsystem::Storage), StepState::Pending);
        assert!(!report.is_complete());

        report.record(Subsystem::Storage, SubsystemStatus::Degraded);
        report.record(Subsystem::Display, SubsystemStatus::Ok);
        assert!(report.is_ok(Subsystem::Display));
        assert_eq!(report.status(Subsystem::Network), None);

        let degraded: heapless::Vec<Subsystem, 5> = report.degraded().collect();
        assert_eq!(degraded.as_slice(), &[Subsystem::Storage]);
    }
}
