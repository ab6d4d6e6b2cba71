//! Ordered subsystem bring-up
//!
//! Display -> storage -> network -> aux radio -> time sync. Each step is
//! recorded in a [`BootReport`]; a fatal step stops the sequence and asks
//! for a device restart. Running the sequencer again only retries steps
//! that are not already `Ok`.

use core::future::Future;

use super::status::{BootReport, StepFailure, Subsystem, SubsystemStatus};
use crate::net::SharedConnectivity;

/// Display init attempts before restarting the device
pub const DISPLAY_ATTEMPTS: u8 = 3;

/// Pause between display init attempts
pub const DISPLAY_RETRY_DELAY_MS: u32 = 100;

/// Poll interval while waiting for the first connection
pub const CONNECT_POLL_MS: u32 = 100;

/// Platform side of bring-up
///
/// Implemented by the firmware over real hardware and by tests over mocks.
pub trait Subsystems {
    /// Bring one subsystem up
    fn bring_up(&mut self, subsystem: Subsystem) -> impl Future<Output = Result<(), StepFailure>>;

    /// Sleep for `ms` milliseconds
    fn pause(&mut self, ms: u32) -> impl Future<Output = ()>;
}

/// How bring-up ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootOutcome {
    /// Every step ran; some may be degraded
    Completed(BootReport),
    /// A fatal step failed; later steps were not run
    Restart {
        failed: Subsystem,
        report: BootReport,
    },
}

impl BootOutcome {
    pub fn report(&self) -> &BootReport {
        match self {
            BootOutcome::Completed(report) | BootOutcome::Restart { report, .. } => report,
        }
    }

    pub fn needs_restart(&self) -> bool {
        matches!(self, BootOutcome::Restart { .. })
    }
}

/// One-shot (and re-runnable) bring-up sequencer
#[derive(Debug, Clone)]
pub struct InitSequencer {
    report: BootReport,
    display_attempts: u8,
    display_retry_ms: u32,
}

impl Default for InitSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl InitSequencer {
    pub const fn new() -> Self {
        Self {
            report: BootReport::new(),
            display_attempts: DISPLAY_ATTEMPTS,
            display_retry_ms: DISPLAY_RETRY_DELAY_MS,
        }
    }

    /// Override the display retry policy
    pub fn with_display_retry(mut self, attempts: u8, delay_ms: u32) -> Self {
        self.display_attempts = attempts.max(1);
        self.display_retry_ms = delay_ms;
        self
    }

    /// Run every step that is not already `Ok`
    pub async fn run<S: Subsystems>(&mut self, platform: &mut S) -> BootOutcome {
        for subsystem in Subsystem::ALL {
            if self.report.is_ok(subsystem) {
                continue;
            }

            let status = match self.bring_up(platform, subsystem).await {
                Ok(()) => SubsystemStatus::Ok,
                Err(_) => subsystem.on_failure(),
            };
            self.report.record(subsystem, status);

            if status == SubsystemStatus::Failed {
                return BootOutcome::Restart {
                    failed: subsystem,
                    report: self.report,
                };
            }
        }

        BootOutcome::Completed(self.report)
    }

    pub fn report(&self) -> &BootReport {
        &self.report
    }

    async fn bring_up<S: Subsystems>(
        &mut self,
        platform: &mut S,
        subsystem: Subsystem,
    ) -> Result<(), StepFailure> {
        let attempts = match subsystem {
            Subsystem::Display => self.display_attempts,
            _ => 1,
        };

        let mut attempt = 1;
        loop {
            match platform.bring_up(subsystem).await {
                Ok(()) => return Ok(()),
                Err(failure) if attempt >= attempts => return Err(failure),
                Err(_) => {
                    attempt += 1;
                    platform.pause(self.display_retry_ms).await;
                }
            }
        }
    }
}

/// Bounded wait for the first connection
///
/// Polls the published connectivity state every `poll_ms` until it reads
/// `Connected` or `timeout_ms` has passed. The supervisor keeps retrying in
/// the background either way.
pub async fn wait_connected<S: Subsystems + ?Sized>(
    platform: &mut S,
    shared: &SharedConnectivity,
    timeout_ms: u32,
    poll_ms: u32,
) -> Result<(), StepFailure> {
    let poll_ms = poll_ms.max(1);
    let mut waited = 0u32;

    loop {
        if shared.is_connected() {
            return Ok(());
        }
        if waited >= timeout_ms {
            return Err(StepFailure::Timeout);
        }
        let step = poll_ms.min(timeout_ms - waited);
        platform.pause(step).await;
        waited += step;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;
    use heapless::Vec;

    /// Platform with scripted results per subsystem
    struct Scripted {
        failures: [u8; 5],
        calls: Vec<Subsystem, 32>,
        paused_ms: u32,
    }

    impl Scripted {
        fn new() -> Self {
            Self {
                failures: [0; 5],
                calls: Vec::new(),
                paused_ms: 0,
            }
        }

        fn failing(mut self, subsystem: Subsystem, times: u8) -> Self {
            self.failures[subsystem.index()] = times;
            self
        }
    }

    impl Subsystems for Scripted {
        async fn bring_up(&mut self, subsystem: Subsystem) -> Result<(), StepFailure> {
            self.calls.push(subsystem).unwrap();
            let left = &mut self.failures[subsystem.index()];
            if *left > 0 {
                *left -= 1;
                Err(StepFailure::Fault)
            } else {
                Ok(())
            }
        }

        async fn pause(&mut self, ms: u32) {
            self.paused_ms += ms;
        }
    }

    #[test]
    fn test_all_ok_in_order() {
        let mut platform = Scripted::new();
        let mut seq = InitSequencer::new();

        let outcome = block_on(seq.run(&mut platform));

        assert!(!outcome.needs_restart());
        assert_eq!(platform.calls.as_slice(), &Subsystem::ALL);
        assert!(Subsystem::ALL.iter().all(|s| outcome.report().is_ok(*s)));
    }

    #[test]
    fn test_display_retried_locally() {
        let mut platform = Scripted::new().failing(Subsystem::Display, 2);
        let mut seq = InitSequencer::new();

        let outcome = block_on(seq.run(&mut platform));

        assert!(!outcome.needs_restart());
        assert_eq!(platform.paused_ms, 2 * DISPLAY_RETRY_DELAY_MS);
        assert_eq!(
            &platform.calls[..3],
            &[Subsystem::Display, Subsystem::Display, Subsystem::Display]
        );
    }

    #[test]
    fn test_display_failure_restarts() {
        let mut platform = Scripted::new().failing(Subsystem::Display, DISPLAY_ATTEMPTS);
        let mut seq = InitSequencer::new();

        let outcome = block_on(seq.run(&mut platform));

        match outcome {
            BootOutcome::Restart { failed, report } => {
                assert_eq!(failed, Subsystem::Display);
                assert_eq!(report.status(Subsystem::Storage), None);
            }
            other => panic!("expected restart, got {:?}", other),
        }
        assert!(platform.calls.iter().all(|s| *s == Subsystem::Display));
    }

    #[test]
    fn test_degraded_steps_continue() {
        let mut platform = Scripted::new()
            .failing(Subsystem::Storage, 1)
            .failing(Subsystem::AuxRadio, 1);
        let mut seq = InitSequencer::new();

        let outcome = block_on(seq.run(&mut platform));

        let report = outcome.report();
        assert!(!outcome.needs_restart());
        assert_eq!(report.status(Subsystem::Storage), Some(SubsystemStatus::Degraded));
        assert_eq!(report.status(Subsystem::AuxRadio), Some(SubsystemStatus::Degraded));
        assert!(report.is_ok(Subsystem::TimeSync));
        // Non-display steps get one attempt
        assert_eq!(platform.calls.len(), 5);
    }

    #[test]
    fn test_rerun_skips_healthy_subsystems() {
        let mut platform = Scripted::new().failing(Subsystem::Storage, 1);
        let mut seq = InitSequencer::new();
        block_on(seq.run(&mut platform));

        platform.calls.clear();
        let outcome = block_on(seq.run(&mut platform));

        assert_eq!(platform.calls.as_slice(), &[Subsystem::Storage]);
        assert!(outcome.report().is_ok(Subsystem::Storage));
    }

    #[test]
    fn test_wait_connected_times_out() {
        let shared = SharedConnectivity::new();
        let mut platform = Scripted::new();

        let result = block_on(wait_connected(&mut platform, &shared, 1000, 300));

        assert_eq!(result, Err(StepFailure::Timeout));
        assert_eq!(platform.paused_ms, 1000);
    }

    #[test]
    fn test_wait_connected_immediate() {
        let shared = SharedConnectivity::new();
        shared.publish(crate::net::ConnectivityState::Connected);
        let mut platform = Scripted::new();

        assert_eq!(block_on(wait_connected(&mut platform, &shared, 1000, 100)), Ok(()));
        assert_eq!(platform.paused_ms, 0);
    }
}
