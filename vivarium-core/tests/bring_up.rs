//! Boot sequence scenarios against a simulated board with a virtual clock.

use embassy_futures::block_on;
use vivarium_core::boot::{
    wait_connected, BootOutcome, InitSequencer, StepFailure, Subsystem, SubsystemStatus,
    Subsystems, CONNECT_POLL_MS, DISPLAY_ATTEMPTS,
};
use vivarium_core::net::{
    BackoffPolicy, ConnectivityState, ConnectivitySupervisor, LinkEvent, SharedConnectivity,
    CONNECT_TIMEOUT_MS,
};

/// Board whose network events are scheduled on a virtual clock
struct SimBoard<'a> {
    now_ms: u32,
    shared: &'a SharedConnectivity,
    supervisor: ConnectivitySupervisor<'a>,
    /// Virtual time at which DHCP hands out an address
    address_at_ms: Option<u32>,
    /// Virtual times at which the link drops
    drops_at_ms: Vec<u32>,
    display_ok: bool,
    calls: Vec<Subsystem>,
    connect_commands: u32,
}

impl<'a> SimBoard<'a> {
    fn new(shared: &'a SharedConnectivity) -> Self {
        Self {
            now_ms: 0,
            shared,
            supervisor: ConnectivitySupervisor::new(shared, BackoffPolicy::default(), 7),
            address_at_ms: None,
            drops_at_ms: Vec::new(),
            display_ok: true,
            calls: Vec::new(),
            connect_commands: 0,
        }
    }

    /// Deliver every link event scheduled up to the current time
    fn deliver_events(&mut self) {
        while let Some(pos) = self.drops_at_ms.iter().position(|t| *t <= self.now_ms) {
            self.drops_at_ms.remove(pos);
            if self.supervisor.handle(LinkEvent::LinkDown).is_some() {
                self.connect_commands += 1;
                // Reconnect issued straight away in this simulation
                self.supervisor.attempt_started();
            }
        }
        if let Some(at) = self.address_at_ms {
            if at <= self.now_ms {
                self.address_at_ms = None;
                self.supervisor.handle(LinkEvent::AddressAcquired);
            }
        }
    }
}

impl Subsystems for SimBoard<'_> {
    async fn bring_up(&mut self, subsystem: Subsystem) -> Result<(), StepFailure> {
        self.calls.push(subsystem);
        match subsystem {
            Subsystem::Display if !self.display_ok => Err(StepFailure::Fault),
            Subsystem::Network => {
                if self.supervisor.handle(LinkEvent::Started).is_some() {
                    self.connect_commands += 1;
                }
                let shared = self.shared;
                wait_connected(self, shared, CONNECT_TIMEOUT_MS, CONNECT_POLL_MS).await
            }
            _ => Ok(()),
        }
    }

    async fn pause(&mut self, ms: u32) {
        self.now_ms += ms;
        self.deliver_events();
    }
}

#[test]
fn address_before_timeout_connects_without_restart() {
    let shared = SharedConnectivity::new();
    let mut board = SimBoard::new(&shared);
    board.address_at_ms = Some(2_000);

    let outcome = block_on(InitSequencer::new().run(&mut board));

    assert!(!outcome.needs_restart());
    assert_eq!(shared.get(), ConnectivityState::Connected);
    assert_eq!(outcome.report().status(Subsystem::Network), Some(SubsystemStatus::Ok));
    assert_eq!(board.now_ms, 2_000);
    assert_eq!(board.calls, Subsystem::ALL);
}

#[test]
fn no_address_by_timeout_continues_degraded() {
    let shared = SharedConnectivity::new();
    let mut board = SimBoard::new(&shared);

    let outcome = block_on(InitSequencer::new().run(&mut board));

    match outcome {
        BootOutcome::Completed(report) => {
            assert_eq!(report.status(Subsystem::Network), Some(SubsystemStatus::Degraded));
            assert!(report.is_ok(Subsystem::AuxRadio));
            assert!(report.is_ok(Subsystem::TimeSync));
        }
        other => panic!("unexpected restart: {:?}", other),
    }
    assert_eq!(board.now_ms, CONNECT_TIMEOUT_MS);
    assert!(shared.get().is_reconnecting());
}

#[test]
fn link_drops_during_wait_still_degrade_cleanly() {
    let shared = SharedConnectivity::new();
    let mut board = SimBoard::new(&shared);
    board.drops_at_ms = vec![1_500, 4_000, 9_000];

    let outcome = block_on(InitSequencer::new().run(&mut board));

    assert!(!outcome.needs_restart());
    assert_eq!(
        outcome.report().status(Subsystem::Network),
        Some(SubsystemStatus::Degraded)
    );
    // Start plus one reconnect per drop
    assert_eq!(board.connect_commands, 4);
    assert!(matches!(
        shared.get(),
        ConnectivityState::Connecting | ConnectivityState::Disconnected
    ));
}

#[test]
fn address_after_drops_still_connects() {
    let shared = SharedConnectivity::new();
    let mut board = SimBoard::new(&shared);
    board.drops_at_ms = vec![500, 1_000];
    board.address_at_ms = Some(3_000);

    let outcome = block_on(InitSequencer::new().run(&mut board));

    assert!(outcome.report().is_ok(Subsystem::Network));
    assert!(shared.is_connected());
}

#[test]
fn display_failure_restarts_before_anything_else() {
    let shared = SharedConnectivity::new();
    let mut board = SimBoard::new(&shared);
    board.display_ok = false;

    let outcome = block_on(InitSequencer::new().run(&mut board));

    assert_eq!(
        outcome,
        BootOutcome::Restart {
            failed: Subsystem::Display,
            report: *outcome.report(),
        }
    );
    assert_eq!(board.calls.len(), DISPLAY_ATTEMPTS as usize);
    assert!(board.calls.iter().all(|s| *s == Subsystem::Display));
    // Network was never started
    assert_eq!(shared.get(), ConnectivityState::Idle);
    assert_eq!(board.connect_commands, 0);
}
