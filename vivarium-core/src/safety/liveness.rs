//! Liveness supervision
//!
//! Every supervised task owns a [`LivenessToken`] and refreshes it each
//! cycle. The supervisor runs in the main loop, checks that every token has
//! been refreshed within its timeout class, and decides whether the hardware
//! watchdog gets fed. A stall escalates exactly once; after that the
//! watchdog is starved and the hardware does the reset.

use heapless::Vec;
use portable_atomic::{AtomicU32, Ordering};

/// Default timeout for UI-critical tasks (render loop)
pub const UI_CRITICAL_TIMEOUT_MS: u32 = 2_000;

/// Default timeout for best-effort tasks (status, time sync)
pub const BEST_EFFORT_TIMEOUT_MS: u32 = 30_000;

/// Supervisor loop period
pub const CHECK_PERIOD_MS: u32 = 1_000;

/// Hardware watchdog timeout
pub const WATCHDOG_TIMEOUT_MS: u32 = 5_000;

/// How long a task may stay silent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutClass {
    UiCritical,
    BestEffort,
}

/// Per-class timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LivenessTimeouts {
    pub ui_critical_ms: u32,
    pub best_effort_ms: u32,
}

impl LivenessTimeouts {
    pub fn for_class(&self, class: TimeoutClass) -> u32 {
        match class {
            TimeoutClass::UiCritical => self.ui_critical_ms,
            TimeoutClass::BestEffort => self.best_effort_ms,
        }
    }
}

impl Default for LivenessTimeouts {
    fn default() -> Self {
        Self {
            ui_critical_ms: UI_CRITICAL_TIMEOUT_MS,
            best_effort_ms: BEST_EFFORT_TIMEOUT_MS,
        }
    }
}

/// Heartbeat marker written by one task
#[derive(Debug)]
pub struct LivenessToken {
    name: &'static str,
    class: TimeoutClass,
    last_ms: AtomicU32,
    beats: AtomicU32,
}

impl LivenessToken {
    pub const fn new(name: &'static str, class: TimeoutClass) -> Self {
        Self {
            name,
            class,
            last_ms: AtomicU32::new(0),
            beats: AtomicU32::new(0),
        }
    }

    /// Record that the owning task is alive at `now_ms`
    pub fn refresh(&self, now_ms: u32) {
        self.last_ms.store(now_ms, Ordering::Release);
        self.beats.fetch_add(1, Ordering::Release);
    }

    pub fn last_refresh_ms(&self) -> u32 {
        self.last_ms.load(Ordering::Acquire)
    }

    /// Refreshes since boot
    pub fn beats(&self) -> u32 {
        self.beats.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn class(&self) -> TimeoutClass {
        self.class
    }
}

/// A task that missed its deadline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stall {
    pub task: &'static str,
    pub class: TimeoutClass,
    pub silent_ms: u32,
}

/// Result of one supervisor check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Verdict {
    /// All tasks alive, feed the watchdog
    Healthy,
    /// First stall seen, reset now
    Escalate(Stall),
    /// Reset already requested, do nothing
    AlreadyEscalated,
}

/// Supervisor errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LivenessError {
    /// No room for another token
    Full,
}

/// Checks liveness tokens and gates the watchdog feed
pub struct LivenessSupervisor<'a, const N: usize> {
    tokens: Vec<&'a LivenessToken, N>,
    timeouts: LivenessTimeouts,
    escalated: Option<Stall>,
}

impl<'a, const N: usize> LivenessSupervisor<'a, N> {
    pub fn new(timeouts: LivenessTimeouts) -> Self {
        Self {
            tokens: Vec::new(),
            timeouts,
            escalated: None,
        }
    }

    /// Start supervising a token
    ///
    /// The token is refreshed at `now_ms` so a task registered late is not
    /// judged on time it was never running.
    pub fn register(&mut self, token: &'a LivenessToken, now_ms: u32) -> Result<(), LivenessError> {
        self.tokens.push(token).map_err(|_| LivenessError::Full)?;
        token.refresh(now_ms);
        Ok(())
    }

    /// Check every token at `now_ms`
    pub fn check(&mut self, now_ms: u32) -> Verdict {
        if self.escalated.is_some() {
            return Verdict::AlreadyEscalated;
        }

        for token in self.tokens.iter() {
            let silent_ms = elapsed(token.last_refresh_ms(), now_ms);
            if silent_ms > self.timeouts.for_class(token.class()) {
                let stall = Stall {
                    task: token.name(),
                    class: token.class(),
                    silent_ms,
                };
                self.escalated = Some(stall);
                return Verdict::Escalate(stall);
            }
        }

        Verdict::Healthy
    }

    /// Check if the watchdog may still be fed
    pub fn should_feed(&self) -> bool {
        self.escalated.is_none()
    }

    /// The stall that caused escalation
    pub fn escalation(&self) -> Option<Stall> {
        self.escalated
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Wrapping-safe elapsed time; a refresh stamped after `now` reads as zero
fn elapsed(since: u32, now: u32) -> u32 {
    let diff = now.wrapping_sub(since);
    if diff > u32::MAX / 2 {
        0
    } else {
        diff
    }
}
