//! RP2040 watchdog
//!
//! Wraps the embassy-rp watchdog. The RP2040 keeps eight scratch words
//! across a watchdog reset; word 0 carries the restart record.

use embassy_rp::peripherals::WATCHDOG;
use embassy_rp::watchdog::{ResetReason, Watchdog};
use embassy_rp::Peri;
use embassy_time::Duration;

/// Number of scratch registers on the RP2040
pub const SCRATCH_WORDS: usize = 8;

/// Longest period the RP2040 watchdog counter can hold
pub const MAX_TIMEOUT_MS: u32 = 8_300;

pub struct Rp2040Watchdog {
    inner: Watchdog,
}

impl Rp2040Watchdog {
    pub fn new(watchdog: Peri<'static, WATCHDOG>) -> Self {
        let mut inner = Watchdog::new(watchdog);
        // Keep counting while a debugger halts the cores
        inner.pause_on_debug(false);
        Self { inner }
    }

    /// Whether the last reset came from the watchdog
    pub fn reset_by_watchdog(&self) -> bool {
        matches!(
            self.inner.reset_reason(),
            Some(ResetReason::TimedOut) | Some(ResetReason::Forced)
        )
    }
}

impl vivarium_hal::HardwareWatchdog for Rp2040Watchdog {
    fn start(&mut self, timeout_ms: u32) {
        let timeout_ms = timeout_ms.min(MAX_TIMEOUT_MS);
        self.inner.start(Duration::from_millis(timeout_ms as u64));
    }

    fn feed(&mut self) {
        self.inner.feed();
    }

    fn trigger_reset(&mut self) {
        self.inner.trigger_reset();
    }

    fn scratch(&mut self, index: usize) -> u32 {
        if index >= SCRATCH_WORDS {
            return 0;
        }
        self.inner.get_scratch(index)
    }

    fn set_scratch(&mut self, index: usize, value: u32) {
        if index < SCRATCH_WORDS {
            self.inner.set_scratch(index, value);
        }
    }
}
