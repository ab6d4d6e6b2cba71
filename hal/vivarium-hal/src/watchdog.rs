//! Hardware watchdog abstraction
//!
//! The liveness supervisor feeds the watchdog while every supervised task
//! is healthy and stops feeding it on a stall. Scratch registers keep a few
//! words across a watchdog reset for the restart record.

/// Scratch word holding the packed restart record
pub const RESTART_RECORD_SCRATCH: usize = 0;

/// Independent hardware watchdog
pub trait HardwareWatchdog {
    /// Arm the watchdog; it must be fed at least every `timeout_ms`
    fn start(&mut self, timeout_ms: u32);

    /// Reload the countdown
    fn feed(&mut self);

    /// Reset the chip as soon as possible
    fn trigger_reset(&mut self);

    /// Read a scratch word preserved across watchdog resets
    fn scratch(&mut self, index: usize) -> u32;

    /// Write a scratch word preserved across watchdog resets
    fn set_scratch(&mut self, index: usize, value: u32);
}
