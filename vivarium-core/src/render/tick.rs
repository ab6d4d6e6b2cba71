//! Logical render clock
//!
//! The tick source only counts. It is advanced from a periodic timer and
//! read by the render loop; a late or missed tick never blocks anything.

use portable_atomic::{AtomicU32, Ordering};

/// Nominal tick period (~60 FPS)
pub const TICK_PERIOD_MS: u32 = 16;

/// Monotonic tick counter shared between the timer and the render loop
#[derive(Debug)]
pub struct TickSource {
    ticks: AtomicU32,
    period_ms: u32,
}

impl TickSource {
    /// Create a tick source with the given period
    pub const fn new(period_ms: u32) -> Self {
        Self {
            ticks: AtomicU32::new(0),
            period_ms,
        }
    }

    /// Advance the clock by one period, returning the new tick count
    pub fn tick(&self) -> u32 {
        self.ticks.fetch_add(1, Ordering::AcqRel).wrapping_add(1)
    }

    /// Current tick count
    pub fn now(&self) -> u32 {
        self.ticks.load(Ordering::Acquire)
    }

    /// Logical time in milliseconds
    pub fn elapsed_ms(&self) -> u32 {
        self.now().wrapping_mul(self.period_ms)
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }
}

impl Default for TickSource {
    fn default() -> Self {
        Self::new(TICK_PERIOD_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_up() {
        let ticks = TickSource::default();
        assert_eq!(ticks.now(), 0);
        assert_eq!(ticks.tick(), 1);
        assert_eq!(ticks.tick(), 2);
        assert_eq!(ticks.now(), 2);
        assert_eq!(ticks.elapsed_ms(), 32);
    }

    #[test]
    fn test_custom_period() {
        let ticks = TickSource::new(10);
        for _ in 0..5 {
            ticks.tick();
        }
        assert_eq!(ticks.period_ms(), 10);
        assert_eq!(ticks.elapsed_ms(), 50);
    }
}
