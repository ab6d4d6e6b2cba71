//! Render scheduler
//!
//! Cooperative, tick-driven dispatch of dirty areas to the flush bridge.
//! The scheduler is plain state: the render task asks it what to do at
//! each tick and tells it when a flush completes. That keeps the policy
//! testable on the host and the task a thin async loop.
//!
//! Guarantees:
//! - At most one area is in flight at any time.
//! - A cycle that runs past its tick stops dispatching; the leftover areas
//!   stay pending and merge with new invalidations instead of queueing up
//!   as a backlog of stale frames.

use super::flush::FlushOutcome;
use super::region::{Area, DirtyAreas};

/// Pending area capacity before invalidations collapse into one box
pub const MAX_PENDING_AREAS: usize = 8;

/// How a cycle started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CycleStart {
    /// Dispatch pending areas
    Ready,
    /// A transfer from an earlier cycle is still outstanding; frame dropped
    Busy,
}

/// Frame counters since boot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameStats {
    /// Cycles started (including dropped ones)
    pub cycles: u32,
    /// Frames skipped: missed ticks plus cycles that found the bridge busy
    pub dropped: u32,
    /// Cycles that ran past their tick and stopped early
    pub overruns: u32,
    /// Areas delivered to the panel
    pub flushed: u32,
}

/// Tick-driven render dispatch state
#[derive(Debug, Clone)]
pub struct RenderScheduler<const N: usize = MAX_PENDING_AREAS> {
    bounds: Area,
    pending: DirtyAreas<N>,
    in_flight: Option<Area>,
    /// Tick of the cycle currently dispatching
    cycle: Option<u32>,
    last_tick: Option<u32>,
    stats: FrameStats,
}

impl<const N: usize> RenderScheduler<N> {
    /// Create a scheduler for a panel with the given bounds
    pub const fn new(bounds: Area) -> Self {
        Self {
            bounds,
            pending: DirtyAreas::new(),
            in_flight: None,
            cycle: None,
            last_tick: None,
            stats: FrameStats {
                cycles: 0,
                dropped: 0,
                overruns: 0,
                flushed: 0,
            },
        }
    }

    /// Mark an area as needing a redraw
    ///
    /// Areas are clipped to the panel; anything fully off-panel is ignored.
    pub fn invalidate(&mut self, area: Area) {
        if let Some(clipped) = area.clip(&self.bounds) {
            self.pending.push(clipped);
        }
    }

    /// Start the cycle for `tick`
    ///
    /// Ticks skipped since the previous cycle count as dropped frames.
    pub fn begin_cycle(&mut self, tick: u32) -> CycleStart {
        if let Some(last) = self.last_tick {
            let gap = tick.wrapping_sub(last);
            if gap > 1 {
                self.stats.dropped = self.stats.dropped.wrapping_add(gap - 1);
            }
        }
        self.last_tick = Some(tick);
        self.stats.cycles = self.stats.cycles.wrapping_add(1);

        if self.in_flight.is_some() {
            self.cycle = None;
            self.stats.dropped = self.stats.dropped.wrapping_add(1);
            return CycleStart::Busy;
        }

        self.cycle = Some(tick);
        CycleStart::Ready
    }

    /// Next area to hand to the flush bridge in this cycle
    ///
    /// `now` is the latest tick. Returns `None` when the cycle is done,
    /// when a transfer is still outstanding, or when the cycle has run past
    /// its tick (the rest of the cycle is dropped).
    pub fn next_dispatch(&mut self, now: u32) -> Option<Area> {
        let cycle = self.cycle?;

        if self.in_flight.is_some() {
            return None;
        }

        if now != cycle {
            self.cycle = None;
            self.stats.overruns = self.stats.overruns.wrapping_add(1);
            return None;
        }

        match self.pending.pop() {
            Some(area) => {
                self.in_flight = Some(area);
                Some(area)
            }
            None => {
                self.cycle = None;
                None
            }
        }
    }

    /// Record the completion callback for the outstanding transfer
    ///
    /// Returns `false` if nothing matching was in flight. A failed area is
    /// invalidated again so it is redrawn from current pixels.
    pub fn flush_complete(&mut self, outcome: FlushOutcome) -> bool {
        match self.in_flight {
            Some(area) if area == outcome.area() => {
                self.in_flight = None;
                if outcome.is_delivered() {
                    self.stats.flushed = self.stats.flushed.wrapping_add(1);
                } else {
                    self.pending.push(area);
                }
                true
            }
            _ => false,
        }
    }

    /// Abandon the current cycle without counting it as an overrun
    pub fn end_cycle(&mut self) {
        self.cycle = None;
    }

    /// Area currently being transferred
    pub fn in_flight(&self) -> Option<Area> {
        self.in_flight
    }

    /// Check if a cycle is dispatching
    pub fn in_cycle(&self) -> bool {
        self.cycle.is_some()
    }

    /// Check if anything is waiting to be drawn
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Number of pending (coalesced) areas
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn bounds(&self) -> Area {
        self.bounds
    }
}
