//! Flush bridge between the render loop and the display transport
//!
//! The bridge turns one dirty region into one transport write and reports
//! the outcome through a completion callback, the same way a UI toolkit's
//! `flush_ready` works. It runs in its own task so the render loop only
//! hands a region over and goes back to waiting for ticks.

use super::region::{Area, DirtyRegion, RegionError};
use crate::traits::DisplayTransport;

/// Transport writes attempted per region before giving up
pub const WRITE_ATTEMPTS: u8 = 2;

/// Result of one flush, reported to the render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushOutcome {
    /// Every pixel of the area reached the panel
    Delivered(Area),
    /// The area could not be delivered
    Failed(Area),
}

impl FlushOutcome {
    pub fn area(&self) -> Area {
        match self {
            FlushOutcome::Delivered(area) | FlushOutcome::Failed(area) => *area,
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, FlushOutcome::Delivered(_))
    }
}

/// Completion callback fired once per flushed region
pub trait FlushCompletion {
    fn complete(&self, outcome: FlushOutcome);
}

/// Flush failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushError<E> {
    /// Region rejected before touching the bus
    Region(RegionError),
    /// Transport failed on every attempt
    Transport(E),
}

/// Adapter from dirty regions to display transport writes
///
/// Only constructed around a transport whose `init` succeeded; a panel that
/// never came up is a restart, not a degraded bridge.
pub struct FlushBridge<T, C> {
    transport: T,
    completion: C,
    bounds: Area,
    delivered: u32,
    failed: u32,
}

impl<T, C> FlushBridge<T, C>
where
    T: DisplayTransport,
    C: FlushCompletion,
{
    /// Wrap an initialized transport
    pub fn new(transport: T, completion: C) -> Self {
        let bounds = transport.bounds();
        Self {
            transport,
            completion,
            bounds,
            delivered: 0,
            failed: 0,
        }
    }

    /// Push one region to the panel
    ///
    /// The completion callback fires exactly once, whatever the result, so
    /// the render loop never waits on a transfer that is not coming back.
    pub async fn flush(&mut self, region: DirtyRegion<'_>) -> Result<(), FlushError<T::Error>> {
        let area = region.area();

        if !self.bounds.contains(&area) {
            self.failed = self.failed.wrapping_add(1);
            self.completion.complete(FlushOutcome::Failed(area));
            return Err(FlushError::Region(RegionError::OutOfBounds));
        }

        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            match self.transport.write(area, region.pixels()).await {
                Ok(()) => break Ok(()),
                Err(e) if attempt >= WRITE_ATTEMPTS => break Err(e),
                Err(_) => continue,
            }
        };

        match result {
            Ok(()) => {
                self.delivered = self.delivered.wrapping_add(1);
                self.completion.complete(FlushOutcome::Delivered(area));
                Ok(())
            }
            Err(e) => {
                self.failed = self.failed.wrapping_add(1);
                self.completion.complete(FlushOutcome::Failed(area));
                Err(FlushError::Transport(e))
            }
        }
    }

    /// Panel bounds regions must fit in
    pub fn bounds(&self) -> Area {
        self.bounds
    }

    /// Regions delivered since boot
    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    /// Regions that failed since boot
    pub fn failed(&self) -> u32 {
        self.failed
    }

    /// Access the transport (backlight changes, diagnostics)
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use embassy_futures::block_on;
    use heapless::Vec;

    struct MockPanel {
        writes: Vec<Area, 8>,
        failures_left: u8,
    }

    impl MockPanel {
        fn new() -> Self {
            Self {
                writes: Vec::new(),
                failures_left: 0,
            }
        }

        fn failing(times: u8) -> Self {
            Self {
                writes: Vec::new(),
                failures_left: times,
            }
        }
    }

    impl DisplayTransport for MockPanel {
        type Error = ();

        async fn init(&mut self) -> Result<(), ()> {
            Ok(())
        }

        async fn write(&mut self, area: Area, pixels: &[u8]) -> Result<(), ()> {
            assert_eq!(pixels.len(), area.byte_len());
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(());
            }
            self.writes.push(area).unwrap();
            Ok(())
        }

        fn dimensions(&self) -> (u16, u16) {
            (320, 480)
        }

        fn set_brightness(&mut self, _level: u8) -> Result<(), ()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        outcomes: RefCell<Vec<FlushOutcome, 8>>,
    }

    impl FlushCompletion for &Recorder {
        fn complete(&self, outcome: FlushOutcome) {
            self.outcomes.borrow_mut().push(outcome).unwrap();
        }
    }

    #[test]
    fn test_flush_delivers_and_completes() {
        let recorder = Recorder::default();
        let mut bridge = FlushBridge::new(MockPanel::new(), &recorder);
        let area = Area::new(0, 0, 3, 1);
        let pixels = [0xAAu8; 16];
        let region = DirtyRegion::new(area, &pixels, &bridge.bounds()).unwrap();

        block_on(bridge.flush(region)).unwrap();

        assert_eq!(bridge.transport_mut().writes.as_slice(), &[area]);
        assert_eq!(
            recorder.outcomes.borrow().as_slice(),
            &[FlushOutcome::Delivered(area)]
        );
        assert_eq!(bridge.delivered(), 1);
    }

    #[test]
    fn test_flush_retries_once() {
        let recorder = Recorder::default();
        let mut bridge = FlushBridge::new(MockPanel::failing(1), &recorder);
        let area = Area::new(10, 10, 10, 10);
        let pixels = [0u8; 2];
        let region = DirtyRegion::new(area, &pixels, &bridge.bounds()).unwrap();

        assert!(block_on(bridge.flush(region)).is_ok());
        assert_eq!(bridge.transport_mut().writes.len(), 1);
        assert_eq!(bridge.failed(), 0);
    }

    #[test]
    fn test_flush_failure_still_completes() {
        let recorder = Recorder::default();
        let mut bridge = FlushBridge::new(MockPanel::failing(WRITE_ATTEMPTS), &recorder);
        let area = Area::new(0, 0, 0, 0);
        let pixels = [0u8; 2];
        let region = DirtyRegion::new(area, &pixels, &bridge.bounds()).unwrap();

        let result = block_on(bridge.flush(region));
        assert_eq!(result, Err(FlushError::Transport(())));
        assert_eq!(
            recorder.outcomes.borrow().as_slice(),
            &[FlushOutcome::Failed(area)]
        );
        assert_eq!(bridge.failed(), 1);
    }

    #[test]
    fn test_outcome_accessors() {
        let area = Area::new(1, 2, 3, 4);
        assert!(FlushOutcome::Delivered(area).is_delivered());
        assert!(!FlushOutcome::Failed(area).is_delivered());
        assert_eq!(FlushOutcome::Failed(area).area(), area);
    }
}
