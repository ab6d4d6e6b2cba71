//! Flush task
//!
//! Owns the panel. Waits for a band in the strip buffer, validates it and
//! writes it out through the flush bridge, whose completion callback wakes
//! the render task. A band that fails on retry is fatal.

use defmt::*;
use embassy_time::{with_timeout, Duration};
use vivarium_core::fault::RestartCause;
use vivarium_core::render::{DirtyRegion, FlushBridge, FlushCompletion, FlushError, FlushOutcome};

use crate::channels::{uptime_ms, FATAL, FLUSH_DONE, FLUSH_REQUEST, FLUSH_TOKEN, STRIP};
use crate::display::Panel;

/// Token refresh interval while no band is waiting
const IDLE_REFRESH_MS: u64 = 500;

/// Completion callback: wakes the render task
struct SignalCompletion;

impl FlushCompletion for SignalCompletion {
    fn complete(&self, outcome: FlushOutcome) {
        FLUSH_DONE.signal(outcome);
    }
}

#[embassy_executor::task]
pub async fn flush_task(panel: Panel) {
    info!("Flush task started");

    let mut bridge = FlushBridge::new(panel, SignalCompletion);
    let bounds = bridge.bounds();

    loop {
        FLUSH_TOKEN.refresh(uptime_ms());

        let area = match with_timeout(Duration::from_millis(IDLE_REFRESH_MS), FLUSH_REQUEST.wait()).await {
            Ok(area) => area,
            Err(_) => continue,
        };

        let strip = STRIP.lock().await;
        let pixels = strip.get(..area.byte_len()).unwrap_or(&[]);
        let region = match DirtyRegion::new(area, pixels, &bounds) {
            Ok(region) => region,
            Err(e) => {
                warn!("Rejected band {}: {}", area, e);
                FLUSH_DONE.signal(FlushOutcome::Failed(area));
                continue;
            }
        };

        match bridge.flush(region).await {
            Ok(()) => {}
            Err(FlushError::Region(e)) => warn!("Rejected band {}: {}", area, e),
            Err(FlushError::Transport(e)) => {
                error!(
                    "Flush of {} failed on retry ({} delivered so far): {}",
                    area,
                    bridge.delivered(),
                    Debug2Format(&e)
                );
                FATAL.signal(RestartCause::FlushFailure);
            }
        }
    }
}
