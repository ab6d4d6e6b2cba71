//! Tick task
//!
//! Advances the render clock at a fixed period and wakes the render task.
//! A late wake-up shows up as a skipped tick number, never as a backlog.

use defmt::*;
use embassy_time::{Duration, Ticker};

use crate::channels::{TICKS, TICK_SIGNAL};

#[embassy_executor::task]
pub async fn tick_task(period_ms: u32) {
    info!("Tick task started ({} ms)", period_ms);

    let mut ticker = Ticker::every(Duration::from_millis(period_ms as u64));

    loop {
        ticker.next().await;
        TICK_SIGNAL.signal(TICKS.tick());
    }
}
