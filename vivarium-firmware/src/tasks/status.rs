//! Status task
//!
//! Samples wall-clock time and radio states once a second and updates the
//! status bar model. The bar strip is only invalidated when a label text
//! actually changes.

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};
use portable_atomic::Ordering;
use vivarium_core::ui::{StatusBar, StatusInputs, STATUS_REFRESH_MS};

use crate::channels::{
    uptime_ms, BT_ENABLED, CONNECTIVITY, INVALIDATE, STATUS_BAR, STATUS_TOKEN, WALL_CLOCK,
};

#[embassy_executor::task]
pub async fn status_task(panel_width: u16, utc_offset_minutes: i16) {
    info!("Status task started");

    let mut ticker = Ticker::every(Duration::from_millis(STATUS_REFRESH_MS as u64));

    loop {
        STATUS_TOKEN.refresh(uptime_ms());

        let inputs = StatusInputs {
            time: WALL_CLOCK.local(Instant::now().as_millis(), utc_offset_minutes),
            wifi_connected: CONNECTIVITY.is_connected(),
            bt_enabled: BT_ENABLED.load(Ordering::Acquire),
        };

        if STATUS_BAR.lock(|bar| bar.borrow_mut().update(&inputs)) {
            debug!("Status bar changed");
            INVALIDATE.send(StatusBar::area(panel_width)).await;
        }

        ticker.next().await;
    }
}
