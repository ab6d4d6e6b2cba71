//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.
//! The tick, render and flush tasks run on the high-priority interrupt
//! executor; everything else runs in thread mode.

pub mod flush;
pub mod link_monitor;
pub mod net;
pub mod render;
pub mod status;
pub mod tick;
pub mod time_sync;
pub mod wifi;

pub use flush::flush_task;
pub use link_monitor::link_monitor_task;
pub use net::{cyw43_task, net_task};
pub use render::render_task;
pub use status::status_task;
pub use tick::tick_task;
pub use time_sync::time_sync_task;
pub use wifi::wifi_task;

use embassy_time::Timer;
use vivarium_core::safety::LivenessToken;

use crate::channels::uptime_ms;

/// Longest a supervised task sleeps without refreshing its token
const REFRESH_SLICE_MS: u32 = 5_000;

/// Sleep for `ms`, refreshing `token` along the way
pub async fn supervised_sleep(token: &LivenessToken, ms: u32) {
    let mut left = ms;
    loop {
        token.refresh(uptime_ms());
        if left == 0 {
            return;
        }
        let step = left.min(REFRESH_SLICE_MS);
        Timer::after_millis(step as u64).await;
        left -= step;
    }
}
