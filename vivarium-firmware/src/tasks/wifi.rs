//! Wi-Fi task
//!
//! Runs the connectivity supervisor: consumes link events, and carries out
//! each connect command after its backoff delay by joining the configured
//! network. A join that fails outright counts as a link drop.

use defmt::*;
use embassy_time::{with_timeout, Duration};
use vivarium_core::config::WifiConfig;
use vivarium_core::net::{BackoffPolicy, ConnectRequest, ConnectivitySupervisor, LinkEvent};

use super::supervised_sleep;
use crate::channels::{uptime_ms, CONNECTIVITY, LINK_EVENTS, WIFI_TOKEN};

/// Token refresh interval while waiting for link events
const IDLE_REFRESH_MS: u64 = 1_000;

#[embassy_executor::task]
pub async fn wifi_task(
    mut control: cyw43::Control<'static>,
    wifi: &'static WifiConfig,
    policy: BackoffPolicy,
    seed: u32,
) {
    info!("WiFi task started");

    let mut supervisor = ConnectivitySupervisor::new(&CONNECTIVITY, policy, seed);
    let mut pending: Option<ConnectRequest> = None;

    loop {
        WIFI_TOKEN.refresh(uptime_ms());

        if let Some(request) = pending.take() {
            if request.delay_ms > 0 {
                info!("Reconnect {} in {} ms", request.attempt, request.delay_ms);
            }
            supervised_sleep(&WIFI_TOKEN, request.delay_ms).await;
            supervisor.attempt_started();

            if let Err(status) = join(&mut control, wifi).await {
                warn!("Join of {} failed (status {})", wifi.ssid.as_str(), status);
                pending = supervisor.handle(LinkEvent::LinkDown);
            }
            continue;
        }

        let event = match with_timeout(Duration::from_millis(IDLE_REFRESH_MS), LINK_EVENTS.receive()).await {
            Ok(event) => event,
            Err(_) => continue,
        };

        let before = supervisor.state();
        pending = supervisor.handle(event);
        if supervisor.state() != before {
            info!("Connectivity {} -> {} on {}", before, supervisor.state(), event);
        }
    }
}

/// Join the configured network; `Err` carries the firmware status code
async fn join(control: &mut cyw43::Control<'static>, wifi: &WifiConfig) -> Result<(), u32> {
    info!("Joining {}", wifi.ssid.as_str());
    let options = if wifi.is_open() {
        cyw43::JoinOptions::new_open()
    } else {
        cyw43::JoinOptions::new(wifi.password.as_bytes())
    };
    control
        .join(wifi.ssid.as_str(), options)
        .await
        .map_err(|e| e.status)
}
