//! Link monitor task
//!
//! Turns the IP stack's link and DHCP state into link events for the
//! connectivity supervisor. Only edges are reported.

use defmt::*;
use embassy_net::Stack;
use embassy_time::Timer;
use vivarium_core::net::LinkEvent;

use crate::channels::LINK_EVENTS;

/// Poll interval for link and address state
const LINK_POLL_MS: u64 = 250;

#[embassy_executor::task]
pub async fn link_monitor_task(stack: Stack<'static>) {
    info!("Link monitor task started");

    let mut link_up = false;
    let mut addressed = false;

    loop {
        let up = stack.is_link_up();
        if link_up && !up {
            warn!("Link down");
            addressed = false;
            LINK_EVENTS.send(LinkEvent::LinkDown).await;
        }
        link_up = up;

        if !addressed {
            if let Some(config) = stack.config_v4() {
                info!("Got IP: {}", config.address);
                addressed = true;
                LINK_EVENTS.send(LinkEvent::AddressAcquired).await;
            }
        }

        Timer::after_millis(LINK_POLL_MS).await;
    }
}
