//! Time sync
//!
//! SNTP over UDP against the configured server, resolved through DNS. One
//! bounded attempt runs during bring-up; afterwards this task resyncs
//! periodically and retries sooner while no sync has succeeded.

use defmt::*;
use embassy_net::dns::DnsQueryType;
use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpEndpoint, Stack};
use embassy_time::{with_timeout, Duration, Instant};
use vivarium_core::config::TimeConfig;
use vivarium_core::time::{self, SntpError, NTP_PORT, PACKET_LEN};

use super::supervised_sleep;
use crate::channels::{CONNECTIVITY, TIME_TOKEN, WALL_CLOCK};

/// Local UDP port for SNTP requests
const LOCAL_PORT: u16 = 50_123;

/// Wait for a reply before giving up on an attempt
const REPLY_TIMEOUT_MS: u64 = 5_000;

/// Retry interval while unsynced
const RETRY_MS: u32 = 30_000;

/// Upper bound on one whole exchange, DNS included
pub const SYNC_TIMEOUT_MS: u64 = 10_000;

/// Time sync failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum TimeSyncError {
    /// Not connected
    Offline,
    /// Server name did not resolve
    Dns,
    /// Socket bind or send failed
    Socket,
    /// No reply in time
    Timeout,
    /// Reply was not a usable server response
    Reply(SntpError),
}

impl From<SntpError> for TimeSyncError {
    fn from(e: SntpError) -> Self {
        TimeSyncError::Reply(e)
    }
}

/// [`sync_once`] bounded by [`SYNC_TIMEOUT_MS`]
pub async fn sync_bounded(stack: Stack<'static>, server: &str) -> Result<u32, TimeSyncError> {
    with_timeout(Duration::from_millis(SYNC_TIMEOUT_MS), sync_once(stack, server))
        .await
        .unwrap_or(Err(TimeSyncError::Timeout))
}

/// One SNTP exchange; sets the wall clock on success
pub async fn sync_once(stack: Stack<'static>, server: &str) -> Result<u32, TimeSyncError> {
    if !CONNECTIVITY.is_connected() {
        return Err(TimeSyncError::Offline);
    }

    let addrs = stack
        .dns_query(server, DnsQueryType::A)
        .await
        .map_err(|_| TimeSyncError::Dns)?;
    let addr = addrs.first().copied().ok_or(TimeSyncError::Dns)?;

    let mut rx_meta = [PacketMetadata::EMPTY; 2];
    let mut rx_buf = [0u8; 128];
    let mut tx_meta = [PacketMetadata::EMPTY; 2];
    let mut tx_buf = [0u8; 128];
    let mut socket = UdpSocket::new(stack, &mut rx_meta, &mut rx_buf, &mut tx_meta, &mut tx_buf);
    socket.bind(LOCAL_PORT).map_err(|_| TimeSyncError::Socket)?;

    socket
        .send_to(&time::request(), IpEndpoint::new(addr, NTP_PORT))
        .await
        .map_err(|_| TimeSyncError::Socket)?;

    let mut reply = [0u8; PACKET_LEN];
    let (len, _) = with_timeout(Duration::from_millis(REPLY_TIMEOUT_MS), socket.recv_from(&mut reply))
        .await
        .map_err(|_| TimeSyncError::Timeout)?
        .map_err(|_| TimeSyncError::Socket)?;

    let unix_secs = time::parse_reply(&reply[..len])?;
    WALL_CLOCK.set(unix_secs, Instant::now().as_millis());
    Ok(unix_secs)
}

#[embassy_executor::task]
pub async fn time_sync_task(stack: Stack<'static>, config: &'static TimeConfig) {
    info!("Time sync task started");

    loop {
        let wait_ms = if WALL_CLOCK.is_set() {
            config.resync_s.saturating_mul(1000)
        } else {
            RETRY_MS
        };
        supervised_sleep(&TIME_TOKEN, wait_ms).await;

        match sync_bounded(stack, config.server.as_str()).await {
            Ok(unix_secs) => info!("Time synced: {} (unix)", unix_secs),
            Err(TimeSyncError::Offline) => debug!("Time sync skipped, offline"),
            Err(e) => warn!("Time sync failed: {}", e),
        }
    }
}
