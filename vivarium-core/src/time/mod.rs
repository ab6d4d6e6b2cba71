//! Wall-clock time
//!
//! The clock stores a single offset between uptime and Unix time, set by
//! the time sync task and read by the status bar.

pub mod civil;
pub mod sntp;

use portable_atomic::{AtomicU64, Ordering};

pub use civil::{DateTime, DATE_TIME_LEN};
pub use sntp::{parse_reply, request, SntpError, NTP_PORT, NTP_UNIX_OFFSET, PACKET_LEN};

/// Uptime-to-Unix offset, published atomically
#[derive(Debug)]
pub struct WallClock {
    /// Unix milliseconds at uptime zero; 0 while unsynced
    boot_unix_ms: AtomicU64,
}

impl WallClock {
    pub const fn new() -> Self {
        Self {
            boot_unix_ms: AtomicU64::new(0),
        }
    }

    /// Record a sync: Unix seconds `unix_secs` observed at `uptime_ms`
    pub fn set(&self, unix_secs: u32, uptime_ms: u64) {
        let unix_ms = unix_secs as u64 * 1000;
        // A bogus reply earlier than boot would underflow; keep at least 1
        let offset = unix_ms.saturating_sub(uptime_ms).max(1);
        self.boot_unix_ms.store(offset, Ordering::Release);
    }

    /// Check if a sync has happened
    pub fn is_set(&self) -> bool {
        self.boot_unix_ms.load(Ordering::Acquire) != 0
    }

    /// Unix seconds at `uptime_ms`, `None` before the first sync
    pub fn unix_secs(&self, uptime_ms: u64) -> Option<u64> {
        match self.boot_unix_ms.load(Ordering::Acquire) {
            0 => None,
            offset => Some((offset + uptime_ms) / 1000),
        }
    }

    /// Local calendar time at `uptime_ms`
    pub fn local(&self, uptime_ms: u64, utc_offset_minutes: i16) -> Option<DateTime> {
        self.unix_secs(uptime_ms)
            .map(|secs| DateTime::from_unix(secs, utc_offset_minutes))
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_clock() {
        let clock = WallClock::new();
        assert!(!clock.is_set());
        assert_eq!(clock.unix_secs(5_000), None);
        assert_eq!(clock.local(5_000, 0), None);
    }

    #[test]
    fn test_clock_advances_with_uptime() {
        let clock = WallClock::new();
        clock.set(1_700_000_000, 10_000);
        assert!(clock.is_set());
        assert_eq!(clock.unix_secs(10_000), Some(1_700_000_000));
        assert_eq!(clock.unix_secs(75_500), Some(1_700_000_065));
    }

    #[test]
    fn test_resync_replaces_offset() {
        let clock = WallClock::new();
        clock.set(1_700_000_000, 0);
        clock.set(1_700_000_100, 90_000);
        assert_eq!(clock.unix_secs(90_000), Some(1_700_000_100));
    }
}
