//! Terminal configuration types
//!
//! Stored in flash as TOML or postcard, embedded in the firmware as
//! `terminal.toml`, and compiled-in as defaults when neither is usable.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::net::BackoffPolicy;
use crate::safety::LivenessTimeouts;
use crate::traits::MountOptions;

/// Current config layout version
pub const CONFIG_VERSION: u8 = 1;

/// Maximum SSID length (802.11)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA2 passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Maximum host name length for the time server
pub const MAX_HOST_LEN: usize = 48;

/// Maximum storage mount path length
pub const MAX_PATH_LEN: usize = 16;

pub const MAX_PANEL_DIMENSION: u16 = 480;

/// ST7796 write clock limits
pub const MIN_SPI_HZ: u32 = 1_000_000;
pub const MAX_SPI_HZ: u32 = 62_500_000;

pub const MAX_TICK_MS: u32 = 1_000;

/// RP2040 watchdog counter holds at most ~8.3 s
pub const MAX_WATCHDOG_TIMEOUT_MS: u32 = 8_300;
pub const MIN_WATCHDOG_TIMEOUT_MS: u32 = 100;

pub const MIN_CONNECT_TIMEOUT_MS: u32 = 100;
pub const MAX_CONNECT_TIMEOUT_MS: u32 = 120_000;

/// Longest allowed reconnect delay cap
pub const MAX_BACKOFF_MS: u32 = 600_000;

pub const MAX_FILES: u8 = 32;

pub const MIN_UTC_OFFSET_MINUTES: i16 = -720;
pub const MAX_UTC_OFFSET_MINUTES: i16 = 840;

pub const MIN_RESYNC_S: u32 = 60;
pub const MAX_RESYNC_S: u32 = 86_400;

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
    /// Enable internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull_up: false,
        }
    }
}

/// Display panel hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PanelConfig {
    pub width: u16,
    pub height: u16,
    /// SPI clock in Hz
    pub clock_hz: u32,
    /// Use DMA for pixel transfers
    pub dma: bool,
    /// Backlight level 0-255
    pub brightness: u8,
    /// Data/command select
    pub dc_pin: PinConfig,
    /// Panel reset (active-low)
    pub rst_pin: PinConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 480,
            clock_hz: 62_500_000,
            dma: true,
            brightness: 128,
            dc_pin: PinConfig::new(20),
            rst_pin: PinConfig::inverted(21),
        }
    }
}

/// Wi-Fi station credentials
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WifiConfig {
    pub ssid: String<MAX_SSID_LEN>,
    pub password: String<MAX_PASSWORD_LEN>,
}

impl WifiConfig {
    /// Open networks have an empty password
    pub fn is_open(&self) -> bool {
        self.password.is_empty()
    }
}

/// Connectivity supervision tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NetworkConfig {
    /// Bounded wait for the first connection at boot
    pub connect_timeout_ms: u32,
    pub backoff_initial_ms: u32,
    pub backoff_max_ms: u32,
    pub jitter_percent: u8,
}

impl NetworkConfig {
    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            initial_ms: self.backoff_initial_ms,
            max_ms: self.backoff_max_ms,
            jitter_percent: self.jitter_percent,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let policy = BackoffPolicy::default();
        Self {
            connect_timeout_ms: crate::net::CONNECT_TIMEOUT_MS,
            backoff_initial_ms: policy.initial_ms,
            backoff_max_ms: policy.max_ms,
            jitter_percent: policy.jitter_percent,
        }
    }
}

/// Render loop timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderConfig {
    pub tick_ms: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tick_ms: crate::render::TICK_PERIOD_MS,
        }
    }
}

/// Liveness supervision and hardware watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WatchdogConfig {
    /// Supervisor check period
    pub period_ms: u32,
    /// Hardware watchdog timeout
    pub timeout_ms: u32,
    pub ui_timeout_ms: u32,
    pub best_effort_timeout_ms: u32,
}

impl WatchdogConfig {
    pub fn liveness_timeouts(&self) -> LivenessTimeouts {
        LivenessTimeouts {
            ui_critical_ms: self.ui_timeout_ms,
            best_effort_ms: self.best_effort_timeout_ms,
        }
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        use crate::safety::{
            BEST_EFFORT_TIMEOUT_MS, CHECK_PERIOD_MS, UI_CRITICAL_TIMEOUT_MS, WATCHDOG_TIMEOUT_MS,
        };
        Self {
            period_ms: CHECK_PERIOD_MS,
            timeout_ms: WATCHDOG_TIMEOUT_MS,
            ui_timeout_ms: UI_CRITICAL_TIMEOUT_MS,
            best_effort_timeout_ms: BEST_EFFORT_TIMEOUT_MS,
        }
    }
}

/// Storage volume
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StorageConfig {
    pub path: String<MAX_PATH_LEN>,
    pub format_if_mount_failed: bool,
    pub max_files: u8,
}

impl StorageConfig {
    pub fn mount_options(&self) -> MountOptions {
        MountOptions {
            format_if_mount_failed: self.format_if_mount_failed,
            max_files: self.max_files,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let options = MountOptions::default();
        Self {
            path: String::try_from("/data").unwrap_or_default(),
            format_if_mount_failed: options.format_if_mount_failed,
            max_files: options.max_files,
        }
    }
}

/// Wall-clock time
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeConfig {
    /// SNTP server host name
    pub server: String<MAX_HOST_LEN>,
    /// Local offset from UTC
    pub utc_offset_minutes: i16,
    /// Resync interval once synced
    pub resync_s: u32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            server: String::try_from("pool.ntp.org").unwrap_or_default(),
            utc_offset_minutes: 60,
            resync_s: 3600,
        }
    }
}

/// Auxiliary (Bluetooth) radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RadioConfig {
    pub enabled: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Complete terminal configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TerminalConfig {
    /// Layout version, checked when loading postcard data
    pub version: u8,
    pub panel: PanelConfig,
    pub wifi: WifiConfig,
    pub network: NetworkConfig,
    pub render: RenderConfig,
    pub watchdog: WatchdogConfig,
    pub storage: StorageConfig,
    pub time: TimeConfig,
    pub radio: RadioConfig,
}

impl TerminalConfig {
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            panel: PanelConfig::default(),
            wifi: WifiConfig::default(),
            network: NetworkConfig::default(),
            render: RenderConfig::default(),
            watchdog: WatchdogConfig::default(),
            storage: StorageConfig::default(),
            time: TimeConfig::default(),
            radio: RadioConfig::default(),
        }
    }

    /// Check ranges and cross-field constraints the parser cannot see
    ///
    /// Mirrors the build-time checks on `terminal.toml`, so a flash override
    /// is held to the same rules as the embedded default.
    pub fn validate(&self) -> Result<(), ConfigIssue> {
        let panel = &self.panel;
        if !(1..=MAX_PANEL_DIMENSION).contains(&panel.width)
            || !(1..=MAX_PANEL_DIMENSION).contains(&panel.height)
        {
            return Err(ConfigIssue::PanelSize);
        }
        if !(MIN_SPI_HZ..=MAX_SPI_HZ).contains(&panel.clock_hz) {
            return Err(ConfigIssue::PanelClock);
        }
        if !(1..=MAX_TICK_MS).contains(&self.render.tick_ms) {
            return Err(ConfigIssue::TickPeriod);
        }
        self.validate_watchdog()?;
        self.validate_network()?;
        if !(1..=MAX_FILES).contains(&self.storage.max_files) {
            return Err(ConfigIssue::MaxFiles);
        }
        let time = &self.time;
        if !(MIN_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&time.utc_offset_minutes)
            || !(MIN_RESYNC_S..=MAX_RESYNC_S).contains(&time.resync_s)
        {
            return Err(ConfigIssue::Time);
        }
        Ok(())
    }

    fn validate_watchdog(&self) -> Result<(), ConfigIssue> {
        let w = &self.watchdog;
        // Anything longer is silently clamped by the hardware
        if !(MIN_WATCHDOG_TIMEOUT_MS..=MAX_WATCHDOG_TIMEOUT_MS).contains(&w.timeout_ms) {
            return Err(ConfigIssue::WatchdogTimeout);
        }
        // The supervisor must get to feed the watchdog at least once per timeout
        if w.period_ms == 0 || w.period_ms >= w.timeout_ms {
            return Err(ConfigIssue::WatchdogPeriod);
        }
        if w.ui_timeout_ms < w.period_ms || w.best_effort_timeout_ms < w.ui_timeout_ms {
            return Err(ConfigIssue::LivenessTimeouts);
        }
        Ok(())
    }

    fn validate_network(&self) -> Result<(), ConfigIssue> {
        let n = &self.network;
        if !(MIN_CONNECT_TIMEOUT_MS..=MAX_CONNECT_TIMEOUT_MS).contains(&n.connect_timeout_ms) {
            return Err(ConfigIssue::ConnectTimeout);
        }
        if n.backoff_initial_ms == 0
            || n.backoff_max_ms > MAX_BACKOFF_MS
            || n.backoff_initial_ms > n.backoff_max_ms
        {
            return Err(ConfigIssue::Backoff);
        }
        if n.jitter_percent > 100 {
            return Err(ConfigIssue::Jitter);
        }
        Ok(())
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Semantically invalid configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigIssue {
    PanelSize,
    PanelClock,
    TickPeriod,
    WatchdogTimeout,
    WatchdogPeriod,
    /// UI or best-effort heartbeat timeout shorter than the class below it
    LivenessTimeouts,
    ConnectTimeout,
    Backoff,
    Jitter,
    MaxFiles,
    /// UTC offset or resync interval out of range
    Time,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = TerminalConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.panel.width, 320);
        assert_eq!(config.panel.height, 480);
        assert_eq!(config.panel.brightness, 128);
        assert_eq!(config.render.tick_ms, 16);
        assert_eq!(config.watchdog.timeout_ms, 5_000);
        assert_eq!(config.storage.max_files, 5);
        assert!(config.storage.format_if_mount_failed);
        assert_eq!(config.time.server.as_str(), "pool.ntp.org");
    }

    #[test]
    fn test_watchdog_period_must_beat_timeout() {
        let mut config = TerminalConfig::default();
        config.watchdog.period_ms = config.watchdog.timeout_ms;
        assert_eq!(config.validate(), Err(ConfigIssue::WatchdogPeriod));
    }

    #[test]
    fn test_backoff_bounds_checked() {
        let mut config = TerminalConfig::default();
        config.network.backoff_initial_ms = 60_000;
        assert_eq!(config.validate(), Err(ConfigIssue::Backoff));
    }

    #[test]
    fn test_watchdog_timeout_beyond_hardware_rejected() {
        let mut config = TerminalConfig::default();
        config.watchdog.timeout_ms = 20_000;
        config.watchdog.period_ms = 10_000;
        config.watchdog.ui_timeout_ms = 10_000;
        config.watchdog.best_effort_timeout_ms = 30_000;
        assert_eq!(config.validate(), Err(ConfigIssue::WatchdogTimeout));

        config.watchdog.timeout_ms = MAX_WATCHDOG_TIMEOUT_MS;
        config.watchdog.period_ms = 1_000;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_ui_timeout_shorter_than_period_rejected() {
        let mut config = TerminalConfig::default();
        config.watchdog.ui_timeout_ms = config.watchdog.period_ms - 1;
        assert_eq!(config.validate(), Err(ConfigIssue::LivenessTimeouts));

        let mut config = TerminalConfig::default();
        config.watchdog.best_effort_timeout_ms = config.watchdog.ui_timeout_ms - 1;
        assert_eq!(config.validate(), Err(ConfigIssue::LivenessTimeouts));
    }

    #[test]
    fn test_backoff_near_u32_max_rejected() {
        let mut config = TerminalConfig::default();
        config.network.backoff_initial_ms = 3_000_000_000;
        config.network.backoff_max_ms = u32::MAX;
        config.network.jitter_percent = 100;
        assert_eq!(config.validate(), Err(ConfigIssue::Backoff));
    }

    #[test]
    fn test_zero_initial_backoff_rejected() {
        let mut config = TerminalConfig::default();
        config.network.backoff_initial_ms = 0;
        assert_eq!(config.validate(), Err(ConfigIssue::Backoff));
    }

    #[test]
    fn test_jitter_over_100_percent_rejected() {
        let mut config = TerminalConfig::default();
        config.network.jitter_percent = 101;
        assert_eq!(config.validate(), Err(ConfigIssue::Jitter));

        config.network.jitter_percent = 100;
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_connect_timeout_range() {
        let mut config = TerminalConfig::default();
        config.network.connect_timeout_ms = 50;
        assert_eq!(config.validate(), Err(ConfigIssue::ConnectTimeout));
        config.network.connect_timeout_ms = MAX_CONNECT_TIMEOUT_MS + 1;
        assert_eq!(config.validate(), Err(ConfigIssue::ConnectTimeout));
    }

    #[test]
    fn test_time_ranges() {
        let mut config = TerminalConfig::default();
        config.time.resync_s = 10;
        assert_eq!(config.validate(), Err(ConfigIssue::Time));

        let mut config = TerminalConfig::default();
        config.time.utc_offset_minutes = 900;
        assert_eq!(config.validate(), Err(ConfigIssue::Time));
    }

    #[test]
    fn test_panel_and_render_ranges() {
        let mut config = TerminalConfig::default();
        config.panel.clock_hz = 80_000_000;
        assert_eq!(config.validate(), Err(ConfigIssue::PanelClock));

        let mut config = TerminalConfig::default();
        config.panel.width = 800;
        assert_eq!(config.validate(), Err(ConfigIssue::PanelSize));

        let mut config = TerminalConfig::default();
        config.render.tick_ms = 5_000;
        assert_eq!(config.validate(), Err(ConfigIssue::TickPeriod));

        let mut config = TerminalConfig::default();
        config.storage.max_files = 33;
        assert_eq!(config.validate(), Err(ConfigIssue::MaxFiles));
    }

    #[test]
    fn test_section_conversions() {
        let config = TerminalConfig::default();
        assert_eq!(config.network.backoff_policy(), BackoffPolicy::default());
        assert_eq!(config.watchdog.liveness_timeouts(), LivenessTimeouts::default());
        assert_eq!(config.storage.mount_options(), MountOptions::default());
    }
}
