//! Status bar model
//!
//! Three labels across the top of the screen: local date and time, Wi-Fi
//! state and Bluetooth state. The model only tracks text; drawing happens in
//! the firmware. `update` reports whether anything changed so the strip is
//! invalidated at most once a minute in steady state.

use heapless::String;

use crate::render::Area;
use crate::time::{DateTime, DATE_TIME_LEN};

/// Shown until the first time sync
pub const LOADING_TEXT: &str = "Chargement...";

pub const WIFI_ON: &str = "WiFi ON";
pub const WIFI_OFF: &str = "WiFi OFF";
pub const BT_ON: &str = "BT ON";
pub const BT_OFF: &str = "BT OFF";

/// Status bar height in pixels
pub const STATUS_BAR_HEIGHT: u16 = 24;

/// Refresh period of the status task
pub const STATUS_REFRESH_MS: u32 = 1_000;

/// Inputs sampled once per refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusInputs {
    pub time: Option<DateTime>,
    pub wifi_connected: bool,
    pub bt_enabled: bool,
}

/// Current label texts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBar {
    /// Empty until the first time sync
    clock: String<DATE_TIME_LEN>,
    wifi: &'static str,
    bt: &'static str,
}

impl StatusBar {
    pub const fn new() -> Self {
        Self {
            clock: String::new(),
            wifi: WIFI_OFF,
            bt: BT_OFF,
        }
    }

    /// Apply fresh inputs; returns `true` if any label changed
    pub fn update(&mut self, inputs: &StatusInputs) -> bool {
        let clock = match inputs.time {
            Some(time) => time.format(),
            None => String::new(),
        };
        let wifi = if inputs.wifi_connected { WIFI_ON } else { WIFI_OFF };
        let bt = if inputs.bt_enabled { BT_ON } else { BT_OFF };

        let changed = clock != self.clock || wifi != self.wifi || bt != self.bt;
        self.clock = clock;
        self.wifi = wifi;
        self.bt = bt;
        changed
    }

    pub fn clock(&self) -> &str {
        if self.clock.is_empty() {
            LOADING_TEXT
        } else {
            self.clock.as_str()
        }
    }

    pub fn wifi(&self) -> &'static str {
        self.wifi
    }

    pub fn bt(&self) -> &'static str {
        self.bt
    }

    /// Screen area covered by the bar on a panel `width` pixels wide
    pub const fn area(width: u16) -> Area {
        Area::rows(width, 0, STATUS_BAR_HEIGHT - 1)
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self::new()
    }
}
