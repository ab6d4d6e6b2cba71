//! CYW43439 firmware images and the Bluetooth side of the chip
//!
//! The Wi-Fi, CLM and Bluetooth blobs are flashed separately to fixed
//! addresses above the program image (see memory.x) instead of being
//! linked in, which keeps the firmware image small and flashing fast.

use portable_atomic::Ordering;
use vivarium_core::traits::{AuxRadio, RadioError};

use crate::channels::BT_ENABLED;

/// Fixed flash locations of the radio blobs
pub mod firmware {
    const WIFI_FW_ADDR: usize = 0x1010_0000;
    const WIFI_FW_LEN: usize = 230_321;
    const CLM_ADDR: usize = 0x1014_0000;
    const CLM_LEN: usize = 4_752;
    const BT_FW_ADDR: usize = 0x1014_2000;
    const BT_FW_LEN: usize = 6_164;

    /// Wi-Fi firmware (43439A0.bin)
    pub fn wifi() -> &'static [u8] {
        // SAFETY: XIP flash is mapped read-only for the whole program run
        // and memory.x keeps the linker out of this range.
        unsafe { core::slice::from_raw_parts(WIFI_FW_ADDR as *const u8, WIFI_FW_LEN) }
    }

    /// Country locale matrix (43439A0_clm.bin)
    pub fn clm() -> &'static [u8] {
        // SAFETY: as above
        unsafe { core::slice::from_raw_parts(CLM_ADDR as *const u8, CLM_LEN) }
    }

    /// Bluetooth firmware (43439A0_btfw.bin)
    pub fn bluetooth() -> &'static [u8] {
        // SAFETY: as above
        unsafe { core::slice::from_raw_parts(BT_FW_ADDR as *const u8, BT_FW_LEN) }
    }
}

/// Bluetooth controller of the CYW43439
///
/// The controller is up once its firmware has been loaded together with
/// the Wi-Fi firmware; enabling it only confirms that and publishes the
/// state for the status bar.
pub struct Cyw43Bluetooth {
    driver: Option<cyw43::bluetooth::BtDriver<'static>>,
    configured: bool,
    enabled: bool,
}

impl Cyw43Bluetooth {
    /// Radio that was never brought up
    pub const fn absent(configured: bool) -> Self {
        Self {
            driver: None,
            configured,
            enabled: false,
        }
    }

    /// Radio whose firmware load produced `driver`
    pub fn new(driver: Option<cyw43::bluetooth::BtDriver<'static>>, configured: bool) -> Self {
        Self {
            driver,
            configured,
            enabled: false,
        }
    }
}

impl AuxRadio for Cyw43Bluetooth {
    async fn enable(&mut self) -> Result<(), RadioError> {
        if !self.configured {
            return Err(RadioError::Disabled);
        }
        if self.driver.is_none() {
            return Err(RadioError::ControllerFault);
        }
        self.enabled = true;
        BT_ENABLED.store(true, Ordering::Release);
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
