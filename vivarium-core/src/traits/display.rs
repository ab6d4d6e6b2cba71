//! Display transport trait for the directly-driven panel

use core::future::Future;

use crate::render::Area;

/// Physical pixel transport to the panel
///
/// Implementations own the bus, the control pins and the panel
/// configuration. Only the flush bridge talks to a transport once the
/// panel is up.
pub trait DisplayTransport {
    /// Error type for bus or pin failures
    type Error: core::fmt::Debug;

    /// Reset and configure the panel
    ///
    /// A failure here is a hardware init failure: the caller restarts the
    /// device rather than running with a dead screen.
    fn init(&mut self) -> impl Future<Output = Result<(), Self::Error>>;

    /// Transfer RGB565 big-endian pixels into `area`
    ///
    /// `pixels` holds exactly `area.byte_len()` bytes. The future resolves
    /// once every byte has left the bus.
    fn write(&mut self, area: Area, pixels: &[u8]) -> impl Future<Output = Result<(), Self::Error>>;

    /// Panel size in pixels as (width, height)
    fn dimensions(&self) -> (u16, u16);

    /// Set backlight level (0 = off, 255 = full)
    fn set_brightness(&mut self, level: u8) -> Result<(), Self::Error>;

    /// Whole-panel area
    fn bounds(&self) -> Area {
        let (width, height) = self.dimensions();
        Area::full(width, height)
    }
}
