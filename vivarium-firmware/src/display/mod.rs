//! Panel wiring and screen contents

pub mod scene;

use defmt::*;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::peripherals::{DMA_CH0, PIN_17, PIN_18, PIN_19, PIN_22, PWM_SLICE3, SPI0};
use embassy_rp::pwm::{self, Pwm, PwmOutput};
use embassy_rp::spi::{self, Async, Spi};
use embassy_rp::Peri;
use embassy_time::Delay;
use embedded_hal_bus::spi::ExclusiveDevice;
use vivarium_core::config::PanelConfig;
use vivarium_drivers::St7796;
use vivarium_hal_rp2040::PinBank;

/// Panel SPI device: SPI0 with its own chip select
pub type PanelSpi = ExclusiveDevice<Spi<'static, SPI0, Async>, Output<'static>, Delay>;

/// The concrete panel driver on this board
pub type Panel = St7796<PanelSpi, Output<'static>, Output<'static>, PwmOutput<'static>, Delay>;

/// Fixed panel wiring; DC and reset come from the configuration
pub struct PanelHardware {
    pub spi: Peri<'static, SPI0>,
    pub sck: Peri<'static, PIN_18>,
    pub mosi: Peri<'static, PIN_19>,
    pub cs: Peri<'static, PIN_17>,
    pub dma: Peri<'static, DMA_CH0>,
    pub pwm: Peri<'static, PWM_SLICE3>,
    pub backlight: Peri<'static, PIN_22>,
}

/// Wire up the panel driver; `None` if a configured pin is unusable
pub fn build_panel(hw: PanelHardware, pins: &mut PinBank, config: &PanelConfig) -> Option<Panel> {
    let dc = pins
        .take(config.dc_pin.pin)
        .map_err(|e| error!("Panel DC pin gpio{}: {}", config.dc_pin.pin, e))
        .ok()?;
    let rst = pins
        .take(config.rst_pin.pin)
        .map_err(|e| error!("Panel reset pin gpio{}: {}", config.rst_pin.pin, e))
        .ok()?;

    if !config.dma {
        warn!("panel.dma = false ignored, pixel transfers always use DMA");
    }

    let mut spi_config = spi::Config::default();
    spi_config.frequency = config.clock_hz;
    let bus = Spi::new_txonly(hw.spi, hw.sck, hw.mosi, hw.dma, spi_config);
    let device = ExclusiveDevice::new(bus, Output::new(hw.cs, Level::High), Delay).ok()?;

    let backlight = Pwm::new_output_a(hw.pwm, hw.backlight, pwm::Config::default())
        .split()
        .0?;

    // Reset idles released
    let rst_idle = if config.rst_pin.inverted {
        Level::High
    } else {
        Level::Low
    };

    Some(St7796::new(
        device,
        Output::new(dc, Level::Low),
        Output::new(rst, rst_idle),
        backlight,
        Delay,
        config,
    ))
}
