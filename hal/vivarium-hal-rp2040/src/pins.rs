//! Pin allocation for config-driven hardware setup
//!
//! The panel's data/command and reset lines come from the config file, so
//! they are taken from the bank by number at runtime. Pins wired to a fixed
//! function on the Pico W (the SPI bus, the backlight PWM and the CYW43
//! radio) never enter the bank and are handed out typed instead.

use embassy_rp::gpio::AnyPin;
use embassy_rp::peripherals;
use embassy_rp::Peri;
use embassy_rp::Peripherals;

/// Number of GPIOs on the RP2040
pub const PIN_COUNT: usize = 30;

/// SPI0 chip select
pub const PANEL_CS_PIN: u8 = 17;
/// SPI0 clock
pub const PANEL_SCK_PIN: u8 = 18;
/// SPI0 MOSI
pub const PANEL_MOSI_PIN: u8 = 19;
/// Backlight on PWM slice 3 channel A
pub const BACKLIGHT_PIN: u8 = 22;
/// CYW43 power enable
pub const RADIO_PWR_PIN: u8 = 23;
/// CYW43 data line
pub const RADIO_DIO_PIN: u8 = 24;
/// CYW43 chip select
pub const RADIO_CS_PIN: u8 = 25;
/// CYW43 clock
pub const RADIO_CLK_PIN: u8 = 29;

/// Pins with a fixed board function
pub const RESERVED_PINS: [u8; 8] = [
    PANEL_CS_PIN,
    PANEL_SCK_PIN,
    PANEL_MOSI_PIN,
    BACKLIGHT_PIN,
    RADIO_PWR_PIN,
    RADIO_DIO_PIN,
    RADIO_CS_PIN,
    RADIO_CLK_PIN,
];

/// Error when requesting a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already taken
    AlreadyTaken,
    /// Pin reserved for special function
    Reserved,
}

/// Whether a pin number is wired to a fixed function
pub fn is_reserved(pin_num: u8) -> bool {
    RESERVED_PINS.contains(&pin_num)
}

/// Pin bank holding every general-purpose GPIO
///
/// Config-driven pins are taken by number from here.
pub struct PinBank {
    pins: [Option<Peri<'static, AnyPin>>; PIN_COUNT],
}

impl PinBank {
    /// Split the chip peripherals into the pin bank and the rest
    pub fn from_peripherals(p: Peripherals) -> (Self, BoardPeripherals) {
        let bank = Self {
            pins: [
                Some(p.PIN_0.into()),
                Some(p.PIN_1.into()),
                Some(p.PIN_2.into()),
                Some(p.PIN_3.into()),
                Some(p.PIN_4.into()),
                Some(p.PIN_5.into()),
                Some(p.PIN_6.into()),
                Some(p.PIN_7.into()),
                Some(p.PIN_8.into()),
                Some(p.PIN_9.into()),
                Some(p.PIN_10.into()),
                Some(p.PIN_11.into()),
                Some(p.PIN_12.into()),
                Some(p.PIN_13.into()),
                Some(p.PIN_14.into()),
                Some(p.PIN_15.into()),
                Some(p.PIN_16.into()),
                None,
                None,
                None,
                Some(p.PIN_20.into()),
                Some(p.PIN_21.into()),
                None,
                None,
                None,
                None,
                Some(p.PIN_26.into()),
                Some(p.PIN_27.into()),
                Some(p.PIN_28.into()),
                None,
            ],
        };
        let board = BoardPeripherals {
            flash: p.FLASH,
            watchdog: p.WATCHDOG,
            pio0: p.PIO0,
            spi0: p.SPI0,
            pwm_backlight: p.PWM_SLICE3,
            dma_ch0: p.DMA_CH0,
            dma_ch1: p.DMA_CH1,
            dma_ch2: p.DMA_CH2,
            panel_cs: p.PIN_17,
            panel_sck: p.PIN_18,
            panel_mosi: p.PIN_19,
            backlight: p.PIN_22,
            radio_pwr: p.PIN_23,
            radio_dio: p.PIN_24,
            radio_cs: p.PIN_25,
            radio_clk: p.PIN_29,
        };
        (bank, board)
    }

    /// Take a pin by number
    ///
    /// Returns the pin if available, or an error if:
    /// - Pin number is invalid (>= 30)
    /// - Pin has a fixed board function
    /// - Pin was already taken
    pub fn take(&mut self, pin_num: u8) -> Result<Peri<'static, AnyPin>, PinError> {
        if pin_num as usize >= PIN_COUNT {
            return Err(PinError::InvalidPin);
        }
        if is_reserved(pin_num) {
            return Err(PinError::Reserved);
        }
        self.pins[pin_num as usize]
            .take()
            .ok_or(PinError::AlreadyTaken)
    }

    /// Check if a pin is available
    pub fn is_available(&self, pin_num: u8) -> bool {
        if pin_num as usize >= PIN_COUNT {
            return false;
        }
        self.pins[pin_num as usize].is_some()
    }

    /// Return a pin to the bank
    pub fn return_pin(&mut self, pin_num: u8, pin: Peri<'static, AnyPin>) {
        if (pin_num as usize) < PIN_COUNT && !is_reserved(pin_num) {
            self.pins[pin_num as usize] = Some(pin);
        }
    }
}

/// Peripherals and fixed-function pins left after creating the bank
pub struct BoardPeripherals {
    pub flash: Peri<'static, peripherals::FLASH>,
    pub watchdog: Peri<'static, peripherals::WATCHDOG>,
    pub pio0: Peri<'static, peripherals::PIO0>,
    pub spi0: Peri<'static, peripherals::SPI0>,
    pub pwm_backlight: Peri<'static, peripherals::PWM_SLICE3>,
    /// Panel SPI TX
    pub dma_ch0: Peri<'static, peripherals::DMA_CH0>,
    /// CYW43 PIO SPI
    pub dma_ch1: Peri<'static, peripherals::DMA_CH1>,
    /// Flash
    pub dma_ch2: Peri<'static, peripherals::DMA_CH2>,
    pub panel_cs: Peri<'static, peripherals::PIN_17>,
    pub panel_sck: Peri<'static, peripherals::PIN_18>,
    pub panel_mosi: Peri<'static, peripherals::PIN_19>,
    pub backlight: Peri<'static, peripherals::PIN_22>,
    pub radio_pwr: Peri<'static, peripherals::PIN_23>,
    pub radio_dio: Peri<'static, peripherals::PIN_24>,
    pub radio_cs: Peri<'static, peripherals::PIN_25>,
    pub radio_clk: Peri<'static, peripherals::PIN_29>,
}
