//! ST7796 TFT panel driver
//!
//! Drives a 320x480 ST7796S controller over a 4-wire SPI bus: the SPI
//! device (with its chip select), a data/command line, a reset line and a
//! PWM backlight. Pixels are RGB565 big-endian, which is also the order the
//! controller expects on the wire, so flushed regions go out untouched.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::spi::SpiDevice;
use vivarium_core::config::PanelConfig;
use vivarium_core::render::Area;
use vivarium_core::traits::DisplayTransport;

/// ST7796 commands
#[allow(dead_code)]
pub(crate) mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVOFF: u8 = 0x20;
    pub const INVON: u8 = 0x21;
    pub const DISPOFF: u8 = 0x28;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    pub const DIC: u8 = 0xB4;
    pub const PWR2: u8 = 0xC1;
    pub const PWR3: u8 = 0xC2;
    pub const VCMPCTL: u8 = 0xC5;
    pub const PGC: u8 = 0xE0;
    pub const NGC: u8 = 0xE1;
    pub const DOCA: u8 = 0xE8;
    pub const CSCON: u8 = 0xF0;
}

/// MADCTL: column order flipped, BGR filter
const MADCTL_PORTRAIT: u8 = 0x48;
/// COLMOD: 16 bits per pixel on both interfaces
const COLMOD_RGB565: u8 = 0x55;

/// Reset pulse width
const RESET_PULSE_MS: u32 = 10;
/// Time the controller needs after a reset or sleep-out
const WAKE_DELAY_MS: u32 = 120;
/// Settle time after display on
const DISPLAY_ON_DELAY_MS: u32 = 20;

/// Configuration sent after sleep-out, as (command, parameters)
const INIT_SEQUENCE: &[(u8, &[u8])] = &[
    // Unlock command set 2
    (cmd::CSCON, &[0xC3]),
    (cmd::CSCON, &[0x96]),
    (cmd::MADCTL, &[MADCTL_PORTRAIT]),
    (cmd::COLMOD, &[COLMOD_RGB565]),
    // Column inversion
    (cmd::DIC, &[0x01]),
    (cmd::DOCA, &[0x40, 0x8A, 0x00, 0x00, 0x29, 0x19, 0xA5, 0x33]),
    (cmd::PWR2, &[0x06]),
    (cmd::PWR3, &[0xA7]),
    (cmd::VCMPCTL, &[0x18]),
    (
        cmd::PGC,
        &[0xF0, 0x09, 0x0B, 0x06, 0x04, 0x15, 0x2F, 0x54, 0x42, 0x3C, 0x17, 0x14, 0x18, 0x1B],
    ),
    (
        cmd::NGC,
        &[0xE0, 0x09, 0x0B, 0x06, 0x04, 0x03, 0x2B, 0x43, 0x42, 0x3B, 0x16, 0x14, 0x17, 0x1B],
    ),
    // Lock command set 2
    (cmd::CSCON, &[0x3C]),
    (cmd::CSCON, &[0x69]),
    (cmd::INVOFF, &[]),
    (cmd::NORON, &[]),
];

/// Panel errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError<E> {
    /// SPI bus error
    Spi(E),
    /// Data/command or reset line could not be driven
    Pin,
    /// Backlight PWM rejected the duty cycle
    Backlight,
    /// Pixel buffer does not match the area
    BufferSize,
    /// Area lies outside the panel
    OutOfBounds,
    /// `write` called before a successful `init`
    NotInitialized,
}

/// ST7796 panel on an SPI bus
pub struct St7796<SPI, DC, RST, BL, D> {
    spi: SPI,
    dc: DC,
    rst: RST,
    backlight: BL,
    delay: D,
    width: u16,
    height: u16,
    /// Reset asserted by driving the line low
    reset_active_low: bool,
    brightness: u8,
    initialized: bool,
}

impl<SPI, DC, RST, BL, D> St7796<SPI, DC, RST, BL, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BL: SetDutyCycle,
    D: DelayNs,
{
    /// Create a driver from the panel configuration
    ///
    /// Nothing is sent to the panel until [`DisplayTransport::init`].
    pub fn new(spi: SPI, dc: DC, rst: RST, backlight: BL, delay: D, config: &PanelConfig) -> Self {
        Self {
            spi,
            dc,
            rst,
            backlight,
            delay,
            width: config.width,
            height: config.height,
            reset_active_low: config.rst_pin.inverted,
            brightness: config.brightness,
            initialized: false,
        }
    }

    /// Whether `init` has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current backlight level
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, DC, RST, BL, D) {
        (self.spi, self.dc, self.rst, self.backlight, self.delay)
    }

    fn set_reset(&mut self, asserted: bool) -> Result<(), PanelError<SPI::Error>> {
        let high = asserted != self.reset_active_low;
        if high {
            self.rst.set_high().map_err(|_| PanelError::Pin)
        } else {
            self.rst.set_low().map_err(|_| PanelError::Pin)
        }
    }

    async fn hard_reset(&mut self) -> Result<(), PanelError<SPI::Error>> {
        self.set_reset(true)?;
        self.delay.delay_ms(RESET_PULSE_MS).await;
        self.set_reset(false)?;
        self.delay.delay_ms(WAKE_DELAY_MS).await;
        Ok(())
    }

    /// Send a command byte followed by its parameters
    async fn command(&mut self, command: u8, params: &[u8]) -> Result<(), PanelError<SPI::Error>> {
        self.dc.set_low().map_err(|_| PanelError::Pin)?;
        self.spi.write(&[command]).await.map_err(PanelError::Spi)?;
        if !params.is_empty() {
            self.dc.set_high().map_err(|_| PanelError::Pin)?;
            self.spi.write(params).await.map_err(PanelError::Spi)?;
        }
        Ok(())
    }

    /// Set the RAM window for the next pixel write
    async fn set_window(&mut self, area: Area) -> Result<(), PanelError<SPI::Error>> {
        let [x1h, x1l] = area.x1.to_be_bytes();
        let [x2h, x2l] = area.x2.to_be_bytes();
        self.command(cmd::CASET, &[x1h, x1l, x2h, x2l]).await?;

        let [y1h, y1l] = area.y1.to_be_bytes();
        let [y2h, y2l] = area.y2.to_be_bytes();
        self.command(cmd::RASET, &[y1h, y1l, y2h, y2l]).await
    }

    fn apply_brightness(&mut self, level: u8) -> Result<(), PanelError<SPI::Error>> {
        self.backlight
            .set_duty_cycle_fraction(level as u16, u8::MAX as u16)
            .map_err(|_| PanelError::Backlight)?;
        self.brightness = level;
        Ok(())
    }
}

impl<SPI, DC, RST, BL, D> DisplayTransport for St7796<SPI, DC, RST, BL, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BL: SetDutyCycle,
    D: DelayNs,
{
    type Error = PanelError<SPI::Error>;

    async fn init(&mut self) -> Result<(), Self::Error> {
        self.initialized = false;
        // Backlight off while the controller shows garbage
        self.backlight
            .set_duty_cycle_fully_off()
            .map_err(|_| PanelError::Backlight)?;

        self.hard_reset().await?;
        self.command(cmd::SWRESET, &[]).await?;
        self.delay.delay_ms(WAKE_DELAY_MS).await;
        self.command(cmd::SLPOUT, &[]).await?;
        self.delay.delay_ms(WAKE_DELAY_MS).await;

        for (command, params) in INIT_SEQUENCE {
            self.command(*command, params).await?;
        }

        self.command(cmd::DISPON, &[]).await?;
        self.delay.delay_ms(DISPLAY_ON_DELAY_MS).await;

        let level = self.brightness;
        self.apply_brightness(level)?;
        self.initialized = true;
        Ok(())
    }

    async fn write(&mut self, area: Area, pixels: &[u8]) -> Result<(), Self::Error> {
        if !self.initialized {
            return Err(PanelError::NotInitialized);
        }
        if !self.bounds().contains(&area) {
            return Err(PanelError::OutOfBounds);
        }
        if pixels.len() != area.byte_len() {
            return Err(PanelError::BufferSize);
        }

        self.set_window(area).await?;
        self.command(cmd::RAMWR, pixels).await
    }

    fn dimensions(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), Self::Error> {
        self.apply_brightness(level)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::{Cell, RefCell};
    use core::convert::Infallible;
    use embassy_futures::block_on;
    use embedded_hal_async::spi::Operation;
    use heapless::Vec;

    /// One bus write as seen by the controller
    #[derive(Debug, Clone, PartialEq)]
    enum Frame {
        Command(u8),
        /// First bytes of a data write and its full length
        Data(Vec<u8, 8>, usize),
    }

    struct Bus<'a> {
        dc_high: &'a Cell<bool>,
        frames: &'a RefCell<Vec<Frame, 128>>,
    }

    impl embedded_hal_async::spi::ErrorType for Bus<'_> {
        type Error = Infallible;
    }

    impl SpiDevice for Bus<'_> {
        async fn transaction(
            &mut self,
            operations: &mut [Operation<'_, u8>],
        ) -> Result<(), Infallible> {
            for op in operations {
                if let Operation::Write(bytes) = op {
                    let frame = if self.dc_high.get() {
                        let head = Vec::from_slice(&bytes[..bytes.len().min(8)]).unwrap();
                        Frame::Data(head, bytes.len())
                    } else {
                        assert_eq!(bytes.len(), 1);
                        Frame::Command(bytes[0])
                    };
                    self.frames.borrow_mut().push(frame).unwrap();
                }
            }
            Ok(())
        }
    }

    struct Line<'a> {
        high: &'a Cell<bool>,
        history: Option<&'a RefCell<Vec<bool, 8>>>,
    }

    impl embedded_hal::digital::ErrorType for Line<'_> {
        type Error = Infallible;
    }

    impl OutputPin for Line<'_> {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high.set(false);
            if let Some(h) = self.history {
                h.borrow_mut().push(false).unwrap();
            }
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high.set(true);
            if let Some(h) = self.history {
                h.borrow_mut().push(true).unwrap();
            }
            Ok(())
        }
    }

    struct Backlight<'a> {
        duty: &'a Cell<u16>,
    }

    impl embedded_hal::pwm::ErrorType for Backlight<'_> {
        type Error = Infallible;
    }

    impl SetDutyCycle for Backlight<'_> {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Infallible> {
            self.duty.set(duty);
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    struct Rig {
        dc: Cell<bool>,
        rst: Cell<bool>,
        rst_history: RefCell<Vec<bool, 8>>,
        duty: Cell<u16>,
        frames: RefCell<Vec<Frame, 128>>,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                dc: Cell::new(false),
                rst: Cell::new(true),
                rst_history: RefCell::new(Vec::new()),
                duty: Cell::new(0),
                frames: RefCell::new(Vec::new()),
            }
        }

        fn panel(&self) -> St7796<Bus<'_>, Line<'_>, Line<'_>, Backlight<'_>, NoDelay> {
            St7796::new(
                Bus {
                    dc_high: &self.dc,
                    frames: &self.frames,
                },
                Line {
                    high: &self.dc,
                    history: None,
                },
                Line {
                    high: &self.rst,
                    history: Some(&self.rst_history),
                },
                Backlight { duty: &self.duty },
                NoDelay,
                &PanelConfig::default(),
            )
        }

        fn commands(&self) -> std::vec::Vec<u8> {
            self.frames
                .borrow()
                .iter()
                .filter_map(|f| match f {
                    Frame::Command(c) => Some(*c),
                    Frame::Data(..) => None,
                })
                .collect()
        }
    }

    #[test]
    fn test_init_sequence_order() {
        let rig = Rig::new();
        let mut panel = rig.panel();

        block_on(panel.init()).unwrap();

        let commands = rig.commands();
        assert_eq!(commands[0], cmd::SWRESET);
        assert_eq!(commands[1], cmd::SLPOUT);
        assert_eq!(*commands.last().unwrap(), cmd::DISPON);
        assert!(commands.contains(&cmd::COLMOD));
        assert!(panel.is_initialized());
    }

    #[test]
    fn test_reset_pulse_is_active_low() {
        let rig = Rig::new();
        let mut panel = rig.panel();

        block_on(panel.init()).unwrap();

        // Asserted (low) then released (high)
        assert_eq!(rig.rst_history.borrow().as_slice(), &[false, true]);
    }

    #[test]
    fn test_backlight_applied_after_init() {
        let rig = Rig::new();
        let mut panel = rig.panel();

        block_on(panel.init()).unwrap();

        // 128/255 of a 1000-step counter
        assert_eq!(rig.duty.get(), 501);
        panel.set_brightness(0).unwrap();
        assert_eq!(rig.duty.get(), 0);
        assert_eq!(panel.brightness(), 0);
    }

    #[test]
    fn test_write_sets_window_then_streams_pixels() {
        let rig = Rig::new();
        let mut panel = rig.panel();
        block_on(panel.init()).unwrap();
        rig.frames.borrow_mut().clear();

        let area = Area::new(0x100, 2, 0x101, 3);
        let pixels = [0x12u8; 8];
        block_on(panel.write(area, &pixels)).unwrap();

        let frames = rig.frames.borrow();
        assert_eq!(frames[0], Frame::Command(cmd::CASET));
        assert_eq!(
            frames[1],
            Frame::Data(Vec::from_slice(&[0x01, 0x00, 0x01, 0x01]).unwrap(), 4)
        );
        assert_eq!(frames[2], Frame::Command(cmd::RASET));
        assert_eq!(
            frames[3],
            Frame::Data(Vec::from_slice(&[0x00, 0x02, 0x00, 0x03]).unwrap(), 4)
        );
        assert_eq!(frames[4], Frame::Command(cmd::RAMWR));
        assert_eq!(frames[5], Frame::Data(Vec::from_slice(&pixels).unwrap(), 8));
    }

    #[test]
    fn test_write_rejects_bad_input() {
        let rig = Rig::new();
        let mut panel = rig.panel();

        let area = Area::new(0, 0, 0, 0);
        assert_eq!(
            block_on(panel.write(area, &[0, 0])),
            Err(PanelError::NotInitialized)
        );

        block_on(panel.init()).unwrap();
        assert_eq!(
            block_on(panel.write(area, &[0, 0, 0])),
            Err(PanelError::BufferSize)
        );
        assert_eq!(
            block_on(panel.write(Area::new(0, 0, 0, 480), &[0; 962])),
            Err(PanelError::OutOfBounds)
        );
    }

    #[test]
    fn test_dimensions_from_config() {
        let rig = Rig::new();
        let panel = rig.panel();
        assert_eq!(panel.dimensions(), (320, 480));
        assert_eq!(panel.bounds(), Area::new(0, 0, 319, 479));
    }
}
