//! Strip framebuffer for partial redraws
//!
//! The panel is too large for a full RGB565 framebuffer in RP2040 RAM, so
//! the UI is drawn one band at a time. A [`StripTarget`] accepts drawing in
//! whole-panel coordinates and keeps only the pixels inside its area,
//! packed row-major as big-endian RGB565, ready for
//! [`DisplayTransport::write`](vivarium_core::traits::DisplayTransport::write).

use core::convert::Infallible;

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use vivarium_core::render::Area;

/// Draw target covering one area of the panel
pub struct StripTarget<'a> {
    buffer: &'a mut [u8],
    area: Area,
    panel: Size,
}

/// Strip errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StripError {
    /// Buffer too small for the area
    BufferTooSmall,
}

impl<'a> StripTarget<'a> {
    /// Wrap `buffer` for drawing `area` of a `width` x `height` panel
    pub fn new(buffer: &'a mut [u8], area: Area, width: u16, height: u16) -> Result<Self, StripError> {
        if buffer.len() < area.byte_len() {
            return Err(StripError::BufferTooSmall);
        }
        Ok(Self {
            buffer,
            area,
            panel: Size::new(width as u32, height as u32),
        })
    }

    pub fn area(&self) -> Area {
        self.area
    }

    /// Pixels of the area, exactly `area.byte_len()` bytes
    pub fn pixels(&self) -> &[u8] {
        &self.buffer[..self.area.byte_len()]
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let a = &self.area;
        if x < a.x1 as i32 || x > a.x2 as i32 || y < a.y1 as i32 || y > a.y2 as i32 {
            return None;
        }
        let row = (y - a.y1 as i32) as usize;
        let col = (x - a.x1 as i32) as usize;
        Some((row * a.width() as usize + col) * 2)
    }

    fn put(&mut self, offset: usize, color: Rgb565) {
        let raw: u16 = RawU16::from(color).into_inner();
        let [hi, lo] = raw.to_be_bytes();
        self.buffer[offset] = hi;
        self.buffer[offset + 1] = lo;
    }

    fn clip(&self, rect: &Rectangle) -> Option<Area> {
        let bottom_right = rect.bottom_right()?;
        if bottom_right.x < 0 || bottom_right.y < 0 {
            return None;
        }
        let clamp = |v: i32| v.clamp(0, u16::MAX as i32) as u16;
        Area::new(
            clamp(rect.top_left.x),
            clamp(rect.top_left.y),
            clamp(bottom_right.x),
            clamp(bottom_right.y),
        )
        .clip(&self.area)
    }
}

impl OriginDimensions for StripTarget<'_> {
    fn size(&self) -> Size {
        self.panel
    }
}

impl DrawTarget for StripTarget<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(offset) = self.index(point.x, point.y) {
                self.put(offset, color);
            }
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let Some(clipped) = self.clip(area) else {
            return Ok(());
        };
        let [hi, lo] = RawU16::from(color).into_inner().to_be_bytes();
        for y in clipped.y1..=clipped.y2 {
            let start = self.index(clipped.x1 as i32, y as i32);
            let end = self.index(clipped.x2 as i32, y as i32);
            if let (Some(start), Some(end)) = (start, end) {
                for pair in self.buffer[start..end + 2].chunks_exact_mut(2) {
                    pair[0] = hi;
                    pair[1] = lo;
                }
            }
        }
        Ok(())
    }
}
