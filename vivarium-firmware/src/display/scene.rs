//! Screen layout
//!
//! A black status bar across the top with the clock on the left and the
//! radio states on the right; the rest of the screen is plain background.
//! Everything is drawn in panel coordinates; the strip target keeps only
//! the rows it covers.

use embedded_graphics::mono_font::ascii::FONT_9X15;
use embedded_graphics::mono_font::MonoTextStyle;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

use vivarium_core::ui::{StatusBar, STATUS_BAR_HEIGHT};
use vivarium_drivers::StripTarget;

const BAR_COLOR: Rgb565 = Rgb565::BLACK;
const LABEL_COLOR: Rgb565 = Rgb565::WHITE;
const BACKGROUND: Rgb565 = Rgb565::new(28, 57, 28);

/// Horizontal inset of the clock label
const CLOCK_INSET: i32 = 5;
/// Right edge of the Wi-Fi label, measured from the panel edge
const WIFI_INSET: i32 = 80;
/// Right edge of the Bluetooth label, measured from the panel edge
const BT_INSET: i32 = 5;

/// Draw everything that overlaps the strip
pub fn draw(target: &mut StripTarget<'_>, status: &StatusBar) {
    let size = target.size();
    let width = size.width as i32;
    let bar_height = STATUS_BAR_HEIGHT as u32;

    let strip = target.area();
    if strip.y2 >= STATUS_BAR_HEIGHT {
        let body = Rectangle::new(
            Point::new(0, bar_height as i32),
            Size::new(size.width, size.height.saturating_sub(bar_height)),
        );
        fill(target, body, BACKGROUND);
    }
    if strip.y1 >= STATUS_BAR_HEIGHT {
        return;
    }

    let bar = Rectangle::new(Point::zero(), Size::new(size.width, bar_height));
    fill(target, bar, BAR_COLOR);

    let font = MonoTextStyle::new(&FONT_9X15, LABEL_COLOR);
    let mid = bar_height as i32 / 2;
    label(target, status.clock(), Point::new(CLOCK_INSET, mid), Alignment::Left, font);
    label(target, status.wifi(), Point::new(width - WIFI_INSET, mid), Alignment::Right, font);
    label(target, status.bt(), Point::new(width - BT_INSET, mid), Alignment::Right, font);
}

fn fill(target: &mut StripTarget<'_>, rect: Rectangle, color: Rgb565) {
    let _ = rect.into_styled(PrimitiveStyle::with_fill(color)).draw(target);
}

fn label(
    target: &mut StripTarget<'_>,
    text: &str,
    anchor: Point,
    alignment: Alignment,
    font: MonoTextStyle<'_, Rgb565>,
) {
    let style = TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Middle)
        .build();
    let _ = Text::with_text_style(text, anchor, font, style).draw(target);
}
