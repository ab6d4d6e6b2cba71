//! Runner tasks for the radio driver and the IP stack

use cyw43_pio::PioSpi;
use embassy_rp::gpio::Output;
use embassy_rp::peripherals::{DMA_CH1, PIO0};

/// SPI link to the CYW43439 over PIO0
pub type RadioSpi = PioSpi<'static, PIO0, 0, DMA_CH1>;

#[embassy_executor::task]
pub async fn cyw43_task(runner: cyw43::Runner<'static, Output<'static>, RadioSpi>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
pub async fn net_task(mut runner: embassy_net::Runner<'static, cyw43::NetDriver<'static>>) -> ! {
    runner.run().await
}
