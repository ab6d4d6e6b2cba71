//! Vivarium - Status Terminal Firmware
//!
//! Firmware for a Raspberry Pi Pico W driving a 320x480 ST7796 panel. Brings
//! the subsystems up in a fixed order, then renders the status screen on a
//! high-priority executor while Wi-Fi, status and time tasks run in thread
//! mode and a liveness loop gates the hardware watchdog.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::{InterruptHandler as PioInterruptHandler, Pio};
use embassy_time::{Duration, Instant, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cyw43_pio::{PioSpi, DEFAULT_CLOCK_DIVIDER};
use vivarium_core::boot::{BootOutcome, InitSequencer, Subsystem};
use vivarium_core::config::TerminalConfig;
use vivarium_core::fault::{RestartCause, RestartRecord};
use vivarium_core::safety::{LivenessSupervisor, Verdict};
use vivarium_core::traits::DisplayTransport;
use vivarium_drivers::FlashVolume;
use vivarium_hal::{HardwareWatchdog, RESTART_RECORD_SCRATCH};
use vivarium_hal_rp2040::{PinBank, Rp2040FlashStorage, Rp2040Watchdog};

use crate::channels::{
    uptime_ms, FATAL, FLUSH_TOKEN, RENDER_TOKEN, STATUS_TOKEN, TIME_TOKEN, WIFI_TOKEN,
};
use crate::config::ConfigPersistence;
use crate::display::PanelHardware;
use crate::platform::{Platform, RadioHardware};

mod channels;
mod config;
mod display;
mod platform;
mod radio;
mod tasks;

/// Embedded default configuration (compiled into firmware)
/// Edit terminal.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../terminal.toml");

/// Uptime after which the previous restart record is cleared
const HEALTHY_RUN_MS: u64 = 60_000;

/// Supervised tasks
const MAX_SUPERVISED: usize = 5;

bind_interrupts!(struct Irqs {
    PIO0_IRQ_0 => PioInterruptHandler<PIO0>;
});

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

// Must live forever for task references
static CONFIG: StaticCell<TerminalConfig> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Vivarium terminal starting...");

    let p = embassy_rp::init(Default::default());
    let (mut pins, board) = PinBank::from_peripherals(p);
    info!("Peripherals initialized");

    let mut watchdog = Rp2040Watchdog::new(board.watchdog);
    let previous = RestartRecord::decode(watchdog.scratch(RESTART_RECORD_SCRATCH));
    match previous {
        Some(record) => warn!(
            "Restarted after {} ({} in a row)",
            record.cause, record.count
        ),
        None if watchdog.reset_by_watchdog() => warn!("Watchdog reset without a restart record"),
        None => info!("Power-on boot"),
    }

    let mut flash = Rp2040FlashStorage::new(board.flash, board.dma_ch2);
    let seed = board_seed(&mut flash);
    let mut persistence = ConfigPersistence::new(flash);
    let (config, source) = persistence.load_or_default(EMBEDDED_CONFIG).await;
    info!("Configuration source: {}", source);
    let config: &'static TerminalConfig = CONFIG.init(config);

    let panel = display::build_panel(
        PanelHardware {
            spi: board.spi0,
            sck: board.panel_sck,
            mosi: board.panel_mosi,
            cs: board.panel_cs,
            dma: board.dma_ch0,
            pwm: board.pwm_backlight,
            backlight: board.backlight,
        },
        &mut pins,
        &config.panel,
    );

    let mut pio = Pio::new(board.pio0, Irqs);
    let radio = RadioHardware {
        pwr: Output::new(board.radio_pwr, Level::Low),
        spi: PioSpi::new(
            &mut pio.common,
            pio.sm0,
            DEFAULT_CLOCK_DIVIDER,
            pio.irq0,
            Output::new(board.radio_cs, Level::High),
            board.radio_dio,
            board.radio_clk,
            board.dma_ch1,
        ),
    };

    let volume = FlashVolume::new(persistence.into_storage());
    let mut platform = Platform::new(spawner, config, panel, volume, radio, seed);

    let mut sequencer = InitSequencer::new();
    let outcome = sequencer.run(&mut platform).await;
    for subsystem in Subsystem::ALL {
        if let Some(status) = outcome.report().status(subsystem) {
            info!("  {}: {}", subsystem.name(), status);
        }
    }

    let panel = match (outcome, platform.take_panel()) {
        (BootOutcome::Completed(_), Some(panel)) => panel,
        (outcome, _) => {
            if let BootOutcome::Restart { failed, .. } = outcome {
                error!("Bring-up of {} failed", failed.name());
            }
            restart(&mut watchdog, previous, RestartCause::DisplayInit);
            return;
        }
    };
    let bounds = panel.bounds();

    // Render pipeline on the high-priority executor
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    high.spawn(unwrap!(tasks::tick_task(config.render.tick_ms)));
    high.spawn(unwrap!(tasks::flush_task(panel)));
    high.spawn(unwrap!(tasks::render_task(bounds)));

    spawner.spawn(unwrap!(tasks::status_task(
        bounds.width(),
        config.time.utc_offset_minutes
    )));
    info!("All tasks spawned, terminal running");

    let mut supervisor: LivenessSupervisor<'static, MAX_SUPERVISED> =
        LivenessSupervisor::new(config.watchdog.liveness_timeouts());
    let supervised = [
        Some(&RENDER_TOKEN),
        Some(&FLUSH_TOKEN),
        Some(&STATUS_TOKEN),
        platform.network_started().then_some(&WIFI_TOKEN),
        platform.time_sync_started().then_some(&TIME_TOKEN),
    ];
    for token in supervised.into_iter().flatten() {
        if supervisor.register(token, uptime_ms()).is_err() {
            warn!("No room to supervise {}", token.name());
        }
    }

    watchdog.start(config.watchdog.timeout_ms);
    info!(
        "Watchdog armed ({} ms), {} tasks supervised",
        config.watchdog.timeout_ms,
        supervisor.len()
    );

    let mut ticker = Ticker::every(Duration::from_millis(config.watchdog.period_ms as u64));
    let mut record_cleared = previous.is_none();
    let mut resetting = false;

    loop {
        if let Either::Second(cause) = select(ticker.next(), FATAL.wait()).await {
            if !resetting {
                resetting = true;
                restart(&mut watchdog, previous, cause);
            }
            continue;
        }

        match supervisor.check(uptime_ms()) {
            Verdict::Healthy if !resetting => watchdog.feed(),
            Verdict::Healthy | Verdict::AlreadyEscalated => {}
            Verdict::Escalate(stall) => {
                error!(
                    "Task {} silent for {} ms ({})",
                    stall.task, stall.silent_ms, stall.class
                );
                resetting = true;
                restart(&mut watchdog, previous, RestartCause::LivenessTimeout);
            }
        }

        if !record_cleared && !resetting && Instant::now().as_millis() >= HEALTHY_RUN_MS {
            watchdog.set_scratch(RESTART_RECORD_SCRATCH, 0);
            record_cleared = true;
            info!("Healthy run, restart record cleared");
        }
    }
}

/// Leave a restart record behind and reset the chip
fn restart(watchdog: &mut Rp2040Watchdog, previous: Option<RestartRecord>, cause: RestartCause) {
    let record = RestartRecord::next(previous, cause);
    error!("Restarting: {} ({} in a row)", cause, record.count);
    watchdog.set_scratch(RESTART_RECORD_SCRATCH, record.encode());
    watchdog.trigger_reset();
}

/// Per-board seed for reconnect jitter and the IP stack
fn board_seed(flash: &mut Rp2040FlashStorage<'static>) -> u32 {
    let uid = flash.unique_id().unwrap_or_else(|| {
        warn!("Flash unique ID unavailable");
        [0u8; 8]
    });
    // FNV-1a over the ID, mixed with boot timing
    let hash = uid
        .iter()
        .fold(0x811C_9DC5u32, |h, b| (h ^ *b as u32).wrapping_mul(0x0100_0193));
    hash ^ Instant::now().as_ticks() as u32
}
