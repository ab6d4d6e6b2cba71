//! Board side of the bring-up sequence
//!
//! Owns every piece of hardware until its subsystem is up, then hands the
//! long-lived parts to tasks. Steps can be run again after a degraded
//! outcome; work that already happened (radio firmware load, task spawns)
//! is not repeated.

use defmt::*;
use embassy_executor::Spawner;
use embassy_net::{Stack, StackResources};
use embassy_rp::gpio::Output;
use embassy_time::{Instant, Timer};
use static_cell::StaticCell;

use vivarium_core::boot::{wait_connected, StepFailure, Subsystem, Subsystems, CONNECT_POLL_MS};
use vivarium_core::config::TerminalConfig;
use vivarium_core::net::LinkEvent;
use vivarium_core::traits::{AuxRadio, DisplayTransport, RadioError, StorageMount};
use vivarium_drivers::FlashVolume;
use vivarium_hal_rp2040::Rp2040FlashStorage;

use crate::channels::{CONNECTIVITY, LINK_EVENTS, WALL_CLOCK};
use crate::display::Panel;
use crate::radio::{firmware, Cyw43Bluetooth};
use crate::tasks::net::RadioSpi;
use crate::tasks::{self, time_sync};

/// Sockets: DHCP, DNS and the SNTP socket
const SOCKET_COUNT: usize = 3;

static CYW43_STATE: StaticCell<cyw43::State> = StaticCell::new();
static NET_RESOURCES: StaticCell<StackResources<SOCKET_COUNT>> = StaticCell::new();

/// CYW43439 power line and SPI link, consumed by the network step
pub struct RadioHardware {
    pub pwr: Output<'static>,
    pub spi: RadioSpi,
}

pub struct Platform {
    spawner: Spawner,
    config: &'static TerminalConfig,
    panel: Option<Panel>,
    volume: FlashVolume<Rp2040FlashStorage<'static>>,
    radio: Option<RadioHardware>,
    stack: Option<Stack<'static>>,
    bluetooth: Cyw43Bluetooth,
    time_sync_running: bool,
    seed: u32,
}

impl Platform {
    pub fn new(
        spawner: Spawner,
        config: &'static TerminalConfig,
        panel: Option<Panel>,
        volume: FlashVolume<Rp2040FlashStorage<'static>>,
        radio: RadioHardware,
        seed: u32,
    ) -> Self {
        Self {
            spawner,
            config,
            panel,
            volume,
            radio: Some(radio),
            stack: None,
            bluetooth: Cyw43Bluetooth::absent(config.radio.enabled),
            time_sync_running: false,
            seed,
        }
    }

    /// Hand the initialized panel over to the flush task
    pub fn take_panel(&mut self) -> Option<Panel> {
        self.panel.take().filter(|panel| panel.is_initialized())
    }

    /// Whether the Wi-Fi task has been spawned
    pub fn network_started(&self) -> bool {
        self.stack.is_some()
    }

    /// Whether the time sync task has been spawned
    pub fn time_sync_started(&self) -> bool {
        self.time_sync_running
    }

    async fn bring_up_display(&mut self) -> Result<(), StepFailure> {
        let Some(panel) = self.panel.as_mut() else {
            error!("Panel hardware unavailable");
            return Err(StepFailure::Fault);
        };
        panel.init().await.map_err(|e| {
            warn!("Panel init failed: {}", Debug2Format(&e));
            StepFailure::Fault
        })?;
        let (width, height) = panel.dimensions();
        info!("Panel up: {}x{}, brightness {}", width, height, panel.brightness());
        Ok(())
    }

    async fn bring_up_storage(&mut self) -> Result<(), StepFailure> {
        let storage = &self.config.storage;
        self.volume
            .mount(storage.path.as_str(), &storage.mount_options())
            .await
            .map_err(|e| {
                warn!("Storage mount at {} failed: {}", storage.path.as_str(), e);
                StepFailure::Fault
            })?;
        if let Some(kind) = self.volume.last_mount() {
            info!("Storage mounted at {} ({})", storage.path.as_str(), kind);
        }
        Ok(())
    }

    async fn bring_up_network(&mut self) -> Result<(), StepFailure> {
        if self.config.wifi.ssid.is_empty() {
            warn!("No Wi-Fi network configured");
            return Err(StepFailure::Unavailable);
        }
        if self.stack.is_none() {
            self.start_radio().await?;
            LINK_EVENTS.send(LinkEvent::Started).await;
        }

        let timeout_ms = self.config.network.connect_timeout_ms;
        let result = wait_connected(self, &CONNECTIVITY, timeout_ms, CONNECT_POLL_MS).await;
        if result.is_err() {
            warn!(
                "No connection after {} ms ({}), continuing",
                timeout_ms,
                CONNECTIVITY.get()
            );
        }
        result
    }

    /// Load the radio firmware and spawn the network tasks
    async fn start_radio(&mut self) -> Result<(), StepFailure> {
        let Some(hw) = self.radio.take() else {
            return Err(StepFailure::Fault);
        };
        let config = self.config;
        let state = CYW43_STATE.init(cyw43::State::new());
        let bt_wanted = config.radio.enabled;

        let (device, bt_driver, mut control, runner) = if bt_wanted {
            let (device, bt, control, runner) =
                cyw43::new_with_bluetooth(state, hw.pwr, hw.spi, firmware::wifi(), firmware::bluetooth()).await;
            (device, Some(bt), control, runner)
        } else {
            let (device, control, runner) = cyw43::new(state, hw.pwr, hw.spi, firmware::wifi()).await;
            (device, None, control, runner)
        };
        self.spawner.spawn(unwrap!(tasks::cyw43_task(runner)));

        control.init(firmware::clm()).await;
        control
            .set_power_management(cyw43::PowerManagementMode::PowerSave)
            .await;
        self.bluetooth = Cyw43Bluetooth::new(bt_driver, bt_wanted);
        info!("Radio firmware loaded (bluetooth: {})", bt_wanted);

        let (stack, runner) = embassy_net::new(
            device,
            embassy_net::Config::dhcpv4(Default::default()),
            NET_RESOURCES.init(StackResources::new()),
            self.seed as u64 | ((Instant::now().as_ticks() as u64) << 32),
        );
        self.spawner.spawn(unwrap!(tasks::net_task(runner)));
        self.spawner.spawn(unwrap!(tasks::link_monitor_task(stack)));
        self.spawner.spawn(unwrap!(tasks::wifi_task(
            control,
            &config.wifi,
            config.network.backoff_policy(),
            self.seed,
        )));
        self.stack = Some(stack);
        Ok(())
    }

    async fn bring_up_radio(&mut self) -> Result<(), StepFailure> {
        match self.bluetooth.enable().await {
            Ok(()) => {
                info!("Bluetooth enabled");
                Ok(())
            }
            Err(RadioError::Disabled) => {
                info!("Bluetooth disabled in configuration");
                Err(StepFailure::Unavailable)
            }
            Err(e) => {
                warn!("Bluetooth unavailable: {}", e);
                Err(StepFailure::Fault)
            }
        }
    }

    async fn bring_up_time(&mut self) -> Result<(), StepFailure> {
        let Some(stack) = self.stack else {
            return Err(StepFailure::Unavailable);
        };
        let config = self.config;
        let time = &config.time;

        if !self.time_sync_running {
            self.spawner.spawn(unwrap!(tasks::time_sync_task(stack, time)));
            self.time_sync_running = true;
        }
        if WALL_CLOCK.is_set() {
            return Ok(());
        }

        match time_sync::sync_bounded(stack, time.server.as_str()).await {
            Ok(unix_secs) => {
                info!("Time synced from {}: {} (unix)", time.server.as_str(), unix_secs);
                Ok(())
            }
            Err(e) => {
                warn!("Time sync from {} failed: {}", time.server.as_str(), e);
                Err(match e {
                    time_sync::TimeSyncError::Timeout => StepFailure::Timeout,
                    time_sync::TimeSyncError::Offline => StepFailure::Unavailable,
                    _ => StepFailure::Fault,
                })
            }
        }
    }
}

impl Subsystems for Platform {
    async fn bring_up(&mut self, subsystem: Subsystem) -> Result<(), StepFailure> {
        info!("Bringing up {}", subsystem.name());
        match subsystem {
            Subsystem::Display => self.bring_up_display().await,
            Subsystem::Storage => self.bring_up_storage().await,
            Subsystem::Network => self.bring_up_network().await,
            Subsystem::AuxRadio => self.bring_up_radio().await,
            Subsystem::TimeSync => self.bring_up_time().await,
        }
    }

    async fn pause(&mut self, ms: u32) {
        Timer::after_millis(ms as u64).await;
    }
}
