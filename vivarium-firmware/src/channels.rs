//! Inter-task communication
//!
//! Defines the statics shared between Embassy tasks. Uses embassy-sync
//! primitives for async hand-offs and core types with atomics for the
//! snapshots many tasks read.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicBool;

use vivarium_core::fault::RestartCause;
use vivarium_core::net::{LinkEvent, SharedConnectivity};
use vivarium_core::render::{Area, FlushOutcome, TickSource};
use vivarium_core::safety::{LivenessToken, TimeoutClass};
use vivarium_core::time::WallClock;
use vivarium_core::ui::StatusBar;

/// Panel width in pixels; strips always span it
pub const STRIP_WIDTH: usize = 320;
/// Rows rendered per transfer
pub const STRIP_ROWS: usize = 32;
/// Strip buffer size (RGB565)
pub const STRIP_BYTES: usize = STRIP_WIDTH * STRIP_ROWS * 2;

/// Channel capacity for link events
const LINK_EVENT_CHANNEL_SIZE: usize = 8;

/// Channel capacity for invalidated areas
const INVALIDATE_CHANNEL_SIZE: usize = 4;

/// Render clock advanced by the tick task
pub static TICKS: TickSource = TickSource::new(vivarium_core::render::TICK_PERIOD_MS);

/// Latest tick, wakes the render task
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Area whose pixels are in [`STRIP`], ready for the flush task
pub static FLUSH_REQUEST: Signal<CriticalSectionRawMutex, Area> = Signal::new();

/// Completion callback from the flush bridge
pub static FLUSH_DONE: Signal<CriticalSectionRawMutex, FlushOutcome> = Signal::new();

/// Pixel strip shared by the render and flush tasks (one transfer at a time)
pub static STRIP: Mutex<CriticalSectionRawMutex, [u8; STRIP_BYTES]> = Mutex::new([0; STRIP_BYTES]);

/// Areas that changed outside the render task
pub static INVALIDATE: Channel<CriticalSectionRawMutex, Area, INVALIDATE_CHANNEL_SIZE> =
    Channel::new();

/// Link events from the network stack to the connectivity supervisor
pub static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_CHANNEL_SIZE> =
    Channel::new();

/// Connectivity snapshot for UI consumers
pub static CONNECTIVITY: SharedConnectivity = SharedConnectivity::new();

/// Wall clock set by the time sync task
pub static WALL_CLOCK: WallClock = WallClock::new();

/// Auxiliary radio came up
pub static BT_ENABLED: AtomicBool = AtomicBool::new(false);

/// Status bar texts, written by the status task and drawn by the render task
pub static STATUS_BAR: BlockingMutex<CriticalSectionRawMutex, RefCell<StatusBar>> =
    BlockingMutex::new(RefCell::new(StatusBar::new()));

/// Fatal fault raised by a task; the main loop records it and resets
pub static FATAL: Signal<CriticalSectionRawMutex, RestartCause> = Signal::new();

/// Liveness tokens of the supervised tasks
pub static RENDER_TOKEN: LivenessToken = LivenessToken::new("render", TimeoutClass::UiCritical);
pub static FLUSH_TOKEN: LivenessToken = LivenessToken::new("flush", TimeoutClass::UiCritical);
pub static STATUS_TOKEN: LivenessToken = LivenessToken::new("status", TimeoutClass::BestEffort);
pub static WIFI_TOKEN: LivenessToken = LivenessToken::new("wifi", TimeoutClass::BestEffort);
pub static TIME_TOKEN: LivenessToken = LivenessToken::new("time_sync", TimeoutClass::BestEffort);

/// Milliseconds since boot, as liveness tokens count them
pub fn uptime_ms() -> u32 {
    embassy_time::Instant::now().as_millis() as u32
}
