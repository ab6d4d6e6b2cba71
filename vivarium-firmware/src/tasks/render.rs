//! Render task
//!
//! Runs one render cycle per tick: pulls invalidated areas, then draws and
//! flushes them one at a time while the cycle is still current. Areas are
//! drawn into the shared strip buffer in bands of whole rows and handed to
//! the flush task; the next band is only drawn once the previous one has
//! left the bus.

use defmt::*;
use vivarium_core::render::{Area, CycleStart, FlushOutcome, RenderScheduler, BYTES_PER_PIXEL};
use vivarium_drivers::StripTarget;

use crate::channels::{
    uptime_ms, FLUSH_DONE, FLUSH_REQUEST, INVALIDATE, RENDER_TOKEN, STATUS_BAR, STRIP, STRIP_BYTES,
    TICKS, TICK_SIGNAL,
};
use crate::display::scene;

/// Cycles between frame statistics log lines
const STATS_EVERY: u32 = 3_750;

#[embassy_executor::task]
pub async fn render_task(bounds: Area) {
    info!("Render task started");

    let mut scheduler: RenderScheduler = RenderScheduler::new(bounds);
    // First frame covers the whole panel
    scheduler.invalidate(bounds);

    loop {
        let tick = TICK_SIGNAL.wait().await;
        RENDER_TOKEN.refresh(uptime_ms());

        while let Ok(area) = INVALIDATE.try_receive() {
            scheduler.invalidate(area);
        }

        if scheduler.begin_cycle(tick) == CycleStart::Busy {
            continue;
        }

        while let Some(area) = scheduler.next_dispatch(TICKS.now()) {
            let outcome = draw_and_flush(area, bounds).await;
            if !outcome.is_delivered() {
                warn!("Area {} not delivered, redrawing", area);
            }
            scheduler.flush_complete(outcome);
        }

        let stats = scheduler.stats();
        if stats.cycles % STATS_EVERY == 0 {
            info!(
                "Frames: {} cycles, {} dropped, {} overruns, {} areas flushed",
                stats.cycles, stats.dropped, stats.overruns, stats.flushed
            );
        }
    }
}

/// Draw `area` band by band and push each band through the flush task
async fn draw_and_flush(area: Area, bounds: Area) -> FlushOutcome {
    // Snapshot so the critical section stays short
    let status = STATUS_BAR.lock(|bar| bar.borrow().clone());
    let row_bytes = area.width() as usize * BYTES_PER_PIXEL;
    let rows = (STRIP_BYTES / row_bytes).max(1) as u16;

    let mut y = area.y1;
    loop {
        let y2 = y.saturating_add(rows - 1).min(area.y2);
        let band = Area::new(area.x1, y, area.x2, y2);

        {
            let mut strip = STRIP.lock().await;
            match StripTarget::new(&mut strip[..], band, bounds.width(), bounds.height()) {
                Ok(mut target) => scene::draw(&mut target, &status),
                Err(_) => return FlushOutcome::Failed(area),
            }
        }

        FLUSH_DONE.reset();
        FLUSH_REQUEST.signal(band);
        if !FLUSH_DONE.wait().await.is_delivered() {
            return FlushOutcome::Failed(area);
        }

        if y2 >= area.y2 {
            return FlushOutcome::Delivered(area);
        }
        y = y2 + 1;
    }
}
