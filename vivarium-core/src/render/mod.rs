//! Render pipeline
//!
//! Tick source -> render scheduler -> flush bridge -> display transport.

pub mod flush;
pub mod region;
pub mod scheduler;
pub mod tick;

pub use flush::{FlushBridge, FlushCompletion, FlushError, FlushOutcome, WRITE_ATTEMPTS};
pub use region::{Area, DirtyAreas, DirtyRegion, RegionError, BYTES_PER_PIXEL};
pub use scheduler::{CycleStart, FrameStats, RenderScheduler, MAX_PENDING_AREAS};
pub use tick::{TickSource, TICK_PERIOD_MS};
