//! Boot-time bring-up
//!
//! The sequencer decides order and fallback policy; the platform performs
//! each step.

pub mod sequencer;
pub mod status;

pub use sequencer::{
    wait_connected, BootOutcome, InitSequencer, Subsystems, CONNECT_POLL_MS, DISPLAY_ATTEMPTS,
    DISPLAY_RETRY_DELAY_MS,
};
pub use status::{BootReport, StepFailure, StepState, Subsystem, SubsystemStatus};
