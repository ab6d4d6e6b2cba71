//! Safety monitoring
//!
//! Detects hung tasks and decides when the watchdog stops being fed.

pub mod liveness;

pub use liveness::{
    LivenessError, LivenessSupervisor, LivenessTimeouts, LivenessToken, Stall, TimeoutClass,
    Verdict, BEST_EFFORT_TIMEOUT_MS, CHECK_PERIOD_MS, UI_CRITICAL_TIMEOUT_MS, WATCHDOG_TIMEOUT_MS,
};
