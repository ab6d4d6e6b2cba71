//! Board-agnostic core logic for the Vivarium status terminal
//!
//! This crate contains all orchestration logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (display transport, storage, aux radio)
//! - Render scheduler, flush bridge and tick source
//! - Connectivity state machine and reconnect backoff
//! - Ordered subsystem bring-up with fallback policy
//! - Liveness supervision
//! - Configuration types and TOML parsing
//! - Status bar model and SNTP codec

#![no_std]
#![deny(unsafe_code)]

pub mod boot;
pub mod config;
pub mod fault;
pub mod net;
pub mod render;
pub mod safety;
pub mod time;
pub mod traits;
pub mod ui;
