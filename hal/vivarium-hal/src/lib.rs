//! Vivarium Hardware Abstraction Layer
//!
//! This crate defines hardware abstraction traits that chip-specific HALs
//! implement, so the firmware and drivers can be written (and tested)
//! without naming a chip.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (vivarium-firmware)        │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vivarium-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!             ┌───────────────┐
//!             │ vivarium-hal- │
//!             │    rp2040     │
//!             └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`flash::FlashStorage`] - Persistent key-value storage
//! - [`watchdog::HardwareWatchdog`] - Watchdog with reset-surviving scratch

#![no_std]
#![deny(unsafe_code)]

pub mod flash;
pub mod watchdog;

// Re-export key traits at crate root for convenience
pub use flash::{FlashError, FlashStorage, StorageKey};
pub use watchdog::{HardwareWatchdog, RESTART_RECORD_SCRATCH};
