//! RP2040-specific HAL for the Pico W status terminal
//!
//! This crate provides RP2040 implementations of the shared `vivarium-hal`
//! traits, plus board-specific functionality:
//!
//! - Config-driven GPIO allocation with the fixed-function pins held back
//! - Flash storage driver (implements `vivarium_hal::FlashStorage`)
//! - Hardware watchdog with scratch registers (implements `vivarium_hal::HardwareWatchdog`)

#![no_std]

pub mod flash;
pub mod pins;
pub mod watchdog;

pub use flash::Rp2040FlashStorage;
pub use pins::{BoardPeripherals, PinBank, PinError};
pub use watchdog::Rp2040Watchdog;

// Re-export shared traits from vivarium-hal for convenience
pub use vivarium_hal::{FlashStorage as FlashStorageTrait, HardwareWatchdog, StorageKey};
