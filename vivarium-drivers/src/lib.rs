//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in vivarium-core:
//!
//! - ST7796 TFT panel over SPI ([`DisplayTransport`](vivarium_core::traits::DisplayTransport))
//! - Strip framebuffer for drawing with embedded-graphics
//! - Flash-backed storage volume ([`StorageMount`](vivarium_core::traits::StorageMount))

#![no_std]
#![deny(unsafe_code)]

pub mod panel;
pub mod storage;

pub use panel::{PanelError, St7796, StripTarget};
pub use storage::{FlashVolume, MountKind};
