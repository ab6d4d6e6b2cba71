//! Hardware abstraction traits
//!
//! These traits define the interface between the orchestration logic
//! and hardware-specific implementations.

pub mod display;
pub mod radio;
pub mod storage;

pub use display::DisplayTransport;
pub use radio::{AuxRadio, RadioError};
pub use storage::{MountError, MountOptions, StorageMount};
