//! Auxiliary radio trait
//!
//! The terminal only needs to know whether the second radio is up so the
//! status bar can say so. Pairing and protocol handling are out of scope.

use core::future::Future;

/// Auxiliary radio failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Radio disabled in configuration or not fitted
    Disabled,
    /// Controller did not come up
    ControllerFault,
}

/// Auxiliary radio controller
pub trait AuxRadio {
    /// Power up and enable the controller
    fn enable(&mut self) -> impl Future<Output = Result<(), RadioError>>;

    /// Check if the controller is enabled
    fn is_enabled(&self) -> bool;
}
