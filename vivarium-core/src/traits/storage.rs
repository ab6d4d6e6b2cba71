//! Storage mount trait
//!
//! The bring-up sequence only cares whether the volume came up; file
//! semantics live with the storage implementation.

use core::future::Future;

/// Options applied when mounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MountOptions {
    /// Erase and re-create the volume if it cannot be mounted as-is
    pub format_if_mount_failed: bool,
    /// Maximum number of simultaneously open log files
    pub max_files: u8,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            format_if_mount_failed: true,
            max_files: 5,
        }
    }
}

/// Mount failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountError {
    /// No medium or partition responded
    NoMedium,
    /// Volume present but unreadable, and formatting was not allowed
    Corrupted,
    /// Formatting was attempted and failed
    FormatFailed,
}

/// A mountable storage volume
pub trait StorageMount {
    /// Mount the volume at `path`
    fn mount(
        &mut self,
        path: &str,
        options: &MountOptions,
    ) -> impl Future<Output = Result<(), MountError>>;

    /// Check if the volume is currently mounted
    fn is_mounted(&self) -> bool;
}
