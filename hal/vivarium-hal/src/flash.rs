//! Data partition records
//!
//! One flash partition holds everything the terminal persists: the
//! configuration override (TOML text or postcard) and the header that marks
//! the storage volume as formatted. Each record lives under a one-byte key.

/// Record slot in the data partition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StorageKey {
    /// Postcard-encoded `TerminalConfig`
    TerminalConfig = 0,
    /// Hand-edited config file, preferred over the postcard record
    TerminalConfigToml = 1,
    /// Written when the volume is formatted
    VolumeHeader = 2,
}

impl StorageKey {
    pub const ALL: [StorageKey; 3] = [
        StorageKey::TerminalConfig,
        StorageKey::TerminalConfigToml,
        StorageKey::VolumeHeader,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_u8() == value)
    }
}

/// Why a partition access failed
///
/// Callers branch on these: a missing record falls back to defaults, a
/// corrupt one may be reformatted, a dead bus is reported as no medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlashError {
    /// The flash device itself did not respond
    Flash,
    /// Record store failed for a reason other than those below
    Storage,
    NotFound,
    /// Record is larger than the caller's buffer
    BufferTooSmall,
    Corrupted,
    /// No free page left even after garbage collection
    Full,
}

/// Keyed record store over the data partition
pub trait FlashStorage {
    /// Copy the latest record for `key` into `buffer`, returning its length
    fn read(
        &mut self,
        key: StorageKey,
        buffer: &mut [u8],
    ) -> impl core::future::Future<Output = Result<usize, FlashError>>;

    /// Replace the record for `key`
    fn write(
        &mut self,
        key: StorageKey,
        data: &[u8],
    ) -> impl core::future::Future<Output = Result<(), FlashError>>;

    /// Wipe the partition, config override included
    fn erase_all(&mut self) -> impl core::future::Future<Output = Result<(), FlashError>>;
}

#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for StorageKey {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        let slot = buffer
            .first_mut()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        *slot = self.as_u8();
        Ok(1)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        let byte = buffer
            .first()
            .ok_or(sequential_storage::map::SerializationError::BufferTooSmall)?;
        StorageKey::from_u8(*byte)
            .map(|key| (key, 1))
            .ok_or(sequential_storage::map::SerializationError::InvalidFormat)
    }
}
