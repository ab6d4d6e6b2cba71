//! Data partition on the Pico W flash
//!
//! The last 64 KiB of the 2 MiB chip, above the CYW43 blobs, is a
//! sequential-storage map. The config loader and the storage
//! volume share it through `vivarium_hal::FlashStorage`.

use core::ops::Range;

use embassy_rp::dma::Channel;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use embassy_rp::Peri;
use embedded_storage_async::nor_flash::NorFlash;
use sequential_storage::cache::NoCache;
use sequential_storage::map;

pub use vivarium_hal::flash::{FlashError, StorageKey};

pub const FLASH_SIZE: usize = 2 * 1024 * 1024;
pub const DATA_PARTITION_SIZE: usize = 64 * 1024;
pub const DATA_PARTITION_START: usize = FLASH_SIZE - DATA_PARTITION_SIZE;

/// Largest record, a TOML config file
pub const MAX_RECORD_SIZE: usize = 4096;

const DATA_RANGE: Range<u32> = (DATA_PARTITION_START as u32)..(FLASH_SIZE as u32);

type PicoFlash<'d> = Flash<'d, FLASH, Async, FLASH_SIZE>;

/// Translate a record store failure into what callers branch on
fn record_error<E>(error: sequential_storage::Error<E>) -> FlashError {
    match error {
        sequential_storage::Error::Storage { .. } => FlashError::Flash,
        sequential_storage::Error::FullStorage => FlashError::Full,
        sequential_storage::Error::Corrupted { .. } => FlashError::Corrupted,
        sequential_storage::Error::BufferTooSmall { .. } => FlashError::BufferTooSmall,
        _ => FlashError::Storage,
    }
}

pub struct Rp2040FlashStorage<'d> {
    flash: PicoFlash<'d>,
    /// Record scratch for sequential-storage
    scratch: [u8; MAX_RECORD_SIZE],
}

impl<'d> Rp2040FlashStorage<'d> {
    pub fn new(flash: Peri<'d, FLASH>, dma: Peri<'d, impl Channel>) -> Self {
        Self {
            flash: Flash::new(flash, dma),
            scratch: [0; MAX_RECORD_SIZE],
        }
    }

    /// Factory-programmed 64-bit ID of the flash chip
    pub fn unique_id(&mut self) -> Option<[u8; 8]> {
        let mut uid = [0u8; 8];
        self.flash.blocking_unique_id(&mut uid).ok()?;
        Some(uid)
    }
}

impl<'d> vivarium_hal::FlashStorage for Rp2040FlashStorage<'d> {
    async fn read(&mut self, key: StorageKey, buffer: &mut [u8]) -> Result<usize, FlashError> {
        let record = map::fetch_item::<StorageKey, &[u8], _>(
            &mut self.flash,
            DATA_RANGE,
            &mut NoCache::new(),
            &mut self.scratch,
            &key,
        )
        .await
        .map_err(record_error)?
        .ok_or(FlashError::NotFound)?;

        let target = buffer
            .get_mut(..record.len())
            .ok_or(FlashError::BufferTooSmall)?;
        target.copy_from_slice(record);
        Ok(record.len())
    }

    async fn write(&mut self, key: StorageKey, data: &[u8]) -> Result<(), FlashError> {
        map::store_item(
            &mut self.flash,
            DATA_RANGE,
            &mut NoCache::new(),
            &mut self.scratch,
            &key,
            &data,
        )
        .await
        .map_err(record_error)
    }

    async fn erase_all(&mut self) -> Result<(), FlashError> {
        self.flash
            .erase(DATA_RANGE.start, DATA_RANGE.end)
            .await
            .map_err(|_| FlashError::Flash)
    }
}
