//! Storage volume on the flash key-value partition
//!
//! The "volume" is the wear-leveled partition exposed by a
//! [`FlashStorage`]. Mounting checks for a header record; a partition that
//! was never formatted, or whose header is unreadable, is formatted when
//! the mount options allow it.

use vivarium_core::traits::{MountError, MountOptions, StorageMount};
use vivarium_hal::{FlashError, FlashStorage, StorageKey};

/// Header magic
const MAGIC: [u8; 3] = *b"VIV";
/// Header layout version
pub const VOLUME_VERSION: u8 = 1;
/// Encoded header size
const HEADER_LEN: usize = 5;

/// Volume header record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VolumeHeader {
    pub version: u8,
    pub max_files: u8,
}

impl VolumeHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        [MAGIC[0], MAGIC[1], MAGIC[2], self.version, self.max_files]
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != HEADER_LEN || bytes[..3] != MAGIC {
            return None;
        }
        if bytes[3] != VOLUME_VERSION {
            return None;
        }
        Some(Self {
            version: bytes[3],
            max_files: bytes[4],
        })
    }
}

/// How the last mount went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MountKind {
    /// Existing volume mounted as-is
    Existing,
    /// Blank partition given its first header
    Created,
    /// Unreadable volume erased and re-created
    Reformatted,
}

/// Flash-backed storage volume
pub struct FlashVolume<F> {
    flash: F,
    header: Option<VolumeHeader>,
    last_mount: Option<MountKind>,
}

impl<F: FlashStorage> FlashVolume<F> {
    pub fn new(flash: F) -> Self {
        Self {
            flash,
            header: None,
            last_mount: None,
        }
    }

    /// Header of the mounted volume
    pub fn header(&self) -> Option<VolumeHeader> {
        self.header
    }

    /// How the volume came up, if it did
    pub fn last_mount(&self) -> Option<MountKind> {
        self.last_mount
    }

    /// Access the underlying flash (configuration records share it)
    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    pub fn into_inner(self) -> F {
        self.flash
    }

    async fn write_header(&mut self, options: &MountOptions) -> Result<VolumeHeader, FlashError> {
        let header = VolumeHeader {
            version: VOLUME_VERSION,
            max_files: options.max_files,
        };
        self.flash
            .write(StorageKey::VolumeHeader, &header.encode())
            .await?;
        Ok(header)
    }

    async fn try_mount(&mut self, options: &MountOptions) -> Result<MountKind, MountError> {
        let mut buffer = [0u8; 16];
        let read = self.flash.read(StorageKey::VolumeHeader, &mut buffer).await;

        let found = match read {
            Ok(len) => VolumeHeader::decode(&buffer[..len]),
            Err(FlashError::NotFound) => {
                // Blank partition: nothing to lose by writing a header
                if !options.format_if_mount_failed {
                    return Err(MountError::NoMedium);
                }
                let header = self
                    .write_header(options)
                    .await
                    .map_err(|_| MountError::FormatFailed)?;
                self.header = Some(header);
                return Ok(MountKind::Created);
            }
            Err(FlashError::Flash) => return Err(MountError::NoMedium),
            Err(_) => None,
        };

        if let Some(header) = found {
            self.header = Some(header);
            return Ok(MountKind::Existing);
        }

        if !options.format_if_mount_failed {
            return Err(MountError::Corrupted);
        }

        self.flash
            .erase_all()
            .await
            .map_err(|_| MountError::FormatFailed)?;
        let header = self
            .write_header(options)
            .await
            .map_err(|_| MountError::FormatFailed)?;
        self.header = Some(header);
        Ok(MountKind::Reformatted)
    }
}

impl<F: FlashStorage> StorageMount for FlashVolume<F> {
    async fn mount(&mut self, _path: &str, options: &MountOptions) -> Result<(), MountError> {
        self.header = None;
        let kind = self.try_mount(options).await?;
        self.last_mount = Some(kind);
        Ok(())
    }

    fn is_mounted(&self) -> bool {
        self.header.is_some()
    }
}
