//! Storage volumes

pub mod volume;

pub use volume::{FlashVolume, MountKind, VolumeHeader, VOLUME_VERSION};
