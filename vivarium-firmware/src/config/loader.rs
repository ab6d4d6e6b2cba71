//! Configuration persistence
//!
//! Loads the terminal configuration from flash storage, falling back to the
//! embedded terminal.toml and then to compiled defaults.

use core::str;
use defmt::*;

use vivarium_core::config::{parse_config, TerminalConfig, CONFIG_VERSION};
use vivarium_hal::{FlashError, FlashStorage, StorageKey};

/// Maximum serialized config size (binary)
const MAX_CONFIG_SIZE: usize = 512;

/// Maximum TOML config size
const MAX_TOML_SIZE: usize = 4096;

/// Configuration persistence errors
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// TOML parsing failed
    TomlParse,
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// Config version mismatch
    VersionMismatch,
    /// Values parsed but do not fit together
    Invalid,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

/// Where the active configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigSource {
    FlashToml,
    FlashBinary,
    Embedded,
    Defaults,
}

/// Configuration persistence manager
pub struct ConfigPersistence<F> {
    storage: F,
}

impl<F: FlashStorage> ConfigPersistence<F> {
    pub fn new(storage: F) -> Self {
        Self { storage }
    }

    /// Consume this persistence manager and return the underlying storage
    ///
    /// The storage volume lives on the same partition and takes it over
    /// once the config is loaded.
    pub fn into_storage(self) -> F {
        self.storage
    }

    /// Load the active configuration
    ///
    /// Flash TOML first, then flash postcard, then `embedded`, then the
    /// compiled defaults. Never fails.
    pub async fn load_or_default(&mut self, embedded: &str) -> (TerminalConfig, ConfigSource) {
        match self.load().await {
            Ok(found) => return found,
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                info!("No configuration override in flash");
            }
            Err(e) => warn!("Ignoring configuration in flash: {:?}", e),
        }

        match parse_config(embedded) {
            Ok(config) if config.validate().is_ok() => {
                info!("Using embedded configuration");
                (config, ConfigSource::Embedded)
            }
            Ok(_) => {
                error!("Embedded configuration is inconsistent, using defaults");
                (TerminalConfig::default(), ConfigSource::Defaults)
            }
            Err(e) => {
                error!("Failed to parse embedded config at line {}", e.line());
                (TerminalConfig::default(), ConfigSource::Defaults)
            }
        }
    }

    /// Load configuration from flash
    ///
    /// Tries TOML first, falls back to binary postcard format.
    pub async fn load(&mut self) -> Result<(TerminalConfig, ConfigSource), ConfigError> {
        match self.load_toml().await {
            Ok(config) => {
                info!("Loaded configuration from TOML in flash");
                return Ok((config, ConfigSource::FlashToml));
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                debug!("No TOML config found, trying binary format");
            }
            Err(e) => {
                warn!("Failed to load TOML config: {:?}, trying binary", e);
            }
        }

        let config = self.load_binary().await?;
        info!("Loaded configuration from binary in flash");
        Ok((config, ConfigSource::FlashBinary))
    }

    async fn load_toml(&mut self) -> Result<TerminalConfig, ConfigError> {
        let mut buffer = [0u8; MAX_TOML_SIZE];
        let len = self
            .storage
            .read(StorageKey::TerminalConfigToml, &mut buffer)
            .await?;

        debug!("Read {} bytes of TOML from flash", len);

        let toml_str = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;

        let config = parse_config(toml_str).map_err(|e| {
            warn!("TOML parse error at line {}", e.line());
            ConfigError::TomlParse
        })?;
        check(config)
    }

    async fn load_binary(&mut self) -> Result<TerminalConfig, ConfigError> {
        let mut buffer = [0u8; MAX_CONFIG_SIZE];
        let len = self
            .storage
            .read(StorageKey::TerminalConfig, &mut buffer)
            .await?;

        debug!("Read {} bytes of binary config from flash", len);

        let config: TerminalConfig =
            postcard::from_bytes(&buffer[..len]).map_err(|_| ConfigError::Deserialize)?;

        if config.version != CONFIG_VERSION {
            warn!(
                "Config version mismatch: found {}, expected {}",
                config.version, CONFIG_VERSION
            );
            return Err(ConfigError::VersionMismatch);
        }

        check(config)
    }
}

fn check(config: TerminalConfig) -> Result<TerminalConfig, ConfigError> {
    match config.validate() {
        Ok(()) => {
            log_config_summary(&config);
            Ok(config)
        }
        Err(issue) => {
            warn!("Configuration rejected: {:?}", issue);
            Err(ConfigError::Invalid)
        }
    }
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &TerminalConfig) {
    debug!(
        "  panel {}x{} @ {} Hz",
        config.panel.width, config.panel.height, config.panel.clock_hz
    );
    debug!("  wifi ssid '{}'", config.wifi.ssid.as_str());
    debug!("  time server '{}'", config.time.server.as_str());
}
