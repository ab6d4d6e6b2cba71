//! Configuration loading
//!
//! Loads the terminal configuration from flash, the embedded
//! terminal.toml, or compiled defaults.

pub mod loader;

pub use loader::{ConfigError, ConfigPersistence, ConfigSource};
