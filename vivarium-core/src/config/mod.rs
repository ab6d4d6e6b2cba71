//! Configuration types and parsing
//!
//! Board-agnostic configuration, stored as TOML or postcard binary data.

pub mod toml;
pub mod types;

pub use toml::{parse_config, ParseError};
pub use types::*;
