//! Simple TOML parser for terminal configuration
//!
//! This is a minimal, allocation-free parser that handles only the subset
//! needed for `terminal.toml`. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - [section] headers
//! - Integers with `_` separators
//! - Comments (# ...), including after a value
//!
//! NOT supported:
//! - Multi-line strings or escape sequences
//! - Arrays and inline tables
//! - Dotted keys
//!
//! Unknown keys are ignored so older firmware accepts newer files.

use heapless::String as HString;

use super::types::{PinConfig, TerminalConfig};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid or unknown section header
    InvalidSection { line: u16 },
    /// Value has the wrong type or is out of range
    InvalidValue { line: u16 },
    /// String longer than its fixed capacity
    TooLong { line: u16 },
    /// Invalid pin string
    InvalidPin { line: u16 },
}

impl ParseError {
    /// 1-based line the error was found on
    pub fn line(&self) -> u16 {
        match *self {
            ParseError::InvalidSection { line }
            | ParseError::InvalidValue { line }
            | ParseError::TooLong { line }
            | ParseError::InvalidPin { line } => line,
        }
    }
}

/// Error without position, attached to a line by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueError {
    Invalid,
    TooLong,
    Pin,
}

impl ValueError {
    fn at(self, line: u16) -> ParseError {
        match self {
            ValueError::Invalid => ParseError::InvalidValue { line },
            ValueError::TooLong => ParseError::TooLong { line },
            ValueError::Pin => ParseError::InvalidPin { line },
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Panel,
    Wifi,
    Network,
    Render,
    Watchdog,
    Storage,
    Time,
    Radio,
}

/// Parse TOML into a [`TerminalConfig`], starting from the defaults
///
/// Keys missing from the input keep their default value.
pub fn parse_config(input: &str) -> Result<TerminalConfig, ParseError> {
    let mut config = TerminalConfig::new();
    let mut section = Section::Root;

    for (index, line) in input.lines().enumerate() {
        let line_no = u16::try_from(index + 1).unwrap_or(u16::MAX);
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = section_header(line) {
            section = parse_section_header(header).ok_or(ParseError::InvalidSection { line: line_no })?;
            continue;
        }

        if let Some((key, value)) = parse_key_value(line) {
            apply_value(section, key, value, &mut config).map_err(|e| e.at(line_no))?;
        }
    }

    Ok(config)
}

/// Strip `[` `]` (and a trailing comment) from a header line
fn section_header(line: &str) -> Option<&str> {
    let line = match line.find('#') {
        Some(pos) => line[..pos].trim_end(),
        None => line,
    };
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

fn parse_section_header(header: &str) -> Option<Section> {
    match header {
        "panel" | "display" => Some(Section::Panel),
        "wifi" => Some(Section::Wifi),
        "network" => Some(Section::Network),
        "render" => Some(Section::Render),
        "watchdog" => Some(Section::Watchdog),
        "storage" => Some(Section::Storage),
        "time" => Some(Section::Time),
        "radio" | "bluetooth" => Some(Section::Radio),
        _ => None,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Apply one key to the config
fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut TerminalConfig,
) -> Result<(), ValueError> {
    match section {
        Section::Panel => {
            let p = &mut config.panel;
            match key {
                "width" => p.width = parse_int(value)?,
                "height" => p.height = parse_int(value)?,
                "clock_hz" => p.clock_hz = parse_int(value)?,
                "dma" => p.dma = parse_bool(value)?,
                "brightness" => p.brightness = parse_int(value)?,
                "dc_pin" => p.dc_pin = parse_pin(value)?,
                "rst_pin" | "reset_pin" => p.rst_pin = parse_pin(value)?,
                _ => {}
            }
        }
        Section::Wifi => match key {
            "ssid" => config.wifi.ssid = parse_fixed(value)?,
            "password" => config.wifi.password = parse_fixed(value)?,
            _ => {}
        },
        Section::Network => {
            let n = &mut config.network;
            match key {
                "connect_timeout_ms" => n.connect_timeout_ms = parse_int(value)?,
                "backoff_initial_ms" => n.backoff_initial_ms = parse_int(value)?,
                "backoff_max_ms" => n.backoff_max_ms = parse_int(value)?,
                "jitter_percent" => {
                    let jitter: u8 = parse_int(value)?;
                    if jitter > 100 {
                        return Err(ValueError::Invalid);
                    }
                    n.jitter_percent = jitter;
                }
                _ => {}
            }
        }
        Section::Render => {
            if key == "tick_ms" {
                config.render.tick_ms = parse_int(value)?;
            }
        }
        Section::Watchdog => {
            let w = &mut config.watchdog;
            match key {
                "period_ms" => w.period_ms = parse_int(value)?,
                "timeout_ms" => w.timeout_ms = parse_int(value)?,
                "ui_timeout_ms" => w.ui_timeout_ms = parse_int(value)?,
                "best_effort_timeout_ms" => w.best_effort_timeout_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::Storage => {
            let s = &mut config.storage;
            match key {
                "path" => s.path = parse_fixed(value)?,
                "format_if_mount_failed" => s.format_if_mount_failed = parse_bool(value)?,
                "max_files" => s.max_files = parse_int(value)?,
                _ => {}
            }
        }
        Section::Time => {
            let t = &mut config.time;
            match key {
                "server" => t.server = parse_fixed(value)?,
                "utc_offset_minutes" => t.utc_offset_minutes = parse_int(value)?,
                "resync_s" => t.resync_s = parse_int(value)?,
                _ => {}
            }
        }
        Section::Radio => {
            if key == "enabled" {
                config.radio.enabled = parse_bool(value)?;
            }
        }
        Section::Root => {
            if key == "version" {
                config.version = parse_int(value)?;
            }
        }
    }

    Ok(())
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Parse a string into fixed-capacity storage
fn parse_fixed<const N: usize>(value: &str) -> Result<HString<N>, ValueError> {
    HString::try_from(parse_string(value)).map_err(|_| ValueError::TooLong)
}

/// Parse an integer value, allowing `_` digit separators
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ValueError> {
    if !value.contains('_') {
        return value.parse().map_err(|_| ValueError::Invalid);
    }

    let mut digits: HString<24> = HString::new();
    for c in value.chars().filter(|c| *c != '_') {
        digits.push(c).map_err(|_| ValueError::Invalid)?;
    }
    digits.parse().map_err(|_| ValueError::Invalid)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ValueError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ValueError::Invalid),
    }
}

/// Parse a pin string like "gpio20", "!gpio21", "^gpio4"
fn parse_pin(value: &str) -> Result<PinConfig, ValueError> {
    let mut s = parse_string(value);
    let mut inverted = false;
    let mut pull_up = false;

    // Check for modifiers
    loop {
        if let Some(rest) = s.strip_prefix('!') {
            inverted = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('^') {
            pull_up = true;
            s = rest;
        } else {
            break;
        }
    }

    // Parse "gpioNN"
    let number = s.strip_prefix("gpio").ok_or(ValueError::Pin)?;
    let pin: u8 = number.parse().map_err(|_| ValueError::Pin)?;
    if pin > 29 {
        return Err(ValueError::Pin);
    }

    Ok(PinConfig {
        pin,
        inverted,
        pull_up,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pin() {
        let pin = parse_pin("gpio11").unwrap();
        assert_eq!(pin.pin, 11);
        assert!(!pin.inverted);
        assert!(!pin.pull_up);

        let pin = parse_pin("!gpio12").unwrap();
        assert_eq!(pin.pin, 12);
        assert!(pin.inverted);

        let pin = parse_pin("\"^!gpio5\"").unwrap();
        assert_eq!(pin.pin, 5);
        assert!(pin.inverted);
        assert!(pin.pull_up);

        assert_eq!(parse_pin("gpio30"), Err(ValueError::Pin));
        assert_eq!(parse_pin("pin3"), Err(ValueError::Pin));
    }

    #[test]
    fn test_parse_int_separators() {
        assert_eq!(parse_int::<u32>("62_500_000"), Ok(62_500_000));
        assert_eq!(parse_int::<i16>("-300"), Ok(-300));
        assert_eq!(parse_int::<u8>("300"), Err(ValueError::Invalid));
    }

    #[test]
    fn test_key_value_inline_comment() {
        assert_eq!(parse_key_value("dma = true # fast"), Some(("dma", "true")));
        assert_eq!(
            parse_key_value("ssid = \"lab#2\""),
            Some(("ssid", "\"lab#2\""))
        );
        assert_eq!(parse_key_value("ssid ="), None);
    }

    #[test]
    fn test_parse_full_config() {
        let input = r#"
# Terminal configuration
version = 1

[panel]
width = 320
height = 480
clock_hz = 40_000_000
dma = false
brightness = 200
dc_pin = "gpio8"
rst_pin = "!gpio9"

[wifi]
ssid = "greenhouse"
password = "hunter22"

[network]
connect_timeout_ms = 8000
backoff_initial_ms = 250
backoff_max_ms = 10000
jitter_percent = 10

[render]
tick_ms = 20

[watchdog]
period_ms = 500
timeout_ms = 4000
ui_timeout_ms = 1500
best_effort_timeout_ms = 20000

[storage]
path = "/logs"
format_if_mount_failed = false
max_files = 3

[time]
server = "time.example.org"
utc_offset_minutes = -300
resync_s = 600

[radio]
enabled = false
"#;

        let config = parse_config(input).unwrap();
        assert_eq!(config.panel.clock_hz, 40_000_000);
        assert!(!config.panel.dma);
        assert_eq!(config.panel.brightness, 200);
        assert_eq!(config.panel.dc_pin, PinConfig::new(8));
        assert_eq!(config.panel.rst_pin, PinConfig::inverted(9));
        assert_eq!(config.wifi.ssid.as_str(), "greenhouse");
        assert_eq!(config.network.backoff_initial_ms, 250);
        assert_eq!(config.network.jitter_percent, 10);
        assert_eq!(config.render.tick_ms, 20);
        assert_eq!(config.watchdog.ui_timeout_ms, 1500);
        assert_eq!(config.storage.path.as_str(), "/logs");
        assert!(!config.storage.format_if_mount_failed);
        assert_eq!(config.time.utc_offset_minutes, -300);
        assert!(!config.radio.enabled);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = parse_config("[wifi]\nssid = \"x\"\n").unwrap();
        let defaults = TerminalConfig::default();
        assert_eq!(config.panel, defaults.panel);
        assert_eq!(config.watchdog, defaults.watchdog);
        assert_eq!(config.wifi.ssid.as_str(), "x");
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        assert_eq!(
            parse_config("[panel]\nwidth = wide\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
        assert_eq!(
            parse_config("\n\n[stepper]\n"),
            Err(ParseError::InvalidSection { line: 3 })
        );
        assert_eq!(
            parse_config("[panel]\ndc_pin = \"gpio99\"\n").map_err(|e| e.line()),
            Err(2)
        );
    }

    #[test]
    fn test_string_too_long() {
        let input = "[wifi]\nssid = \"0123456789012345678901234567890123456789\"\n";
        assert_eq!(parse_config(input), Err(ParseError::TooLong { line: 2 }));
    }

    #[test]
    fn test_jitter_over_100_rejected() {
        assert_eq!(
            parse_config("[network]\njitter_percent = 150\n"),
            Err(ParseError::InvalidValue { line: 2 })
        );
    }

    #[test]
    fn test_section_header_with_comment() {
        let config = parse_config("[radio] # bt\nenabled = false\n").unwrap();
        assert!(!config.radio.enabled);
    }
}
