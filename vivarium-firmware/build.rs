//! Build script for vivarium-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates terminal.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// GPIOs wired to the panel SPI bus, the backlight and the CYW43 radio
const RESERVED_PINS: [i64; 8] = [17, 18, 19, 22, 23, 24, 25, 29];

/// Highest SPI clock the RP2040 can produce (clk_peri / 2)
const MAX_SPI_HZ: i64 = 62_500_000;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate terminal.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=terminal.toml");

    let config_path = Path::new("terminal.toml");

    if !config_path.exists() {
        fail(
            "terminal.toml not found!",
            &[
                "The firmware embeds a terminal.toml configuration file.".to_string(),
                "Please create one in the vivarium-firmware directory.".to_string(),
            ],
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read terminal.toml", &[format!("Error: {}", e)]),
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let lines: Vec<String> = e.to_string().lines().map(str::to_string).collect();
            fail("Invalid TOML syntax in terminal.toml", &lines);
        }
    };

    let mut errors = Vec::new();
    validate_panel(&config, &mut errors);
    validate_wifi(&config, &mut errors);
    validate_network(&config, &mut errors);
    validate_timing(&config, &mut errors);
    validate_storage(&config, &mut errors);
    validate_time(&config, &mut errors);

    if let Some(value) = config.get("radio").and_then(|r| r.get("enabled")) {
        if !value.is_bool() {
            errors.push("[radio] enabled must be true or false".to_string());
        }
    }

    if !errors.is_empty() {
        fail("Invalid configuration in terminal.toml", &errors);
    }

    println!("cargo:warning=terminal.toml validated successfully");
}

/// Abort the build with a boxed error message
fn fail(title: &str, lines: &[String]) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        lines
            .iter()
            .map(|line| {
                let truncated = if line.len() > 62 {
                    format!("{}...", &line[..59])
                } else {
                    line.to_string()
                };
                format!("║  • {:<62} ║", truncated)
            })
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Integer field, if present
fn int(config: &toml::Value, section: &str, key: &str) -> Option<i64> {
    config.get(section)?.get(key)?.as_integer()
}

/// Check an optional integer field against an inclusive range
fn check_range(
    config: &toml::Value,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) {
    let Some(value) = config.get(section).and_then(|s| s.get(key)) else {
        return;
    };
    match value.as_integer() {
        Some(v) if (min..=max).contains(&v) => {}
        Some(_) => errors.push(format!("[{}] {} must be {}-{}", section, key, min, max)),
        None => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

fn validate_panel(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(panel) = config.get("panel") else {
        errors.push("Missing [panel] section".to_string());
        return;
    };

    check_range(config, "panel", "width", 1, 480, errors);
    check_range(config, "panel", "height", 1, 480, errors);
    check_range(config, "panel", "clock_hz", 1_000_000, MAX_SPI_HZ, errors);
    check_range(config, "panel", "brightness", 0, 255, errors);

    let mut used = Vec::new();
    for key in ["dc_pin", "rst_pin"] {
        match panel.get(key).and_then(|v| v.as_str()) {
            Some(text) => match parse_pin(text) {
                Some(pin) if RESERVED_PINS.contains(&pin) => errors.push(format!(
                    "[panel] {} uses gpio{}, which has a fixed board function",
                    key, pin
                )),
                Some(pin) if used.contains(&pin) => {
                    errors.push(format!("[panel] {} reuses gpio{}", key, pin))
                }
                Some(pin) => used.push(pin),
                None => errors.push(format!("[panel] {} must look like \"gpioNN\"", key)),
            },
            None => errors.push(format!("[panel] missing '{}'", key)),
        }
    }
}

/// Parse "gpioNN" with optional `!`/`^` modifiers
fn parse_pin(text: &str) -> Option<i64> {
    let number = text.trim_start_matches(['!', '^']).strip_prefix("gpio")?;
    let pin: i64 = number.parse().ok()?;
    (0..=29).contains(&pin).then_some(pin)
}

fn validate_wifi(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(wifi) = config.get("wifi") else {
        errors.push("Missing [wifi] section".to_string());
        return;
    };

    match wifi.get("ssid").and_then(|v| v.as_str()) {
        Some(ssid) if ssid.is_empty() || ssid.len() > 32 => {
            errors.push("[wifi] ssid must be 1-32 bytes".to_string())
        }
        Some(_) => {}
        None => errors.push("[wifi] missing 'ssid'".to_string()),
    }

    if let Some(password) = wifi.get("password").and_then(|v| v.as_str()) {
        // WPA2 passphrases are 8-63 characters; empty means an open network
        if !password.is_empty() && !(8..=63).contains(&password.len()) {
            errors.push("[wifi] password must be empty or 8-63 bytes".to_string());
        }
    }
}

fn validate_network(config: &toml::Value, errors: &mut Vec<String>) {
    check_range(config, "network", "connect_timeout_ms", 100, 120_000, errors);
    check_range(config, "network", "jitter_percent", 0, 100, errors);
    check_range(config, "network", "backoff_initial_ms", 1, 600_000, errors);
    check_range(config, "network", "backoff_max_ms", 1, 600_000, errors);

    let initial = int(config, "network", "backoff_initial_ms").unwrap_or(500);
    let max = int(config, "network", "backoff_max_ms").unwrap_or(30_000);
    if initial > max {
        errors.push("[network] backoff_initial_ms must not exceed backoff_max_ms".to_string());
    }
}

fn validate_timing(config: &toml::Value, errors: &mut Vec<String>) {
    check_range(config, "render", "tick_ms", 1, 1_000, errors);
    // RP2040 watchdog counter holds at most ~8.3 s
    check_range(config, "watchdog", "timeout_ms", 100, 8_300, errors);

    let period = int(config, "watchdog", "period_ms").unwrap_or(1_000);
    let timeout = int(config, "watchdog", "timeout_ms").unwrap_or(5_000);
    if period <= 0 || period >= timeout {
        errors.push("[watchdog] period_ms must be below timeout_ms".to_string());
    }

    let ui = int(config, "watchdog", "ui_timeout_ms").unwrap_or(2_000);
    let best_effort = int(config, "watchdog", "best_effort_timeout_ms").unwrap_or(30_000);
    if ui < period {
        errors.push("[watchdog] ui_timeout_ms must be at least period_ms".to_string());
    }
    if best_effort < ui {
        errors.push("[watchdog] best_effort_timeout_ms must be at least ui_timeout_ms".to_string());
    }
}

fn validate_storage(config: &toml::Value, errors: &mut Vec<String>) {
    check_range(config, "storage", "max_files", 1, 32, errors);

    if let Some(path) = config.get("storage").and_then(|s| s.get("path")) {
        match path.as_str() {
            Some(p) if p.starts_with('/') && p.len() <= 16 => {}
            _ => errors.push("[storage] path must be absolute and at most 16 bytes".to_string()),
        }
    }
}

fn validate_time(config: &toml::Value, errors: &mut Vec<String>) {
    check_range(config, "time", "utc_offset_minutes", -720, 840, errors);
    check_range(config, "time", "resync_s", 60, 86_400, errors);

    if let Some(server) = config.get("time").and_then(|t| t.get("server")) {
        match server.as_str() {
            Some(s) if !s.is_empty() && s.len() <= 48 => {}
            _ => errors.push("[time] server must be a host name of at most 48 bytes".to_string()),
        }
    }
}
