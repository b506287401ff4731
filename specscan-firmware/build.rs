//! Build script for specscan-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates scanner.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sections every scanner.toml must carry
const REQUIRED_SECTIONS: [&str; 4] = ["servo", "motion", "sensor", "scan"];

/// GPIOs with an ADC channel
const ADC_PINS: [i64; 4] = [26, 27, 28, 29];

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

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    // Linker scripts for cortex-m-rt and defmt
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Validate scanner.toml at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=scanner.toml");

    let config_path = Path::new("scanner.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: scanner.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a scanner.toml configuration file.          ║\n\
            ║  Please create one in the specscan-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read scanner.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in scanner.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_required_sections(&config, &mut errors);
    validate_servos(&config, &mut errors);
    validate_motion(&config, &mut errors);
    validate_sensor(&config, &mut errors);
    validate_scan(&config, &mut errors);
    validate_pin_conflicts(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid scanner configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=scanner.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn validate_required_sections(config: &toml::Value, errors: &mut Vec<String>) {
    for section in REQUIRED_SECTIONS {
        if config.get(section).is_none() {
            errors.push(format!("Missing [{}] section", section));
        }
    }
    for axis in ["pan", "tilt"] {
        if config.get("servo").and_then(|s| s.get(axis)).is_none() {
            errors.push(format!("Missing [servo.{}] section", axis));
        }
    }
}

/// Two-element numeric array as floats
fn pair(value: &toml::Value) -> Option<(f64, f64)> {
    let items = value.as_array()?;
    if items.len() != 2 {
        return None;
    }
    let number = |v: &toml::Value| v.as_float().or_else(|| v.as_integer().map(|i| i as f64));
    Some((number(&items[0])?, number(&items[1])?))
}

fn integer(table: &toml::Value, key: &str) -> Option<i64> {
    table.get(key).and_then(|v| v.as_integer())
}

fn validate_servos(config: &toml::Value, errors: &mut Vec<String>) {
    for axis in ["pan", "tilt"] {
        let servo = match config.get("servo").and_then(|s| s.get(axis)) {
            Some(s) => s,
            None => continue,
        };

        match integer(servo, "pin") {
            Some(pin) if (0..30).contains(&pin) => {}
            Some(_) => errors.push(format!("[servo.{}] pin must be 0-29", axis)),
            None => errors.push(format!("[servo.{}] missing 'pin'", axis)),
        }

        match servo.get("range_us").map(pair) {
            Some(Some((min, max))) => {
                if min <= 0.0 || max > 65535.0 || min >= max {
                    errors.push(format!("[servo.{}] range_us must be [min, max], min < max", axis));
                }
            }
            Some(None) => errors.push(format!("[servo.{}] range_us must be a two-element array", axis)),
            None => {}
        }

        match servo.get("range_deg").map(pair) {
            Some(Some((a, b))) => {
                if a == b {
                    errors.push(format!("[servo.{}] range_deg end points must differ", axis));
                }
            }
            Some(None) => errors.push(format!("[servo.{}] range_deg must be a two-element array", axis)),
            None => {}
        }

        if let Some(hz) = integer(servo, "pwm_hz") {
            if !(16..=400).contains(&hz) {
                errors.push(format!("[servo.{}] pwm_hz must be 16-400", axis));
            }
        }

        if let Some(role) = servo.get("role") {
            match role.as_str() {
                Some("pan" | "tilt" | "sensor") => {}
                _ => errors.push(format!(
                    "[servo.{}] role must be \"pan\", \"tilt\" or \"sensor\"",
                    axis
                )),
            }
        }
    }
}

fn validate_motion(config: &toml::Value, errors: &mut Vec<String>) {
    let motion = match config.get("motion") {
        Some(m) => m,
        None => return,
    };

    if let Some(tick) = integer(motion, "tick_period_ms") {
        if tick < 1 {
            errors.push("[motion] tick_period_ms must be at least 1".to_string());
        }
    }

    for key in ["pixel_move_ms", "origin_move_ms", "settle_margin_ms"] {
        if let Some(ms) = integer(motion, key) {
            if ms < 0 {
                errors.push(format!("[motion] {} cannot be negative", key));
            }
        }
    }

    if let Some(profile) = motion.get("profile") {
        match profile.as_str() {
            Some("linear") | Some("eased") | Some("parabolic") => {}
            _ => errors.push("[motion] profile must be \"linear\" or \"eased\"".to_string()),
        }
    }
}

fn validate_sensor(config: &toml::Value, errors: &mut Vec<String>) {
    let sensor = match config.get("sensor") {
        Some(s) => s,
        None => return,
    };

    for key in ["clk_pin", "st_pin"] {
        if let Some(pin) = integer(sensor, key) {
            if !(0..30).contains(&pin) {
                errors.push(format!("[sensor] {} must be 0-29", key));
            }
        }
    }

    if let Some(pin) = integer(sensor, "video_pin") {
        if !ADC_PINS.contains(&pin) {
            errors.push("[sensor] video_pin must be an ADC pin (26-29)".to_string());
        }
    }

    if let Some(value) = sensor.get("integration_s") {
        let seconds = value.as_float().or_else(|| value.as_integer().map(|i| i as f64));
        match seconds {
            Some(s) if s >= 0.0 => {}
            _ => errors.push("[sensor] integration_s must be a non-negative number".to_string()),
        }
    }
}

fn validate_scan(config: &toml::Value, errors: &mut Vec<String>) {
    let scan = match config.get("scan") {
        Some(s) => s,
        None => return,
    };

    if let Some(name) = scan.get("log_name") {
        match name.as_str() {
            Some(n) if !n.is_empty() && n.len() <= 32 => {}
            _ => errors.push("[scan] log_name must be 1-32 characters".to_string()),
        }
    }

    let extent = scan.get("extent_xy_deg").map(pair);
    let step = scan.get("step_xy_deg").map(pair);

    match extent {
        Some(Some((x, y))) if x < 0.0 || y < 0.0 => {
            errors.push("[scan] extent_xy_deg cannot be negative".to_string())
        }
        Some(None) => errors.push("[scan] extent_xy_deg must be a two-element array".to_string()),
        _ => {}
    }

    match step {
        Some(Some((x, y))) if x <= 0.0 || y <= 0.0 => {
            errors.push("[scan] step_xy_deg must be positive".to_string())
        }
        Some(None) => errors.push("[scan] step_xy_deg must be a two-element array".to_string()),
        _ => {}
    }

    if let (Some(Some((ex, ey))), Some(Some((sx, sy)))) = (extent, step) {
        if sx > 0.0 && sy > 0.0 {
            let points = ((ex / sx + 1e-4).floor() + 1.0) * ((ey / sy + 1e-4).floor() + 1.0);
            if points > 4096.0 {
                errors.push(format!("[scan] {} positions exceeds the 4096 limit", points));
            }
        }
    }

    if let Some(path) = scan.get("path") {
        match path.as_str() {
            Some("spiral") | Some("rect_spiral") | Some("raster") => {}
            _ => errors.push("[scan] path must be \"spiral\" or \"raster\"".to_string()),
        }
    }
}

fn validate_pin_conflicts(config: &toml::Value, errors: &mut Vec<String>) {
    let mut used: Vec<(i64, String)> = Vec::new();
    let mut claim = |pin: Option<i64>, owner: String, errors: &mut Vec<String>| {
        if let Some(pin) = pin {
            if let Some((_, other)) = used.iter().find(|(p, _)| *p == pin) {
                errors.push(format!("gpio{} used by both {} and {}", pin, other, owner));
            } else {
                used.push((pin, owner));
            }
        }
    };

    for axis in ["pan", "tilt"] {
        let pin = config
            .get("servo")
            .and_then(|s| s.get(axis))
            .and_then(|s| integer(s, "pin"));
        claim(pin, format!("servo.{}", axis), errors);
    }
    if let Some(sensor) = config.get("sensor") {
        for key in ["clk_pin", "st_pin", "video_pin"] {
            claim(integer(sensor, key), format!("sensor.{}", key), errors);
        }
    }
}
