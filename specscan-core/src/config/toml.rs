//! Simple TOML parser for scanner configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! the scanner configuration. It does NOT support the full TOML grammar and
//! needs no allocator.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - Two-element arrays: `range_us = [1010, 1931]`
//! - `[section]` and `[section.subsection]` headers
//! - Comments (# ...), including trailing comments
//!
//! NOT supported:
//! - Multi-line strings or arrays
//! - Inline tables
//! - Dotted keys outside section headers

use core::str::FromStr;

use heapless::String;

use super::hardware::{ScannerConfig, ServoConfig};
use crate::motion::Profile;
use crate::scan::PathKind;
use crate::traits::AxisRole;

/// What went wrong on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseErrorKind {
    /// Malformed or unknown section header
    InvalidSection,
    /// Key not valid in the current section
    UnknownKey,
    /// Line is not `key = value`, or the value has the wrong type
    InvalidValue,
    /// String longer than its fixed-capacity field
    TooLong,
    /// Unrecognised `path` value
    UnknownPathKind,
    /// Unrecognised `profile` value
    UnknownProfile,
    /// Unrecognised servo `role` value
    UnknownRole,
}

/// Parse error with the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParseError {
    /// Line number, starting at 1
    pub line: usize,
    /// Failure
    pub kind: ParseErrorKind,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    PanServo,
    TiltServo,
    Motion,
    Sensor,
    Scan,
}

/// Parse TOML configuration into a [`ScannerConfig`]
///
/// Keys that are absent keep their defaults.
pub fn parse_config(input: &str) -> Result<ScannerConfig, ParseError> {
    let mut config = ScannerConfig::default();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let line = strip_comment(raw).trim();
        let fail = |kind| ParseError {
            line: index + 1,
            kind,
        };

        if line.is_empty() {
            continue;
        }

        // Section header
        if let Some(header) = line.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or(fail(ParseErrorKind::InvalidSection))?;
            section = parse_section_header(name.trim()).ok_or(fail(ParseErrorKind::InvalidSection))?;
            continue;
        }

        let (key, value) = line
            .split_once('=')
            .ok_or(fail(ParseErrorKind::InvalidValue))?;
        apply_key(&mut config, section, key.trim(), value.trim()).map_err(fail)?;
    }

    Ok(config)
}

fn parse_section_header(name: &str) -> Option<Section> {
    match name {
        "servo.pan" => Some(Section::PanServo),
        "servo.tilt" => Some(Section::TiltServo),
        "motion" => Some(Section::Motion),
        "sensor" => Some(Section::Sensor),
        "scan" => Some(Section::Scan),
        _ => None,
    }
}

fn apply_key(
    config: &mut ScannerConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseErrorKind> {
    match section {
        Section::Root => return Err(ParseErrorKind::UnknownKey),
        Section::PanServo => apply_servo_key(&mut config.pan, key, value)?,
        Section::TiltServo => apply_servo_key(&mut config.tilt, key, value)?,
        Section::Motion => {
            let motion = &mut config.motion;
            match key {
                "tick_period_ms" => motion.tick_period_ms = parse_number(value)?,
                "pixel_move_ms" => motion.pixel_move_ms = parse_number(value)?,
                "origin_move_ms" => motion.origin_move_ms = parse_number(value)?,
                "settle_margin_ms" => motion.settle_margin_ms = parse_number(value)?,
                "profile" => {
                    motion.profile = Profile::from_str(parse_string(value)?)
                        .map_err(|_| ParseErrorKind::UnknownProfile)?
                }
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Sensor => {
            let sensor = &mut config.sensor;
            match key {
                "clk_pin" => sensor.clk_pin = parse_number(value)?,
                "st_pin" => sensor.st_pin = parse_number(value)?,
                "video_pin" => sensor.video_pin = parse_number(value)?,
                "integration_s" => sensor.integration_s = parse_number(value)?,
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
        Section::Scan => {
            let scan = &mut config.scan;
            match key {
                "log_name" => {
                    scan.log_name = String::try_from(parse_string(value)?)
                        .map_err(|_| ParseErrorKind::TooLong)?
                }
                "overwrite" => scan.overwrite = parse_bool(value)?,
                "extent_xy_deg" => scan.extent_xy_deg = parse_pair(value)?,
                "step_xy_deg" => scan.step_xy_deg = parse_pair(value)?,
                "path" => {
                    scan.path = PathKind::from_str(parse_string(value)?)
                        .map_err(|_| ParseErrorKind::UnknownPathKind)?
                }
                _ => return Err(ParseErrorKind::UnknownKey),
            }
        }
    }
    Ok(())
}

fn apply_servo_key(servo: &mut ServoConfig, key: &str, value: &str) -> Result<(), ParseErrorKind> {
    match key {
        "pin" => servo.pin = parse_number(value)?,
        "range_us" => servo.range_us = parse_pair(value)?,
        "range_deg" => servo.range_deg = parse_pair(value)?,
        "pwm_hz" => servo.pwm_hz = parse_number(value)?,
        "role" => {
            servo.role = AxisRole::from_str(parse_string(value)?)
                .map_err(|_| ParseErrorKind::UnknownRole)?
        }
        _ => return Err(ParseErrorKind::UnknownKey),
    }
    Ok(())
}

/// Cut a trailing `# comment`, ignoring `#` inside strings
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

fn parse_number<T: FromStr>(value: &str) -> Result<T, ParseErrorKind> {
    value.parse().map_err(|_| ParseErrorKind::InvalidValue)
}

fn parse_string(value: &str) -> Result<&str, ParseErrorKind> {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .ok_or(ParseErrorKind::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ParseErrorKind> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseErrorKind::InvalidValue),
    }
}

fn parse_pair<T: FromStr>(value: &str) -> Result<(T, T), ParseErrorKind> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseErrorKind::InvalidValue)?;
    let (a, b) = inner.split_once(',').ok_or(ParseErrorKind::InvalidValue)?;
    Ok((parse_number(a.trim())?, parse_number(b.trim())?))
}
