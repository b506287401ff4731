//! Hardware and scan configuration types
//!
//! Pin numbers refer to RP2040 GPIOs. Defaults reproduce the reference
//! scanner head: two hobby servos on a pan/tilt bracket and a C12880MA on
//! a bit-banged clock.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::motion::Profile;
use crate::scan::PathKind;
use crate::traits::AxisRole;

/// Maximum length of a scan log name
pub const MAX_LOG_NAME_LEN: usize = 32;

/// One positional servo
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ServoConfig {
    /// PWM output GPIO
    pub pin: u8,
    /// Pulse width at each end of travel (min, max)
    pub range_us: (u16, u16),
    /// Logical angle at each end of travel; `a > b` inverts the servo
    pub range_deg: (f32, f32),
    /// PWM frame rate
    pub pwm_hz: u32,
    /// What the axis does on the head
    pub role: AxisRole,
}

impl ServoConfig {
    /// Pan servo of the reference head
    pub const PAN: Self = Self {
        pin: 16,
        range_us: (1010, 1931),
        range_deg: (-45.0, 45.0),
        pwm_hz: 50,
        role: AxisRole::Pan,
    };

    /// Tilt servo of the reference head
    pub const TILT: Self = Self {
        pin: 17,
        range_us: (1033, 1916),
        range_deg: (-45.0, 45.0),
        pwm_hz: 50,
        role: AxisRole::Tilt,
    };

    /// Generic full-travel hobby servo
    pub const GENERIC: Self = Self {
        pin: 0,
        range_us: (600, 2400),
        range_deg: (0.0, 180.0),
        pwm_hz: 50,
        role: AxisRole::Pan,
    };
}

/// Motion timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotionConfig {
    /// Interval between trajectory ticks
    pub tick_period_ms: u32,
    /// Move duration between adjacent scan positions
    pub pixel_move_ms: u32,
    /// Move duration to and from the origin
    pub origin_move_ms: u32,
    /// Slack added to the settle wait on top of twice the move duration
    pub settle_margin_ms: u32,
    /// Velocity profile for scan moves
    pub profile: Profile,
}

impl MotionConfig {
    /// How long to wait for a move of `duration_ms` to settle
    pub fn settle_timeout_ms(&self, duration_ms: u32) -> u32 {
        duration_ms
            .saturating_mul(2)
            .saturating_add(self.settle_margin_ms)
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 2,
            pixel_move_ms: 200,
            origin_move_ms: 1000,
            settle_margin_ms: 500,
            profile: Profile::Linear,
        }
    }
}

/// Spectrometer wiring and exposure
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorConfig {
    /// Clock output GPIO
    pub clk_pin: u8,
    /// Start-pulse output GPIO
    pub st_pin: u8,
    /// Video (analog) input GPIO; must be ADC capable
    pub video_pin: u8,
    /// Default exposure in seconds
    pub integration_s: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            clk_pin: 2,
            st_pin: 3,
            video_pin: 26,
            integration_s: 0.01,
        }
    }
}

/// Scan parameters used when none are supplied at run time
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScanDefaults {
    /// Record set name handed to the store
    pub log_name: String<MAX_LOG_NAME_LEN>,
    /// Replace an existing record set with the same name
    pub overwrite: bool,
    /// Angular field (x, y) in degrees
    pub extent_xy_deg: (f32, f32),
    /// Angular pitch between positions (x, y) in degrees
    pub step_xy_deg: (f32, f32),
    /// Order in which positions are visited
    pub path: PathKind,
}

impl Default for ScanDefaults {
    fn default() -> Self {
        let mut log_name = String::new();
        // Fits MAX_LOG_NAME_LEN
        let _ = log_name.push_str("scan.txt");
        Self {
            log_name,
            overwrite: true,
            extent_xy_deg: (30.0, 30.0),
            step_xy_deg: (5.0, 5.0),
            path: PathKind::Spiral,
        }
    }
}

/// Complete scanner configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScannerConfig {
    /// Horizontal axis
    pub pan: ServoConfig,
    /// Vertical axis
    pub tilt: ServoConfig,
    /// Motion timing
    pub motion: MotionConfig,
    /// Spectrometer
    pub sensor: SensorConfig,
    /// Scan defaults
    pub scan: ScanDefaults,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            pan: ServoConfig::PAN,
            tilt: ServoConfig::TILT,
            motion: MotionConfig::default(),
            sensor: SensorConfig::default(),
            scan: ScanDefaults::default(),
        }
    }
}
