//! Servo capability trait
//!
//! Anything that turns an angle into a pulse width and can be commanded
//! to a pulse width qualifies as an axis of the motion controller.

use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What an axis physically does on the scanner head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AxisRole {
    /// Horizontal sweep
    Pan,
    /// Vertical sweep
    Tilt,
    /// Actuator attached to the sensor itself (shutter, filter wheel)
    Sensor,
}

impl AxisRole {
    /// Name used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisRole::Pan => "pan",
            AxisRole::Tilt => "tilt",
            AxisRole::Sensor => "sensor",
        }
    }
}

/// Unrecognised role name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownRole;

impl FromStr for AxisRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pan" => Ok(AxisRole::Pan),
            "tilt" => Ok(AxisRole::Tilt),
            "sensor" => Ok(AxisRole::Sensor),
            _ => Err(UnknownRole),
        }
    }
}

/// Trait for positional servos driven by pulse width
///
/// The motion controller plans in microseconds of pulse width. The
/// angle/pulse mapping, clamping and inversion belong to the device.
pub trait ServoDevice {
    /// Map a logical angle to a pulse width without moving
    ///
    /// Angles outside the device's range are clamped to the nearest end.
    fn angle_to_position_us(&self, angle_deg: f32) -> u16;

    /// Last commanded pulse width in microseconds
    fn position_us(&self) -> u16;

    /// Drive the output to a pulse width
    ///
    /// A width of `0` turns the output off.
    fn command_position_us(&mut self, position_us: u16);

    /// Stop generating pulses; the horn is left unpowered
    fn disable(&mut self);

    /// Hand the underlying output back to the board
    fn release(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed {
        us: u16,
        enabled: bool,
    }

    impl ServoDevice for Fixed {
        fn angle_to_position_us(&self, angle_deg: f32) -> u16 {
            (1500.0 + angle_deg * 10.0) as u16
        }

        fn position_us(&self) -> u16 {
            self.us
        }

        fn command_position_us(&mut self, position_us: u16) {
            self.us = position_us;
            self.enabled = position_us != 0;
        }

        fn disable(&mut self) {
            self.enabled = false;
        }
    }

    #[test]
    fn test_default_release_is_noop() {
        let mut servo = Fixed {
            us: 1500,
            enabled: true,
        };
        servo.release();
        assert_eq!(servo.position_us(), 1500);
        assert!(servo.enabled);
    }

    #[test]
    fn test_role_names() {
        for role in [AxisRole::Pan, AxisRole::Tilt, AxisRole::Sensor] {
            assert_eq!(role.as_str().parse(), Ok(role));
        }
        assert_eq!("roll".parse::<AxisRole>(), Err(UnknownRole));
    }

    #[test]
    fn test_mapping_does_not_move() {
        let servo = Fixed {
            us: 1500,
            enabled: true,
        };
        assert_eq!(servo.angle_to_position_us(20.0), 1700);
        assert_eq!(servo.position_us(), 1500);
    }
}
