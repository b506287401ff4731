//! Hobby servo on a PWM channel
//!
//! Position is set by pulse width within a 50 Hz frame. The driver maps a
//! logical angle range onto the servo's usable pulse-width range:
//! - Angles outside the range are clamped to the nearest end
//! - A range given high-to-low (e.g. 45..-45) mirrors the servo, for
//!   heads where the horn is mounted the other way round
//! - A pulse width of 0 stops the pulse train and leaves the horn limp
//!
//! # Usage
//!
//! ```ignore
//! let mut pan = PwmServo::from_config(pwm, &ServoConfig::PAN);
//! let target = pan.angle_to_position_us(10.0);
//! pan.command_position_us(target);
//! ```

use specscan_core::config::ServoConfig;
use specscan_core::traits::ServoDevice;
use specscan_hal::PwmChannel;

/// Mapping between logical angle and pulse width
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServoRange {
    min_us: u16,
    max_us: u16,
    min_deg: f32,
    max_deg: f32,
    inverted: bool,
}

impl ServoRange {
    /// Build a range from pulse-width and angle end points
    ///
    /// `range_deg.0 > range_deg.1` inverts the direction of travel.
    pub fn new(range_us: (u16, u16), range_deg: (f32, f32)) -> Self {
        Self {
            min_us: range_us.0.min(range_us.1),
            max_us: range_us.0.max(range_us.1),
            min_deg: range_deg.0.min(range_deg.1),
            max_deg: range_deg.0.max(range_deg.1),
            inverted: range_deg.0 > range_deg.1,
        }
    }

    /// Pulse-width limits (min, max)
    pub fn us(&self) -> (u16, u16) {
        (self.min_us, self.max_us)
    }

    /// True when travel is mirrored
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Pulse width for a logical angle, before inversion
    pub fn angle_to_us(&self, angle_deg: f32) -> u16 {
        let span_deg = self.max_deg - self.min_deg;
        if span_deg.is_nan() || span_deg <= 0.0 || angle_deg.is_nan() {
            return self.min_us;
        }
        let angle = angle_deg.clamp(self.min_deg, self.max_deg);
        let span_us = (self.max_us - self.min_us) as f32;
        self.min_us + (span_us * (angle - self.min_deg) / span_deg) as u16
    }

    /// Clamp a pulse width into the range
    pub fn clamp_us(&self, position_us: u16) -> u16 {
        position_us.clamp(self.min_us, self.max_us)
    }

    /// Pulse width actually emitted for a commanded one
    pub fn output_us(&self, position_us: u16) -> u16 {
        let t = self.clamp_us(position_us);
        if self.inverted {
            self.max_us - t + self.min_us
        } else {
            t
        }
    }
}

/// Positional servo driven by one PWM channel
pub struct PwmServo<P> {
    pwm: P,
    range: ServoRange,
    position_us: u16,
    enabled: bool,
}

impl<P: PwmChannel> PwmServo<P> {
    /// Create a servo; no pulse is emitted until the first command
    ///
    /// The reported position starts at the pulse width for 0 degrees
    /// (clamped into range).
    pub fn new(pwm: P, range: ServoRange) -> Self {
        Self {
            pwm,
            range,
            position_us: range.angle_to_us(0.0),
            enabled: false,
        }
    }

    /// Create a servo from its configuration
    pub fn from_config(pwm: P, config: &ServoConfig) -> Self {
        Self::new(pwm, ServoRange::new(config.range_us, config.range_deg))
    }

    /// Angle/pulse mapping
    pub fn range(&self) -> &ServoRange {
        &self.range
    }

    /// True while pulses are being emitted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Underlying channel
    pub fn channel(&self) -> &P {
        &self.pwm
    }

    /// Duty value for an emitted pulse width: `t * max_duty * f / 1e6`
    fn duty_for(&self, pulse_us: u16) -> u16 {
        let max_duty = self.pwm.max_duty() as u64;
        let duty = pulse_us as u64 * max_duty * self.pwm.frequency_hz() as u64 / 1_000_000;
        duty.min(max_duty) as u16
    }
}

impl<P: PwmChannel> ServoDevice for PwmServo<P> {
    fn angle_to_position_us(&self, angle_deg: f32) -> u16 {
        self.range.angle_to_us(angle_deg)
    }

    fn position_us(&self) -> u16 {
        self.position_us
    }

    fn command_position_us(&mut self, position_us: u16) {
        if position_us == 0 {
            self.disable();
            return;
        }
        let t = self.range.clamp_us(position_us);
        let duty = self.duty_for(self.range.output_us(t));
        self.pwm.set_duty(duty);
        self.position_us = t;
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.pwm.set_duty(0);
        self.enabled = false;
    }

    fn release(&mut self) {
        self.disable();
        self.pwm.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 50 Hz channel with 1 us duty resolution
    struct MockPwm {
        duty: u16,
        released: bool,
    }

    impl MockPwm {
        fn new() -> Self {
            Self {
                duty: 0,
                released: false,
            }
        }
    }

    impl PwmChannel for MockPwm {
        fn max_duty(&self) -> u16 {
            20_000
        }

        fn frequency_hz(&self) -> u32 {
            50
        }

        fn set_duty(&mut self, duty: u16) {
            self.duty = duty;
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    #[test]
    fn test_angle_mapping_pan() {
        let range = ServoRange::new((1010, 1931), (-45.0, 45.0));
        assert_eq!(range.angle_to_us(-45.0), 1010);
        assert_eq!(range.angle_to_us(45.0), 1931);
        assert_eq!(range.angle_to_us(0.0), 1470);
    }

    #[test]
    fn test_angle_clamped() {
        let range = ServoRange::new((600, 2400), (0.0, 180.0));
        assert_eq!(range.angle_to_us(-30.0), 600);
        assert_eq!(range.angle_to_us(200.0), 2400);
        assert_eq!(range.angle_to_us(f32::NAN), 600);
    }

    #[test]
    fn test_degenerate_angle_range() {
        let range = ServoRange::new((1000, 2000), (10.0, 10.0));
        assert_eq!(range.angle_to_us(10.0), 1000);
    }

    #[test]
    fn test_inverted_range_mirrors_output() {
        let range = ServoRange::new((1000, 2000), (45.0, -45.0));
        assert!(range.is_inverted());
        assert_eq!(range.output_us(1000), 2000);
        assert_eq!(range.output_us(1250), 1750);
        assert_eq!(range.output_us(1500), 1500);
    }

    #[test]
    fn test_initial_position_is_zero_degrees() {
        let servo = PwmServo::from_config(MockPwm::new(), &ServoConfig::TILT);
        assert_eq!(servo.position_us(), ServoConfig::TILT.range_us.0 + 441);
        assert!(!servo.is_enabled());
        assert_eq!(servo.channel().duty, 0);
    }

    #[test]
    fn test_duty_follows_pulse_width() {
        let mut servo = PwmServo::from_config(MockPwm::new(), &ServoConfig::GENERIC);
        servo.command_position_us(1500);
        // 1500 us of a 20 ms frame at 20000 counts
        assert_eq!(servo.channel().duty, 1500);
        assert_eq!(servo.position_us(), 1500);
        assert!(servo.is_enabled());
    }

    #[test]
    fn test_command_clamped_to_range() {
        let mut servo = PwmServo::from_config(MockPwm::new(), &ServoConfig::PAN);
        servo.command_position_us(2500);
        assert_eq!(servo.position_us(), 1931);
        assert_eq!(servo.channel().duty, 1931);
    }

    #[test]
    fn test_inverted_servo_duty() {
        let config = ServoConfig {
            range_deg: (45.0, -45.0),
            ..ServoConfig::PAN
        };
        let mut servo = PwmServo::from_config(MockPwm::new(), &config);
        servo.command_position_us(1010);
        assert_eq!(servo.position_us(), 1010);
        assert_eq!(servo.channel().duty, 1931);
    }

    #[test]
    fn test_zero_width_turns_off() {
        let mut servo = PwmServo::from_config(MockPwm::new(), &ServoConfig::PAN);
        servo.command_position_us(1500);
        servo.command_position_us(0);
        assert_eq!(servo.channel().duty, 0);
        assert!(!servo.is_enabled());
        // Last real position is kept
        assert_eq!(servo.position_us(), 1500);
    }

    #[test]
    fn test_release() {
        let mut servo = PwmServo::from_config(MockPwm::new(), &ServoConfig::PAN);
        servo.command_position_us(1500);
        servo.release();
        assert_eq!(servo.channel().duty, 0);
        assert!(servo.channel().released);
    }
}
