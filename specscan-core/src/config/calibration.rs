//! Spectrometer calibration data
//!
//! Pulse counts of the readout protocol and the factory wavelength
//! polynomial. These come from the sensor datasheet and the per-unit
//! calibration sheet, not from the config file.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Protocol constants and wavelength calibration for a line-array sensor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorCalibration {
    /// Pixels per frame
    pub channels: usize,
    /// Clock pulses sent with the start line low before each frame
    pub priming_pulses: u32,
    /// Clock pulses after raising the start line, before integration timing begins
    pub start_pulses: u32,
    /// Clock pulses after lowering the start line that end integration
    pub integration_end_pulses: u32,
    /// Further clock pulses before the first pixel appears on the video line
    pub readout_lead_pulses: u32,
    /// Half period of the bit-banged clock in microseconds
    pub clock_half_period_us: u32,
    /// Wavelength polynomial A0, B1..B5 (nm, evaluated at pixel number)
    pub coefficients: [f64; 6],
}

impl SensorCalibration {
    /// Hamamatsu C12880MA with the reference unit's calibration sheet
    pub const C12880MA: Self = Self {
        channels: 288,
        priming_pulses: 1,
        start_pulses: 3,
        integration_end_pulses: 48,
        readout_lead_pulses: 40,
        clock_half_period_us: 1,
        coefficients: [
            3.152446842e+2,
            2.688494791,
            -8.964262020e-4,
            -1.030880174e-5,
            2.083514791e-8,
            -1.290505933e-11,
        ],
    };

    /// Wavelength of a channel in nanometres
    ///
    /// Channel `i` corresponds to pixel number `i + 1`.
    pub fn wavelength_nm(&self, channel: usize) -> f32 {
        let x = (channel + 1) as f64;
        let nm = self
            .coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c);
        nm as f32
    }

    /// Clock pulses from lowering the start line to the first pixel
    pub fn pulses_to_first_pixel(&self) -> u32 {
        self.integration_end_pulses + self.readout_lead_pulses
    }
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self::C12880MA
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_channel_wavelength() {
        let c = SensorCalibration::C12880MA;
        // A0 + B1 + B2 + ... at x = 1
        let expected: f64 = c.coefficients.iter().sum();
        assert!((c.wavelength_nm(0) as f64 - expected).abs() < 1e-3);
    }

    #[test]
    fn test_adjacent_channels_at_least_one_nm_apart() {
        let c = SensorCalibration::C12880MA;
        for i in 1..c.channels {
            let step = c.wavelength_nm(i) - c.wavelength_nm(i - 1);
            assert!(step > 1.0, "channel {} step {}", i, step);
        }
    }

    #[test]
    fn test_first_pixel_after_88_pulses() {
        assert_eq!(SensorCalibration::C12880MA.pulses_to_first_pixel(), 88);
    }
}
