//! Spectral frames and wavelength calibration
//!
//! A frame is the raw output of one acquisition: one intensity sample per
//! channel plus the timestamps of each protocol phase. The wavelength table
//! maps channel index to nanometres and is derived once per sensor.

use heapless::Vec;

use crate::config::SensorCalibration;

/// Upper bound on channels per frame (C12880MA)
pub const MAX_CHANNELS: usize = 288;

/// Raw channel samples of one frame
pub type Samples = Vec<u16, MAX_CHANNELS>;

/// Monotonic timestamps (microseconds) of each acquisition phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionTimings {
    /// Start pulse raised and leading pulses sent; integration running
    pub integration_start_us: u64,
    /// Start pulse lowered
    pub start_low_us: u64,
    /// Integration-end pulses sent
    pub integration_end_us: u64,
    /// Pre-readout pulses sent; first channel is on the video line
    pub readout_start_us: u64,
    /// Last channel sampled
    pub readout_end_us: u64,
}

impl AcquisitionTimings {
    /// Effective exposure: start pulse high until integration end
    pub fn integration_us(&self) -> u64 {
        self.integration_end_us
            .saturating_sub(self.integration_start_us)
    }

    /// Time spent clocking channels out
    pub fn readout_us(&self) -> u64 {
        self.readout_end_us.saturating_sub(self.readout_start_us)
    }

    /// True when the timestamps were taken in protocol order
    pub fn is_ordered(&self) -> bool {
        self.integration_start_us <= self.start_low_us
            && self.start_low_us <= self.integration_end_us
            && self.integration_end_us <= self.readout_start_us
            && self.readout_start_us <= self.readout_end_us
    }
}

/// One acquisition's worth of samples
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpectralFrame {
    samples: Samples,
    /// Phase timestamps of the acquisition that produced this frame
    pub timings: AcquisitionTimings,
    /// Channels whose conversion failed and were recorded as 0
    pub conversion_faults: u16,
}

impl SpectralFrame {
    /// Assemble a frame from driver output
    pub fn new(samples: Samples, timings: AcquisitionTimings, conversion_faults: u16) -> Self {
        Self {
            samples,
            timings,
            conversion_faults,
        }
    }

    /// Samples in channel order
    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    /// Number of channels in the frame
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True for a frame without samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Calibrated wavelength (nm) per channel
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WavelengthTable {
    wavelengths_nm: Vec<f32, MAX_CHANNELS>,
}

impl WavelengthTable {
    /// Evaluate the calibration polynomial for every channel
    ///
    /// Channel `i` is evaluated at `x = i + 1`. Channel counts above
    /// [`MAX_CHANNELS`] are truncated.
    pub fn from_calibration(calibration: &SensorCalibration) -> Self {
        let channels = calibration.channels.min(MAX_CHANNELS);
        let mut wavelengths_nm = Vec::new();
        for i in 0..channels {
            // Capacity checked above
            let _ = wavelengths_nm.push(calibration.wavelength_nm(i));
        }
        Self { wavelengths_nm }
    }

    /// Wavelengths in channel order
    pub fn as_slice(&self) -> &[f32] {
        &self.wavelengths_nm
    }

    /// Number of channels covered
    pub fn len(&self) -> usize {
        self.wavelengths_nm.len()
    }

    /// True for an empty table
    pub fn is_empty(&self) -> bool {
        self.wavelengths_nm.is_empty()
    }

    /// True when every channel is strictly longer than the previous one
    pub fn is_strictly_increasing(&self) -> bool {
        self.wavelengths_nm.windows(2).all(|w| w[0] < w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c12880ma_table_is_monotonic() {
        let table = WavelengthTable::from_calibration(&SensorCalibration::C12880MA);
        assert_eq!(table.len(), 288);
        assert!(table.is_strictly_increasing());
    }

    #[test]
    fn test_c12880ma_table_endpoints() {
        let table = WavelengthTable::from_calibration(&SensorCalibration::C12880MA);
        let first = table.as_slice()[0];
        let last = table.as_slice()[287];
        assert!((first - 317.9).abs() < 0.5, "first = {}", first);
        assert!((last - 886.7).abs() < 0.5, "last = {}", last);
    }

    #[test]
    fn test_table_truncates_to_capacity() {
        let calibration = SensorCalibration {
            channels: 1000,
            ..SensorCalibration::C12880MA
        };
        let table = WavelengthTable::from_calibration(&calibration);
        assert_eq!(table.len(), MAX_CHANNELS);
    }

    #[test]
    fn test_timings_integration_window() {
        let timings = AcquisitionTimings {
            integration_start_us: 100,
            start_low_us: 10_000,
            integration_end_us: 10_096,
            readout_start_us: 10_176,
            readout_end_us: 10_752,
        };
        assert!(timings.is_ordered());
        assert_eq!(timings.integration_us(), 9_996);
        assert_eq!(timings.readout_us(), 576);
    }

    #[test]
    fn test_frame_accessors() {
        let mut samples = Samples::new();
        samples.extend_from_slice(&[1, 2, 3]).unwrap();
        let frame = SpectralFrame::new(samples, AcquisitionTimings::default(), 1);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.samples(), &[1, 2, 3]);
        assert_eq!(frame.conversion_faults, 1);
        assert!(!frame.is_empty());
    }
}
