//! Spectral sensor capability trait

use crate::spectrum::{SpectralFrame, WavelengthTable};

/// Trait for line-array spectrometers
///
/// One call to [`SpectralSensor::read`] produces one complete frame.
/// Reads run to completion and cannot be cancelled.
pub trait SpectralSensor {
    /// Number of pixels in every frame
    fn channel_count(&self) -> usize;

    /// Set the exposure for subsequent reads
    ///
    /// Negative and non-finite values are treated as zero.
    fn set_integration_time_s(&mut self, seconds: f32);

    /// Current exposure in seconds
    fn integration_time_s(&self) -> f32;

    /// Acquire one frame
    fn read(&mut self) -> SpectralFrame;

    /// Calibrated wavelength of every channel
    fn wavelengths(&self) -> WavelengthTable;
}
