//! Analog input abstraction

/// Errors from an analog conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// The converter did not complete in time
    Timeout,
    /// The converter reported a conversion fault
    Conversion,
}

/// Single-shot analog input
///
/// One call performs one blocking conversion. Used for the spectrometer
/// video line, which is valid only between two clock edges, so
/// implementations must not add buffering or averaging.
pub trait AnalogInput {
    /// Resolution of a conversion in bits (e.g. 12)
    fn resolution_bits(&self) -> u8;

    /// Perform one conversion and return the raw code
    fn read(&mut self) -> Result<u16, AdcError>;

    /// Largest code this input can return
    fn max_code(&self) -> u16 {
        ((1u32 << self.resolution_bits()) - 1) as u16
    }
}
