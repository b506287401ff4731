//! PWM output abstraction for hobby servos

/// One PWM output channel
///
/// Servos are positioned by pulse width; the driver converts microseconds
/// into a duty value using [`PwmChannel::max_duty`] and
/// [`PwmChannel::frequency_hz`].
pub trait PwmChannel {
    /// Duty value corresponding to a 100% duty cycle
    fn max_duty(&self) -> u16;

    /// PWM frame frequency in Hz (50 for standard servos)
    fn frequency_hz(&self) -> u32;

    /// Apply a new duty value; 0 stops the pulse train
    fn set_duty(&mut self, duty: u16);

    /// Release the underlying peripheral
    ///
    /// After this call the channel must not be used again.
    fn release(&mut self) {}
}
