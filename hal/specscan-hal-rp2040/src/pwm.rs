//! Servo PWM channels
//!
//! The slice counter is divided down to 1 MHz so one count is one
//! microsecond of pulse width; `top` then sets the frame rate
//! (20 000 counts = 20 ms = 50 Hz).

use embassy_rp::clocks::clk_sys_freq;
use embassy_rp::pwm::{Config, PwmOutput};
use embedded_hal::pwm::SetDutyCycle;
use specscan_hal::PwmChannel;

/// Counter rate used for servo slices
pub const COUNTER_HZ: u32 = 1_000_000;

/// Slice configuration for servo pulses at `frequency_hz`
///
/// Both outputs start with a zero compare value, so nothing is emitted
/// until the first duty is set.
pub fn servo_config(frequency_hz: u32) -> Config {
    let divider = (clk_sys_freq() / COUNTER_HZ).clamp(1, 255) as u8;
    let top = (COUNTER_HZ / frequency_hz.max(16)).saturating_sub(1).min(u16::MAX as u32) as u16;

    let mut config = Config::default();
    config.divider = divider.into();
    config.top = top;
    config.compare_a = 0;
    config.compare_b = 0;
    config
}

/// One output of a servo PWM slice
pub struct ServoOutput<'d> {
    output: PwmOutput<'d>,
    frequency_hz: u32,
    released: bool,
}

impl<'d> ServoOutput<'d> {
    /// Wrap one half of a slice configured with [`servo_config`]
    pub fn new(output: PwmOutput<'d>, frequency_hz: u32) -> Self {
        Self {
            output,
            frequency_hz,
            released: false,
        }
    }
}

impl PwmChannel for ServoOutput<'_> {
    fn max_duty(&self) -> u16 {
        self.output.max_duty_cycle()
    }

    fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    fn set_duty(&mut self, duty: u16) {
        if self.released {
            return;
        }
        // PwmOutput duty updates cannot fail
        let _ = self.output.set_duty_cycle(duty);
    }

    fn release(&mut self) {
        let _ = self.output.set_duty_cycle_fully_off();
        self.released = true;
    }
}
