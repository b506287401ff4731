//! Microsecond clock over the embassy time driver

use embassy_time::Instant;
use specscan_hal::Monotonic;

/// Monotonic clock backed by the RP2040 timer
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl Monotonic for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }
}
