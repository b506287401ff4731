//! GPIO outputs and pin bookkeeping
//!
//! Pin numbers in the scanner config are checked against each other before
//! any peripheral is touched, so a config that puts two functions on one
//! pin is reported instead of silently miswiring the head.

use embassy_rp::gpio::Output;
use heapless::FnvIndexSet;
use specscan_hal::OutputPin;

/// Number of user GPIOs on RP2040
pub const GPIO_COUNT: u8 = 30;

/// Errors from pin allocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range (0-29 valid)
    InvalidPin,
    /// Pin already assigned to another function
    AlreadyTaken,
}

/// Tracks which GPIO pins have been assigned
pub struct GpioAllocator {
    allocated: FnvIndexSet<u8, 32>,
}

impl Default for GpioAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self {
            allocated: FnvIndexSet::new(),
        }
    }

    /// Claim a pin
    pub fn allocate(&mut self, pin: u8) -> Result<(), PinError> {
        if pin >= GPIO_COUNT {
            return Err(PinError::InvalidPin);
        }
        if self.allocated.contains(&pin) {
            return Err(PinError::AlreadyTaken);
        }
        self.allocated
            .insert(pin)
            .map(|_| ())
            .map_err(|_| PinError::InvalidPin)
    }

    /// Claim every pin in `pins`, stopping at the first conflict
    ///
    /// Returns the offending pin with the error.
    pub fn allocate_all(&mut self, pins: &[u8]) -> Result<(), (u8, PinError)> {
        for &pin in pins {
            self.allocate(pin).map_err(|e| (pin, e))?;
        }
        Ok(())
    }

    /// Release a pin
    pub fn release(&mut self, pin: u8) {
        self.allocated.remove(&pin);
    }

    /// Check if a pin is claimed
    pub fn is_allocated(&self, pin: u8) -> bool {
        self.allocated.contains(&pin)
    }

    /// Number of claimed pins
    pub fn allocated_count(&self) -> usize {
        self.allocated.len()
    }
}

/// Push-pull output driving a sensor control line
pub struct PushPull<'d> {
    pin: Output<'d>,
}

impl<'d> PushPull<'d> {
    /// Wrap a configured output
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }
}

impl OutputPin for PushPull<'_> {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator() {
        let mut alloc = GpioAllocator::new();

        assert!(alloc.allocate(16).is_ok());
        assert!(alloc.is_allocated(16));
        assert_eq!(alloc.allocate(16), Err(PinError::AlreadyTaken));
        assert_eq!(alloc.allocate(30), Err(PinError::InvalidPin));

        alloc.release(16);
        assert!(!alloc.is_allocated(16));
        assert!(alloc.allocate(16).is_ok());
    }

    #[test]
    fn test_allocate_all_reports_conflict() {
        let mut alloc = GpioAllocator::new();
        assert_eq!(
            alloc.allocate_all(&[16, 17, 2, 17]),
            Err((17, PinError::AlreadyTaken))
        );
        assert_eq!(alloc.allocated_count(), 3);
    }
}
