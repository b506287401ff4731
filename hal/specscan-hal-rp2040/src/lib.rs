//! RP2040-specific HAL for the spectral scanner
//!
//! This crate provides RP2040 (embassy-rp) implementations of the shared
//! `specscan-hal` traits, plus RP2040-specific pin bookkeeping:
//!
//! - GPIO outputs and allocation checks for config-driven pin numbers
//! - ADC channel mapping and the blocking sensor video input
//! - Servo PWM channels at 1 µs resolution
//! - Microsecond clock over `embassy_time`
//! - Scan log storage streamed over a UART

#![no_std]

pub mod adc;
pub mod gpio;
pub mod pwm;
pub mod storage;
pub mod time;

pub use adc::{AdcChannel, VideoInput};
pub use gpio::{GpioAllocator, PinError, PushPull};
pub use pwm::{servo_config, ServoOutput};
pub use storage::{UartRecordStore, UartSink};
pub use time::EmbassyClock;
