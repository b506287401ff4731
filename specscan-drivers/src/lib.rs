//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in specscan-core, written against the specscan-hal pin, PWM, ADC and
//! clock traits:
//!
//! - Hobby servos on a PWM channel
//! - Hamamatsu C12880MA line-array spectrometer (bit-banged readout)

#![no_std]
#![deny(unsafe_code)]

// Host tests use std collections for mocks
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod sensor;
pub mod servo;
