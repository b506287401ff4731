//! Board-agnostic core logic for the spectral scanner firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Capability traits for servos and spectral sensors
//! - Trajectory planning and the multi-axis motion controller
//! - Scan path generation
//! - Scan orchestration and its state machine
//! - The scan log record format (writer and reader)
//! - Configuration types and the config-file parser

#![no_std]
#![deny(unsafe_code)]

// Host tests use std collections for mocks
#[cfg(test)]
#[macro_use]
extern crate std;

pub mod config;
pub mod log;
pub mod motion;
pub mod scan;
pub mod spectrum;
pub mod state;
pub mod traits;
