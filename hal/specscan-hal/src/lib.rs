//! Specscan Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the scanner logic is written
//! against. Chip-specific crates (currently RP2040) implement them, and the
//! host test suites implement them with mocks.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  specscan-firmware                      │
//! └─────────────────────────────────────────┘
//!          │                    │
//!          ▼                    ▼
//! ┌─────────────────┐  ┌─────────────────────┐
//! │ specscan-core   │  │ specscan-drivers    │
//! └─────────────────┘  └─────────────────────┘
//!          │                    │
//!          ▼                    ▼
//! ┌─────────────────────────────────────────┐
//! │  specscan-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//!          ┌─────────────────────┐
//!          │ specscan-hal-rp2040 │
//!          └─────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Digital outputs (sensor clock and start lines)
//! - [`adc::AnalogInput`] - Single-shot analog conversion (sensor video line)
//! - [`pwm::PwmChannel`] - Servo pulse output
//! - [`time::Monotonic`] - Free-running microsecond clock
//! - [`storage::RecordStore`] - Destination for scan logs

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
pub mod pwm;
pub mod storage;
pub mod time;

// Re-export key traits at crate root for convenience
pub use adc::{AdcError, AnalogInput};
pub use gpio::OutputPin;
pub use pwm::PwmChannel;
pub use storage::{RecordStore, StorageError};
pub use time::Monotonic;
