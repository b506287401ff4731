//! Device capability traits
//!
//! These traits define the interface between the scan/motion logic
//! and the concrete servo and spectrometer drivers.

pub mod sensor;
pub mod servo;

pub use sensor::SpectralSensor;
pub use servo::{AxisRole, ServoDevice, UnknownRole};
