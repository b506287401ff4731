//! State machine for scan execution
//!
//! Defines the lifecycle of a scan. The state machine is explicit,
//! finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::ScanEvent;
pub use machine::ScanState;
