//! Scan planning and orchestration
//!
//! The path generator decides where the head points; the orchestrator
//! walks that path one position at a time, waiting for motion to settle
//! before each acquisition and streaming every frame to the scan log.

pub mod orchestrator;
pub mod path;

pub use orchestrator::{
    ScanError, ScanOrchestrator, ScanRequest, MIN_INTEGRATION_S, SCAN_AXES, SLOT_PAN, SLOT_TILT,
};
pub use path::{generate, pixel_count, PathKind, ScanPath, ScanPoint, MAX_PATH_POINTS};
