//! Motion planning and control
//!
//! Trajectory planning per axis, the multi-axis controller that steps
//! those plans on a periodic tick, and the link the scan logic uses to
//! start moves and wait for them to settle.

pub mod controller;
pub mod link;
pub mod trajectory;

pub use controller::{MotionController, MotionError, MotionState, MoveReport, DEFAULT_TICK_PERIOD_MS};
pub use link::MotionLink;
pub use trajectory::{Profile, TrajectoryPlan, UnknownProfile, MAX_EASED_STEPS};
