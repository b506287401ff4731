//! Embassy async tasks
//!
//! Each task runs independently and communicates via signals.

pub mod scan;
pub mod tick;

pub use scan::scan_task;
pub use tick::tick_task;
