//! Events that trigger scan state transitions

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanEvent {
    /// A scan was requested
    Setup,
    /// Log opened, header written and head parked at the origin
    Configured,
    /// Setup could not complete
    SetupFailed,
    /// Every position on the path has been recorded
    PathComplete,
    /// Log closed and head returned to the origin
    Finalized,
    /// Scan abandoned by the caller
    Abort,
}
