//! Scan state definition

use super::events::ScanEvent;

/// Scan states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// No scan in progress
    #[default]
    Idle,
    /// Opening the log and parking the head
    Configuring,
    /// Visiting positions and recording frames
    Scanning,
    /// Closing the log and returning to the origin
    Finalizing,
}

impl ScanState {
    /// Check if a scan is in progress
    pub fn is_active(&self) -> bool {
        !matches!(self, ScanState::Idle)
    }

    /// Check if this state records frames
    pub fn acquisition_allowed(&self) -> bool {
        matches!(self, ScanState::Scanning)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: ScanEvent) -> Self {
        use ScanEvent::*;
        use ScanState::*;

        match (self, event) {
            (Idle, Setup) => Configuring,

            (Configuring, Configured) => Scanning,
            (Configuring, SetupFailed) => Idle,
            (Configuring, Abort) => Idle,

            (Scanning, PathComplete) => Finalizing,
            (Scanning, Abort) => Idle,

            (Finalizing, Finalized) => Idle,
            (Finalizing, Abort) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
