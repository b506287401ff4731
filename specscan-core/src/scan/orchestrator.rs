//! Scan orchestrator
//!
//! Walks a scan path one position per [`ScanOrchestrator::advance`] call:
//! move, wait for the motion to settle, acquire, append a pixel record.
//! Acquisition never starts while the head is moving.

use specscan_hal::{RecordStore, StorageError};

use super::path::{generate, PathKind, ScanPath, ScanPoint};
use crate::config::{ConfigError, MotionConfig};
use crate::log::{DateTime, Orientation, ScanHeader, ScanLog};
use crate::motion::{MotionError, MotionLink, MoveReport};
use crate::state::{ScanEvent, ScanState};
use crate::traits::SpectralSensor;

/// Motion slot of the pan servo
pub const SLOT_PAN: usize = 0;

/// Motion slot of the tilt servo
pub const SLOT_TILT: usize = 1;

/// Slots moved for every scan position, in (x, y) order
pub const SCAN_AXES: [usize; 2] = [SLOT_PAN, SLOT_TILT];

/// Shortest exposure a scan will use
pub const MIN_INTEGRATION_S: f32 = 0.001;

/// Errors from scan operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanError {
    /// Scan parameters rejected
    Config(ConfigError),
    /// Log could not be created or written
    Storage(StorageError),
    /// Head did not settle
    Motion(MotionError),
    /// A scan is already in progress
    Busy,
}

impl From<ConfigError> for ScanError {
    fn from(e: ConfigError) -> Self {
        ScanError::Config(e)
    }
}

impl From<StorageError> for ScanError {
    fn from(e: StorageError) -> Self {
        ScanError::Storage(e)
    }
}

impl From<MotionError> for ScanError {
    fn from(e: MotionError) -> Self {
        ScanError::Motion(e)
    }
}

/// Parameters of one scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanRequest<'a> {
    /// Record set name handed to the store
    pub log_name: &'a str,
    /// Replace an existing record set with the same name
    pub overwrite: bool,
    /// Field size (x, y) in degrees
    pub extent_xy_deg: (f32, f32),
    /// Pitch (x, y) in degrees
    pub step_xy_deg: (f32, f32),
    /// Exposure per frame; raised to [`MIN_INTEGRATION_S`]
    pub integration_s: f32,
    /// Visiting order
    pub path: PathKind,
    /// Capture time for the header
    pub captured_at: DateTime,
}

/// Sequencer for one scan at a time
pub struct ScanOrchestrator<M, A, S: RecordStore> {
    motion: M,
    sensor: A,
    store: S,
    timing: MotionConfig,
    state: ScanState,
    path: ScanPath,
    cursor: usize,
    skipped: usize,
    log: Option<ScanLog<S::Writer>>,
    last_move: Option<MoveReport>,
}

impl<M, A, S> ScanOrchestrator<M, A, S>
where
    M: MotionLink,
    A: SpectralSensor,
    S: RecordStore,
{
    /// Create an idle orchestrator
    pub fn new(motion: M, sensor: A, store: S, timing: MotionConfig) -> Self {
        Self {
            motion,
            sensor,
            store,
            timing,
            state: ScanState::Idle,
            path: ScanPath::empty(),
            cursor: 0,
            skipped: 0,
            log: None,
            last_move: None,
        }
    }

    /// Prepare a scan
    ///
    /// Generates the path, opens the log and writes the header and
    /// wavelength records, sets the exposure, then parks the head at the
    /// origin. On failure any opened log is closed and the orchestrator
    /// returns to idle.
    pub async fn setup(&mut self, request: &ScanRequest<'_>) -> Result<(), ScanError> {
        if self.state.is_active() {
            return Err(ScanError::Busy);
        }
        self.state = self.state.transition(ScanEvent::Setup);

        match self.configure(request).await {
            Ok(()) => {
                self.state = self.state.transition(ScanEvent::Configured);
                Ok(())
            }
            Err(e) => {
                // Setup error takes precedence
                let _ = self.close_log();
                self.path = ScanPath::empty();
                self.state = self.state.transition(ScanEvent::SetupFailed);
                Err(e)
            }
        }
    }

    async fn configure(&mut self, request: &ScanRequest<'_>) -> Result<(), ScanError> {
        let path = generate(request.path, request.extent_xy_deg, request.step_xy_deg)?;
        let integration_s = clamp_integration(request.integration_s);

        let writer = self.store.create(request.log_name, request.overwrite)?;
        let log = self.log.insert(ScanLog::new(writer));
        log.write_header(&ScanHeader {
            captured_at: request.captured_at,
            extent_xy_deg: request.extent_xy_deg,
            step_xy_deg: request.step_xy_deg,
            pixel_count: path.len(),
            channel_count: self.sensor.channel_count(),
            integration_s,
            path: request.path,
        })?;
        log.write_wavelengths(&self.sensor.wavelengths())?;

        self.sensor.set_integration_time_s(integration_s);
        self.move_and_settle(ScanPoint::ORIGIN, self.timing.origin_move_ms)
            .await?;

        self.path = path;
        self.cursor = 0;
        self.skipped = 0;
        Ok(())
    }

    /// Record the next position
    ///
    /// Returns `Ok(true)` after a pixel was recorded. Once the path is
    /// exhausted the log is closed, the head returns to the origin and
    /// `Ok(false)` is returned. Calls while idle return `Ok(false)`.
    ///
    /// A motion timeout or failed write leaves the cursor where it was,
    /// so the same position can be retried or the scan aborted.
    pub async fn advance(&mut self) -> Result<bool, ScanError> {
        if !self.state.acquisition_allowed() {
            return Ok(false);
        }

        let Some(point) = self.path.get(self.cursor) else {
            self.finish().await?;
            return Ok(false);
        };

        self.move_and_settle(point, self.timing.pixel_move_ms).await?;
        let frame = self.sensor.read();
        let log = self
            .log
            .as_mut()
            .ok_or(ScanError::Storage(StorageError::Unavailable))?;
        log.write_pixel(point, Orientation::default(), &frame)?;

        self.cursor += 1;
        Ok(true)
    }

    async fn finish(&mut self) -> Result<(), ScanError> {
        self.state = self.state.transition(ScanEvent::PathComplete);
        let closed = self.close_log();
        let homed = self
            .move_and_settle(ScanPoint::ORIGIN, self.timing.origin_move_ms)
            .await;
        self.state = self.state.transition(ScanEvent::Finalized);
        closed?;
        homed
    }

    /// Give up on the current position and move to the next one
    ///
    /// No record is written for the position and its sequence number stays
    /// unused, so the log shows a gap. Returns the skipped point, or `None`
    /// when no position is pending.
    pub fn skip(&mut self) -> Option<ScanPoint> {
        if !self.state.acquisition_allowed() {
            return None;
        }
        let point = self.path.get(self.cursor)?;
        if let Some(log) = self.log.as_mut() {
            log.skip_pixel();
        }
        self.cursor += 1;
        self.skipped += 1;
        Some(point)
    }

    /// Abandon the scan in progress
    ///
    /// The log is closed with whatever was recorded; the head is left
    /// where it is.
    pub fn abort(&mut self) -> Result<(), ScanError> {
        if !self.state.is_active() {
            return Ok(());
        }
        let closed = self.close_log();
        self.state = self.state.transition(ScanEvent::Abort);
        closed
    }

    async fn move_and_settle(&mut self, point: ScanPoint, duration_ms: u32) -> Result<(), ScanError> {
        let report = self.motion.start_move(
            &SCAN_AXES,
            &[point.x, point.y],
            duration_ms,
            self.timing.profile,
        );
        self.last_move = Some(report);
        self.motion
            .wait_settled(self.timing.settle_timeout_ms(duration_ms))
            .await?;
        Ok(())
    }

    fn close_log(&mut self) -> Result<(), ScanError> {
        let Some(mut log) = self.log.take() else {
            return Ok(());
        };
        let flushed = log.flush();
        let closed = self.store.close(log.into_inner());
        flushed.and(closed).map_err(ScanError::Storage)
    }

    /// Current scan state
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Index of the next position to record
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Positions given up with [`ScanOrchestrator::skip`]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Positions in the current scan
    pub fn pixel_count(&self) -> usize {
        self.path.len()
    }

    /// Path of the current scan
    pub fn path(&self) -> &ScanPath {
        &self.path
    }

    /// Outcome of the most recent move
    pub fn last_move(&self) -> Option<MoveReport> {
        self.last_move
    }

    /// Motion link
    pub fn motion(&self) -> &M {
        &self.motion
    }

    /// Motion link, mutably
    pub fn motion_mut(&mut self) -> &mut M {
        &mut self.motion
    }

    /// Spectral sensor
    pub fn sensor(&self) -> &A {
        &self.sensor
    }

    /// Record store
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Exposure actually used for a requested one
fn clamp_integration(seconds: f32) -> f32 {
    if seconds.is_nan() {
        MIN_INTEGRATION_S
    } else {
        seconds.max(MIN_INTEGRATION_S)
    }
}
