//! Motion controller shared between the scan and tick tasks
//!
//! The controller lives in a critical-section mutex. The scan task starts
//! moves through [`SharedMotion`] and then awaits [`SETTLED`]; the tick task
//! is woken by [`ARM`] and steps the controller until it reports idle.

use core::cell::RefCell;

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{with_timeout, Duration};

use specscan_core::motion::{MotionController, MotionError, MotionLink, MoveReport, Profile};
use specscan_drivers::servo::PwmServo;
use specscan_hal_rp2040::ServoOutput;

use crate::channels::{ARM, SETTLED};

/// Pan and tilt
pub const AXIS_COUNT: usize = 2;

/// Servo as wired on the board
pub type BoardServo = PwmServo<ServoOutput<'static>>;

/// Controller for the board's axes
pub type Controller = MotionController<BoardServo, AXIS_COUNT>;

/// Controller behind a critical-section mutex
pub type SharedController = Mutex<CriticalSectionRawMutex, RefCell<Controller>>;

/// Scan-side handle on the shared controller
pub struct SharedMotion {
    controller: &'static SharedController,
}

impl SharedMotion {
    /// Wrap the shared controller
    pub fn new(controller: &'static SharedController) -> Self {
        Self { controller }
    }

    fn is_moving(&self) -> bool {
        self.controller.lock(|c| c.borrow().is_moving())
    }

    /// Stop emitting pulses on every axis
    pub fn turn_all_off(&mut self, release: bool) {
        self.controller.lock(|c| c.borrow_mut().turn_all_off(release));
    }
}

impl MotionLink for SharedMotion {
    fn start_move(
        &mut self,
        slots: &[usize],
        angles_deg: &[f32],
        duration_ms: u32,
        profile: Profile,
    ) -> MoveReport {
        let report = self
            .controller
            .lock(|c| c.borrow_mut().move_axes(slots, angles_deg, duration_ms, profile));

        if report.downgraded {
            warn!(
                "Eased move of {} steps exceeds plan capacity, using linear",
                report.step_count
            );
        }

        // Drop any completion left over from a preempted move
        SETTLED.reset();
        ARM.signal(());
        report
    }

    async fn wait_settled(&mut self, timeout_ms: u32) -> Result<(), MotionError> {
        let settle = async {
            while self.is_moving() {
                SETTLED.wait().await;
            }
        };

        with_timeout(Duration::from_millis(timeout_ms as u64), settle)
            .await
            .map_err(|_| MotionError::Timeout)
    }
}
