//! Multi-axis motion controller
//!
//! Owns every servo axis and moves them together along time-bounded
//! trajectories. Time advances only through [`MotionController::tick`],
//! which the firmware calls from a periodic task every
//! [`MotionController::tick_period_ms`].

use super::trajectory::{Profile, TrajectoryPlan};
use crate::traits::{AxisRole, ServoDevice};

/// Default interval between ticks
pub const DEFAULT_TICK_PERIOD_MS: u32 = 2;

/// Controller-wide motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionState {
    /// No move in progress; ticks do nothing
    Idle,
    /// At least one axis has steps remaining
    Moving,
}

/// Errors from motion operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionError {
    /// Axis slot beyond the controller's capacity
    SlotOutOfRange,
    /// Motion did not settle within the allowed time
    Timeout,
}

/// Outcome of starting a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveReport {
    /// Ticks the move will take; 0 for an immediate move
    pub step_count: u32,
    /// Profile the move runs with
    pub profile: Profile,
    /// An eased move was too long for the step table and runs linear
    pub downgraded: bool,
    /// Axes that accepted the move
    pub axes: u8,
}

/// One registered servo and its motion bookkeeping
struct Axis<S> {
    device: S,
    position_us: u16,
    role: Option<AxisRole>,
    plan: Option<TrajectoryPlan>,
}

impl<S: ServoDevice> Axis<S> {
    fn command(&mut self, position_us: u16) {
        self.device.command_position_us(position_us);
        self.position_us = position_us;
    }
}

/// Coordinated controller for up to `N` servo axes
pub struct MotionController<S, const N: usize> {
    axes: [Option<Axis<S>>; N],
    state: MotionState,
    tick_period_ms: u32,
}

impl<S: ServoDevice, const N: usize> Default for MotionController<S, N> {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_PERIOD_MS)
    }
}

impl<S: ServoDevice, const N: usize> MotionController<S, N> {
    /// Create a controller with no axes
    ///
    /// A zero tick period is treated as 1 ms.
    pub fn new(tick_period_ms: u32) -> Self {
        Self {
            axes: core::array::from_fn(|_| None),
            state: MotionState::Idle,
            tick_period_ms: tick_period_ms.max(1),
        }
    }

    /// Register a servo in `slot`
    ///
    /// The axis starts at whatever position the device reports. A device
    /// already in the slot is replaced and handed back.
    pub fn add_axis(&mut self, slot: usize, device: S) -> Result<Option<S>, MotionError> {
        let entry = self.axes.get_mut(slot).ok_or(MotionError::SlotOutOfRange)?;
        let position_us = device.position_us();
        let previous = entry.replace(Axis {
            device,
            position_us,
            role: None,
            plan: None,
        });
        Ok(previous.map(|axis| axis.device))
    }

    /// Tag an axis with what it does on the head
    pub fn set_axis_role(&mut self, slot: usize, role: AxisRole) -> Result<(), MotionError> {
        let axis = self
            .axes
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or(MotionError::SlotOutOfRange)?;
        axis.role = Some(role);
        Ok(())
    }

    /// Role of the axis in `slot`, if tagged
    pub fn axis_role(&self, slot: usize) -> Option<AxisRole> {
        self.axis(slot).and_then(|axis| axis.role)
    }

    /// Slot of the first axis tagged with `role`
    pub fn slot_for_role(&self, role: AxisRole) -> Option<usize> {
        self.axes
            .iter()
            .position(|axis| axis.as_ref().and_then(|a| a.role) == Some(role))
    }

    /// Start moving `slots` to `angles_deg` over `duration_ms`
    ///
    /// A move in progress is dropped first; the new one starts from the
    /// last commanded positions. Slots without a device are skipped and
    /// only the common prefix of `slots` and `angles_deg` is used. When
    /// `duration_ms` is shorter than one tick the axes jump straight to
    /// their targets and the controller stays idle.
    pub fn move_axes(
        &mut self,
        slots: &[usize],
        angles_deg: &[f32],
        duration_ms: u32,
        profile: Profile,
    ) -> MoveReport {
        self.cancel();

        let step_count = duration_ms / self.tick_period_ms;
        let mut report = MoveReport {
            step_count,
            profile,
            downgraded: false,
            axes: 0,
        };

        for (&slot, &angle) in slots.iter().zip(angles_deg) {
            let Some(axis) = self.axes.get_mut(slot).and_then(Option::as_mut) else {
                continue;
            };
            let target_us = axis.device.angle_to_position_us(angle);

            if step_count == 0 {
                axis.command(target_us);
            } else {
                let plan = TrajectoryPlan::new(axis.position_us, target_us, step_count, profile);
                report.downgraded |= plan.downgraded();
                report.profile = plan.profile();
                axis.plan = Some(plan);
            }
            report.axes = report.axes.saturating_add(1);
        }

        if step_count > 0 && report.axes > 0 {
            self.state = MotionState::Moving;
        }
        report
    }

    /// Advance every moving axis by one step
    ///
    /// Each axis is commanded its next planned position; the last step of a
    /// plan commands the exact target. Returns the state after the tick.
    pub fn tick(&mut self) -> MotionState {
        if self.state == MotionState::Idle {
            return MotionState::Idle;
        }

        let mut active = false;
        for axis in self.axes.iter_mut().flatten() {
            let Some(plan) = axis.plan.as_mut() else {
                continue;
            };
            if let Some(position_us) = plan.advance() {
                axis.device.command_position_us(position_us);
                axis.position_us = position_us;
            }
            if plan.is_complete() {
                axis.plan = None;
            } else {
                active = true;
            }
        }

        if !active {
            self.state = MotionState::Idle;
        }
        self.state
    }

    /// Drop any move in progress without completing it
    pub fn cancel(&mut self) {
        for axis in self.axes.iter_mut().flatten() {
            axis.plan = None;
        }
        self.state = MotionState::Idle;
    }

    /// Stop all motion and disable every servo
    ///
    /// With `release` set the devices also give up their outputs.
    pub fn turn_all_off(&mut self, release: bool) {
        self.cancel();
        for axis in self.axes.iter_mut().flatten() {
            axis.device.disable();
            if release {
                axis.device.release();
            }
        }
    }

    /// True while a move is in progress
    pub fn is_moving(&self) -> bool {
        self.state == MotionState::Moving
    }

    /// Current motion state
    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Last commanded pulse width of the axis in `slot`
    pub fn position_us(&self, slot: usize) -> Option<u16> {
        self.axis(slot).map(|axis| axis.position_us)
    }

    /// Steps left on the axis in `slot`
    pub fn remaining_steps(&self, slot: usize) -> Option<u32> {
        self.axis(slot)
            .map(|axis| axis.plan.as_ref().map_or(0, TrajectoryPlan::remaining))
    }

    /// Interval between ticks
    pub fn tick_period_ms(&self) -> u32 {
        self.tick_period_ms
    }

    /// Number of registered axes
    pub fn axis_count(&self) -> usize {
        self.axes.iter().flatten().count()
    }

    /// Device in `slot`
    pub fn device(&self, slot: usize) -> Option<&S> {
        self.axis(slot).map(|axis| &axis.device)
    }

    fn axis(&self, slot: usize) -> Option<&Axis<S>> {
        self.axes.get(slot).and_then(Option::as_ref)
    }
}
