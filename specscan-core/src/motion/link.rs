//! Link between the scan logic and the motion tick
//!
//! The scan never spins on the motion state. It starts a move and then
//! awaits settlement, bounded by a timeout. On the board the wait is a
//! signal raised by the tick task; on the host the controller can drive
//! its own ticks while it is awaited.

use core::future::Future;

use super::controller::{MotionController, MotionError, MoveReport};
use super::trajectory::Profile;
use crate::traits::ServoDevice;

/// Start moves and wait for them to finish
pub trait MotionLink {
    /// Start a coordinated move; see [`MotionController::move_axes`]
    fn start_move(
        &mut self,
        slots: &[usize],
        angles_deg: &[f32],
        duration_ms: u32,
        profile: Profile,
    ) -> MoveReport;

    /// Wait until no axis is moving
    ///
    /// Returns [`MotionError::Timeout`] if motion is still in progress
    /// after `timeout_ms`.
    fn wait_settled(&mut self, timeout_ms: u32) -> impl Future<Output = Result<(), MotionError>>;
}

/// Cooperative link: the controller ticks itself while being awaited
///
/// The timeout is counted in ticks (`timeout_ms / tick_period_ms`), not
/// wall time.
impl<S: ServoDevice, const N: usize> MotionLink for MotionController<S, N> {
    fn start_move(
        &mut self,
        slots: &[usize],
        angles_deg: &[f32],
        duration_ms: u32,
        profile: Profile,
    ) -> MoveReport {
        self.move_axes(slots, angles_deg, duration_ms, profile)
    }

    async fn wait_settled(&mut self, timeout_ms: u32) -> Result<(), MotionError> {
        let mut budget = timeout_ms / self.tick_period_ms();
        while self.is_moving() {
            if budget == 0 {
                return Err(MotionError::Timeout);
            }
            self.tick();
            budget -= 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motion::controller::tests::MockServo;
    use embassy_futures::block_on;

    fn controller() -> MotionController<MockServo, 2> {
        let mut motion = MotionController::new(2);
        motion.add_axis(0, MockServo::new()).unwrap();
        motion
    }

    #[test]
    fn test_wait_settled_runs_move_to_completion() {
        let mut motion = controller();
        motion.start_move(&[0], &[30.0], 200, Profile::Eased);
        assert!(motion.is_moving());

        block_on(motion.wait_settled(900)).unwrap();
        assert!(!motion.is_moving());
        assert_eq!(motion.position_us(0), Some(1800));
    }

    #[test]
    fn test_wait_settled_when_idle() {
        let mut motion = controller();
        assert_eq!(block_on(motion.wait_settled(0)), Ok(()));
    }

    #[test]
    fn test_wait_settled_times_out() {
        let mut motion = controller();
        motion.start_move(&[0], &[30.0], 200, Profile::Linear);

        assert_eq!(block_on(motion.wait_settled(100)), Err(MotionError::Timeout));
        assert!(motion.is_moving());
        assert_eq!(motion.remaining_steps(0), Some(50));
    }
}
