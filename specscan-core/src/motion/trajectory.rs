//! Per-axis trajectory planning
//!
//! A plan turns a start and target pulse width into a fixed number of
//! per-tick positions. Every plan lands exactly on its target after its
//! last step, whatever the profile.

use core::str::FromStr;

use heapless::Vec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Capacity of the eased step table
///
/// Eased moves longer than this are run with a linear profile instead.
pub const MAX_EASED_STEPS: usize = 500;

/// Velocity profile of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Profile {
    /// Constant velocity
    #[default]
    Linear,
    /// Parabolic velocity: slow start, fastest mid-move, slow finish
    Eased,
}

impl Profile {
    /// Name used in config files
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Linear => "linear",
            Profile::Eased => "eased",
        }
    }
}

/// Unrecognised profile name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UnknownProfile;

impl FromStr for Profile {
    type Err = UnknownProfile;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" => Ok(Profile::Linear),
            "eased" | "parabolic" => Ok(Profile::Eased),
            _ => Err(UnknownProfile),
        }
    }
}

/// Per-step displacement source
#[derive(Debug, Clone)]
enum Steps {
    /// Fractional position advanced by a constant delta
    Linear { position: f32, delta: f32 },
    /// Integer displacement per step
    Eased {
        position: i32,
        steps: Vec<i32, MAX_EASED_STEPS>,
    },
}

/// Trajectory of one axis for one move
#[derive(Debug, Clone)]
pub struct TrajectoryPlan {
    start_us: u16,
    target_us: u16,
    step_count: u32,
    taken: u32,
    steps: Steps,
    downgraded: bool,
}

impl TrajectoryPlan {
    /// Plan a move of `step_count` ticks
    ///
    /// An eased request longer than [`MAX_EASED_STEPS`] is planned linear
    /// and flagged through [`TrajectoryPlan::downgraded`]. A zero step count
    /// yields a plan that is already complete.
    pub fn new(start_us: u16, target_us: u16, step_count: u32, profile: Profile) -> Self {
        let downgraded = profile == Profile::Eased && step_count as usize > MAX_EASED_STEPS;
        let steps = match profile {
            Profile::Eased if !downgraded => Steps::Eased {
                position: start_us as i32,
                steps: eased_steps(target_us as i32 - start_us as i32, step_count),
            },
            _ => {
                let delta = if step_count == 0 {
                    0.0
                } else {
                    (target_us as f32 - start_us as f32) / step_count as f32
                };
                Steps::Linear {
                    position: start_us as f32,
                    delta,
                }
            }
        };

        Self {
            start_us,
            target_us,
            step_count,
            taken: 0,
            steps,
            downgraded,
        }
    }

    /// Next position, or `None` once the plan is complete
    ///
    /// The final step always returns the exact target.
    pub fn advance(&mut self) -> Option<u16> {
        if self.is_complete() {
            return None;
        }
        self.taken += 1;
        if self.taken == self.step_count {
            return Some(self.target_us);
        }

        let index = (self.taken - 1) as usize;
        let next = match &mut self.steps {
            Steps::Linear { position, delta } => {
                *position += *delta;
                (*position + 0.5) as u16
            }
            Steps::Eased { position, steps } => {
                *position += steps.get(index).copied().unwrap_or(0);
                (*position).clamp(0, u16::MAX as i32) as u16
            }
        };
        Some(next)
    }

    /// True once every step has been taken
    pub fn is_complete(&self) -> bool {
        self.taken >= self.step_count
    }

    /// Steps not yet taken
    pub fn remaining(&self) -> u32 {
        self.step_count - self.taken.min(self.step_count)
    }

    /// Total steps in the plan
    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Position the plan started from
    pub fn start_us(&self) -> u16 {
        self.start_us
    }

    /// Position the plan ends at
    pub fn target_us(&self) -> u16 {
        self.target_us
    }

    /// Profile actually used
    pub fn profile(&self) -> Profile {
        match self.steps {
            Steps::Linear { .. } => Profile::Linear,
            Steps::Eased { .. } => Profile::Eased,
        }
    }

    /// An eased request was planned linear because it was too long
    pub fn downgraded(&self) -> bool {
        self.downgraded
    }

    /// Integer per-step displacements of an eased plan
    pub fn eased_steps(&self) -> Option<&[i32]> {
        match &self.steps {
            Steps::Eased { steps, .. } => Some(steps),
            Steps::Linear { .. } => None,
        }
    }
}

/// Integer displacements with weights `(j + 1)(n - j)` summing to `displacement`
///
/// Each step is the difference of consecutive rounded cumulative
/// fractions, so the sum telescopes to `displacement` exactly.
fn eased_steps(displacement: i32, step_count: u32) -> Vec<i32, MAX_EASED_STEPS> {
    let n = step_count as i64;
    let total = n * (n + 1) * (n + 2) / 6;
    let mut steps = Vec::new();
    let mut cumulative = 0i64;
    let mut emitted = 0i64;

    for j in 0..n {
        cumulative += (j + 1) * (n - j);
        let reached = div_round(displacement as i64 * cumulative, total);
        // Capacity bounded by MAX_EASED_STEPS; callers downgrade longer moves
        let _ = steps.push((reached - emitted) as i32);
        emitted = reached;
    }
    steps
}

/// Integer division rounding half away from zero
fn div_round(num: i64, den: i64) -> i64 {
    if num >= 0 {
        (num + den / 2) / den
    } else {
        -((-num + den / 2) / den)
    }
}
