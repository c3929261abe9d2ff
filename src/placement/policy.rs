// src/placement/policy.rs

// Retry loop that turns optional fixed start/goal poses into a validated pair.
// Each attempt fills in the missing poses by sampling, rejects pairs closer
// than the minimum distance without touching the simulator, and otherwise
// moves the robot and waits for the planner to confirm the goal.

use log::{debug, info, warn};

use super::CancelToken;
use super::sampler::RandomPositionSampler;
use crate::error::{PlacementError, ServiceError};
use crate::map::MapSnapshot;
use crate::pose::Pose2D;

/// Attempts allowed when at least one pose is sampled
pub const DEFAULT_MAX_TRIES: u32 = 20;
/// Clearance for sampled starts, in robot radii
pub const START_CLEARANCE_FACTOR: f64 = 2.0;
/// Clearance for sampled goals, in robot radii
pub const GOAL_CLEARANCE_FACTOR: f64 = 4.0;

/// Anything that can put the robot at a pose before validation
#[cfg_attr(test, mockall::automock)]
pub trait MoveRobot {
    /// Moves the robot and returns once the move is complete
    fn move_robot(&self, pose: &Pose2D) -> Result<(), ServiceError>;
}

/// Anything that can confirm a goal is reachable from the current pose
#[cfg_attr(test, mockall::automock)]
pub trait ValidateGoal {
    /// Publishes the goal and waits for confirmation; `PathNotFound` on timeout
    fn publish_and_wait(&self, goal: &Pose2D) -> Result<(), PlacementError>;
}

/// A validated start/goal pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementResult {
    /// Where the robot was placed
    pub start: Pose2D,
    /// The confirmed goal
    pub goal: Pose2D,
}

/// Collaborators used by one placement run
pub struct PlacementContext<'a> {
    /// Map and index to sample from
    pub snapshot: &'a MapSnapshot,
    /// Random pose source
    pub sampler: &'a RandomPositionSampler,
    /// Moves the robot to the candidate start
    pub mover: &'a dyn MoveRobot,
    /// Confirms the candidate goal
    pub validator: &'a dyn ValidateGoal,
    /// Checked before every attempt
    pub cancel: &'a CancelToken,
}

/// Retry policy for start/goal placement
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementPolicy {
    robot_radius: f64,
    max_tries: u32,
}

impl PlacementPolicy {
    /// Policy for a robot of `robot_radius`; `max_tries` is clamped to at least one
    pub fn new(robot_radius: f64, max_tries: u32) -> Self {
        PlacementPolicy {
            robot_radius,
            max_tries: max_tries.max(1),
        }
    }

    /// Attempt budget for a request: a fully fixed pair is tried once
    pub fn max_tries_for(&self, fixed_start: Option<&Pose2D>, fixed_goal: Option<&Pose2D>) -> u32 {
        if fixed_start.is_some() && fixed_goal.is_some() {
            1
        } else {
            self.max_tries
        }
    }

    /// Finds a start/goal pair at least `min_dist` apart whose goal the planner confirms.
    ///
    /// `UnplaceableMap`, `ServiceUnavailable` and `Cancelled` end the run immediately;
    /// distance rejections and `PathNotFound` use up an attempt.
    pub fn resolve(
        &self,
        ctx: &PlacementContext<'_>,
        fixed_start: Option<Pose2D>,
        fixed_goal: Option<Pose2D>,
        min_dist: f64,
    ) -> Result<PlacementResult, PlacementError> {
        let max_tries = self.max_tries_for(fixed_start.as_ref(), fixed_goal.as_ref());
        let mut attempts = 0;

        while attempts < max_tries {
            if ctx.cancel.is_cancelled() {
                info!("Placement cancelled after {} attempt(s)", attempts);
                return Err(PlacementError::Cancelled { attempts });
            }
            attempts += 1;

            let start = match fixed_start {
                Some(pose) => pose,
                None => ctx
                    .sampler
                    .sample(ctx.snapshot, self.robot_radius * START_CLEARANCE_FACTOR)?,
            };
            let goal = match fixed_goal {
                Some(pose) => pose,
                None => ctx
                    .sampler
                    .sample(ctx.snapshot, self.robot_radius * GOAL_CLEARANCE_FACTOR)?,
            };

            let distance = start.distance(&goal);
            if distance < min_dist {
                debug!(
                    "Attempt {}/{}: start and goal {:.2} m apart, need {:.2}",
                    attempts, max_tries, distance, min_dist
                );
                continue;
            }

            ctx.mover.move_robot(&start)?;
            match ctx.validator.publish_and_wait(&goal) {
                Ok(()) => {
                    info!(
                        "Placed robot at ({:.2}, {:.2}) with goal ({:.2}, {:.2}) after {} attempt(s)",
                        start.x, start.y, goal.x, goal.y, attempts
                    );
                    return Ok(PlacementResult { start, goal });
                }
                Err(PlacementError::PathNotFound(_)) => {
                    debug!("Attempt {}/{}: planner found no path", attempts, max_tries);
                }
                Err(e) => return Err(e),
            }
        }

        warn!("Giving up on start/goal placement after {} attempt(s)", attempts);
        Err(PlacementError::Exhausted { attempts })
    }
}
