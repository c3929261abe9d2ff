// src/ros_interface/publisher.rs
// Outbound side of the planner boundary: navigation goals.

use crate::error::ServiceError;
use crate::pose::Pose2D;

/// Default topic the global planner listens on for goals
pub const GOAL_TOPIC: &str = "/goal";

/// Fire-and-forget emission of navigation goals to the planner.
/// The planner answers, if at all, through a [`super::PathSink`].
#[cfg_attr(test, mockall::automock)]
pub trait GoalPublisher: Send + Sync {
    /// Publishes `goal` in the map frame
    fn publish_goal(&self, goal: &Pose2D) -> Result<(), ServiceError>;
}
