// src/ros_interface/subscriber.rs
// Inbound side of the planner boundary: global paths.

use std::time::Duration;

use crate::pose::Pose2D;

/// Default topic the global planner publishes its plans on
pub const GLOBAL_PATH_TOPIC: &str = "move_base/NavfnROS/plan";

/// A plan produced by the global planner.
/// Only `stamp` ordering is used for validation; `poses` are kept for callers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlobalPath {
    /// Header stamp of the plan, monotonically increasing per planner
    pub stamp: Duration,
    /// Waypoints of the plan
    pub poses: Vec<Pose2D>,
}

impl GlobalPath {
    /// Creates a path with the given stamp and waypoints
    pub fn new(stamp: Duration, poses: Vec<Pose2D>) -> Self {
        GlobalPath { stamp, poses }
    }
}

/// Receiver of global path notifications. Called from the transport's
/// own thread, never from the thread waiting on validation.
pub trait PathSink: Send + Sync {
    /// Handles one delivered path
    fn on_path(&self, path: GlobalPath);
}
