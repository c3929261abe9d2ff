//! Boundary to the simulator and the global planner
//!
//! This module defines the contracts the placement core calls across:
//! - Simulator services (`move_model`, `step_world`)
//! - Goal publication to the planner
//! - Inbound global path notifications
//!
//! With the `ros` feature, [`RosBridge`] implements them on top of ROS 2.

mod publisher;
mod subscriber;

#[cfg(feature = "ros")]
mod bridge;

use std::time::Duration;

use crate::error::ServiceError;
use crate::pose::Pose2D;

pub use publisher::*;
pub use subscriber::*;

#[cfg(feature = "ros")]
pub use bridge::RosBridge;

/// Default name of the service that teleports a model
pub const MOVE_MODEL_SERVICE: &str = "move_model";
/// Default name of the service that advances simulated time by one step
pub const STEP_WORLD_SERVICE: &str = "step_world";

/// Synchronous request/response services offered by the simulator
#[cfg_attr(test, mockall::automock)]
pub trait SimulatorServices: Send + Sync {
    /// Blocks until `service` answers or `timeout` elapses
    fn wait_for_service(&self, service: &str, timeout: Duration) -> Result<(), ServiceError>;

    /// Relocates the named model to `pose`
    fn move_model(&self, name: &str, pose: &Pose2D) -> Result<(), ServiceError>;

    /// Advances simulated time by one discrete step
    fn step_world(&self) -> Result<(), ServiceError>;
}
