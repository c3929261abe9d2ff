//! Motion and goal validation against the simulator
//!
//! - [`MotionGateway`] moves the robot and advances simulated time
//! - [`GoalValidator`] publishes goals and waits for the global planner

mod controller;
mod validator;

pub use controller::MotionGateway;
pub use validator::{DEFAULT_PATH_TIMEOUT, GoalValidator, PathListener, ValidationState};
