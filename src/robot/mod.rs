// robot/mod.rs

// The managed robot: its model description and the manager that places it.

mod config;
mod manager;

pub use config::RobotConfig;
pub use manager::RobotManager;
