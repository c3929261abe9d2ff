//! Robot placement for navigation training episodes
//!
//! This library places a single simulated robot and its navigation goal on an
//! occupancy grid map, including free-space sampling, minimum-distance retry
//! policy, simulator moves and goal validation against an external global
//! planner.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Error types
pub mod error;
/// In-process simulator and planner
pub mod loopback;
pub mod map;
pub mod navigation;
pub mod placement;
/// Planar poses
pub mod pose;
/// Robot description and placement manager
pub mod robot;
pub mod ros_interface;

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Re-export commonly used items for easier access
pub use error::{ConfigError, MapError, PlacementError, ServiceError};
pub use loopback::{LoopbackPlanner, LoopbackSimulator};
pub use map::{FreeSpaceIndex, MapSnapshot, OccupancyGrid};
pub use navigation::{GoalValidator, MotionGateway, PathListener, ValidationState};
pub use placement::{CancelToken, PlacementPolicy, PlacementResult, RandomPositionSampler};
pub use pose::Pose2D;
pub use robot::{RobotConfig, RobotManager};
pub use ros_interface::{GlobalPath, GoalPublisher, PathSink, SimulatorServices};

/// Which simulator connection the binary uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// In-process simulator and planner
    #[default]
    Loopback,
    /// ROS 2 services and topics (needs the `ros` feature)
    Ros,
}

/// Topic and service names on the ROS side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Node name
    pub node_name: String,
    /// Goal topic the planner listens on
    pub goal_topic: String,
    /// Topic the planner publishes plans on
    pub path_topic: String,
    /// Model relocation service
    pub move_model_service: String,
    /// World stepping service
    pub step_world_service: String,
}

impl Default for TopicConfig {
    fn default() -> Self {
        TopicConfig {
            node_name: "task_generator".to_string(),
            goal_topic: ros_interface::GOAL_TOPIC.to_string(),
            path_topic: ros_interface::GLOBAL_PATH_TOPIC.to_string(),
            move_model_service: ros_interface::MOVE_MODEL_SERVICE.to_string(),
            step_world_service: ros_interface::STEP_WORLD_SERVICE.to_string(),
        }
    }
}

/// Task generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Step the world after moves so sensors catch up (training only)
    #[serde(default = "default_training_mode")]
    pub training_mode: bool,

    /// Minimum start/goal distance (meters)
    #[serde(default = "default_min_dist")]
    pub min_dist: f64,

    /// Attempts when start or goal is sampled
    #[serde(default = "default_max_tries")]
    pub max_tries: u32,

    /// Wait for a global path after publishing a goal (milliseconds)
    #[serde(default = "default_path_timeout_ms")]
    pub path_timeout_ms: u64,

    /// Wait for the move service at startup (seconds)
    #[serde(default = "default_service_timeout_s")]
    pub service_timeout_s: u64,

    /// Sampler seed; entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Robot model description file
    #[serde(default)]
    pub robot_description: Option<PathBuf>,

    /// Simulator connection used by the binary
    #[serde(default)]
    pub backend: Backend,

    /// ROS names
    #[serde(default)]
    pub topics: TopicConfig,
}

fn default_training_mode() -> bool {
    true
}

fn default_min_dist() -> f64 {
    1.0
}

fn default_max_tries() -> u32 {
    placement::DEFAULT_MAX_TRIES
}

fn default_path_timeout_ms() -> u64 {
    100
}

fn default_service_timeout_s() -> u64 {
    20
}

impl Default for TaskConfig {
    fn default() -> Self {
        TaskConfig {
            training_mode: default_training_mode(),
            min_dist: default_min_dist(),
            max_tries: default_max_tries(),
            path_timeout_ms: default_path_timeout_ms(),
            service_timeout_s: default_service_timeout_s(),
            seed: None,
            robot_description: None,
            backend: Backend::default(),
            topics: TopicConfig::default(),
        }
    }
}

impl TaskConfig {
    /// Loads settings from a YAML file; absent keys take their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_reader(file).map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
    }

    /// Parses settings from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// Validation wait per goal
    pub fn path_timeout(&self) -> Duration {
        Duration::from_millis(self.path_timeout_ms)
    }

    /// Startup wait for the simulator
    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service_timeout_s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = TaskConfig::from_yaml_str("training_mode: false\nseed: 7\ntopics:\n  goal_topic: /nav_goal\n").unwrap();

        assert!(!config.training_mode);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.min_dist, 1.0);
        assert_eq!(config.max_tries, 20);
        assert_eq!(config.path_timeout(), Duration::from_millis(100));
        assert_eq!(config.service_timeout(), Duration::from_secs(20));
        assert_eq!(config.backend, Backend::Loopback);
        assert_eq!(config.topics.goal_topic, "/nav_goal");
        assert_eq!(config.topics.move_model_service, "move_model");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(TaskConfig::from_yaml_str("{}").unwrap(), TaskConfig::default());
        assert_eq!(
            TaskConfig::from_yaml_str("backend: ros\n").unwrap().backend,
            Backend::Ros
        );
    }
}
