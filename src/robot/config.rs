// src/robot/config.rs

// Robot geometry and sensor timing, read once from the simulator's robot model
// description (flatland YAML). Only two values matter for placement: the
// radius of the circular base footprint and the laser update rate.

use log::info;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

use crate::error::ConfigError;

const BASE_FOOTPRINT_BODY: &str = "base_footprint";
const CIRCLE_FOOTPRINT: &str = "circle";
const LASER_PLUGIN: &str = "Laser";
const DEFAULT_RADIUS: f64 = 0.2;
const DEFAULT_LASER_UPDATE_RATE: u32 = 1;

/// Immutable description of the managed robot
#[derive(Debug, Clone, PartialEq)]
pub struct RobotConfig {
    name: String,
    radius: f64,
    laser_update_rate: u32,
}

#[derive(Deserialize, Debug)]
struct ModelDescription {
    #[serde(default)]
    bodies: Vec<BodyDescription>,
    #[serde(default)]
    plugins: Vec<PluginDescription>,
}

#[derive(Deserialize, Debug)]
struct BodyDescription {
    name: String,
    #[serde(default)]
    footprints: Vec<FootprintDescription>,
}

#[derive(Deserialize, Debug)]
struct FootprintDescription {
    #[serde(rename = "type")]
    kind: String,
    radius: Option<f64>,
}

#[derive(Deserialize, Debug)]
struct PluginDescription {
    #[serde(rename = "type")]
    kind: String,
    update_rate: Option<u32>,
}

impl RobotConfig {
    /// Creates a config, rejecting a non-positive radius
    pub fn new(name: impl Into<String>, radius: f64, laser_update_rate: u32) -> Result<Self, ConfigError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ConfigError::InvalidRadius(radius));
        }
        Ok(RobotConfig {
            name: name.into(),
            radius,
            laser_update_rate,
        })
    }

    /// Loads a robot model file. The robot is named after the file, up to the first dot
    /// (`myrobot.model.yaml` -> `myrobot`).
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|f| f.to_str())
            .and_then(|f| f.split('.').next())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ConfigError::InvalidName(path.display().to_string()))?
            .to_string();

        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let description: ModelDescription =
            serde_yaml::from_reader(file).map_err(|source| ConfigError::Yaml {
                path: path.display().to_string(),
                source,
            })?;

        let config = RobotConfig::from_description(name, description)?;
        info!(
            "Loaded robot {}: radius={}, laser_update_rate={}",
            config.name, config.radius, config.laser_update_rate
        );
        Ok(config)
    }

    /// Parses a robot model from a YAML string
    pub fn from_yaml_str(name: impl Into<String>, yaml: &str) -> Result<Self, ConfigError> {
        let description: ModelDescription =
            serde_yaml::from_str(yaml).map_err(|source| ConfigError::Yaml {
                path: "<inline>".to_string(),
                source,
            })?;
        RobotConfig::from_description(name.into(), description)
    }

    fn from_description(name: String, description: ModelDescription) -> Result<Self, ConfigError> {
        // The last matching entry wins when a description repeats one
        let radius = description
            .bodies
            .iter()
            .filter(|body| body.name == BASE_FOOTPRINT_BODY)
            .flat_map(|body| body.footprints.iter())
            .filter(|footprint| footprint.kind == CIRCLE_FOOTPRINT)
            .map(|footprint| footprint.radius.unwrap_or(DEFAULT_RADIUS))
            .last()
            .ok_or(ConfigError::MissingFootprint)?;

        let laser_update_rate = description
            .plugins
            .iter()
            .filter(|plugin| plugin.kind == LASER_PLUGIN)
            .map(|plugin| plugin.update_rate.unwrap_or(DEFAULT_LASER_UPDATE_RATE))
            .last()
            .ok_or(ConfigError::MissingLaser)?;

        RobotConfig::new(name, radius, laser_update_rate)
    }

    /// Model name in the simulator
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Footprint radius (meters)
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Laser updates per simulated second
    pub fn laser_update_rate(&self) -> u32 {
        self.laser_update_rate
    }
}
