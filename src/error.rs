// src/error.rs

// Error types shared by the placement core. Collaborator failures (simulator
// services, goal publication) are `ServiceError`; everything the outer API can
// return is folded into `PlacementError`. Configuration and map construction
// problems have their own enums since they happen before any episode starts.

use std::time::Duration;
use thiserror::Error;

/// Failure talking to an external service (mover, world stepper, planner).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    /// The service did not come up within the allowed wait.
    #[error("service `{service}` not available after {waited:?}")]
    Unavailable {
        /// Service name
        service: String,
        /// How long we waited
        waited: Duration,
    },

    /// The call reached the service but it answered with a failure.
    #[error("call to `{service}` failed: {reason}")]
    CallFailed {
        /// Service name
        service: String,
        /// Reason reported by the service or transport
        reason: String,
    },

    /// A message could not be published.
    #[error("publishing on `{topic}` failed: {reason}")]
    PublishFailed {
        /// Topic name
        topic: String,
        /// Reason reported by the transport
        reason: String,
    },
}

/// Errors returned while placing the robot and its goal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PlacementError {
    /// The current map has no free cell to sample from.
    #[error("map has no free cells, the robot can not be placed")]
    UnplaceableMap,

    /// Every attempt failed the distance check or path validation.
    #[error(
        "can not generate a path with the given start position and goal position after {attempts} attempt(s)"
    )]
    Exhausted {
        /// Attempts consumed
        attempts: u32,
    },

    /// No fresh global path arrived before the validation timeout.
    #[error("no global path received within {0:?} of publishing the goal")]
    PathNotFound(Duration),

    /// The mover or planner could not be reached.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(#[from] ServiceError),

    /// The caller aborted the episode between attempts.
    #[error("placement cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Attempts made before cancellation was observed
        attempts: u32,
    },
}

/// Problems building an occupancy grid.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    /// `data.len()` does not match `width * height`.
    #[error("grid data has {actual} cells, expected {expected}")]
    SizeMismatch {
        /// width * height
        expected: usize,
        /// data length
        actual: usize,
    },

    /// Resolution must be a positive, finite number of meters per cell.
    #[error("invalid grid resolution {0}")]
    InvalidResolution(f64),

    /// An ascii row had a different width than the first one.
    #[error("row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        /// Row index
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of this row
        actual: usize,
    },

    /// Unrecognised character in an ascii map.
    #[error("unknown map symbol {0:?}")]
    UnknownSymbol(char),
}

/// Errors loading robot or task configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The YAML did not match the expected layout.
    #[error("failed to parse {path}: {source}")]
    Yaml {
        /// File path, or a label for in-memory documents
        path: String,
        /// Underlying error
        #[source]
        source: serde_yaml::Error,
    },

    /// No circular footprint on the `base_footprint` body.
    #[error("robot description has no circular `base_footprint` footprint")]
    MissingFootprint,

    /// No `Laser` plugin to read the update rate from.
    #[error("robot description has no `Laser` plugin")]
    MissingLaser,

    /// Radius was zero, negative or not finite.
    #[error("robot radius must be positive, got {0}")]
    InvalidRadius(f64),

    /// The robot name could not be derived from the description path.
    #[error("can not derive a robot name from {0}")]
    InvalidName(String),
}
