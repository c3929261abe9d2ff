// src/pose.rs

// 2D pose in world coordinates. Theta is radians and is never normalised here,
// callers must not assume it lies in (-pi, pi].

use nalgebra::{UnitQuaternion, Vector2};
use serde::{Deserialize, Serialize};

/// Robot or goal pose (x, y in meters, theta in radians)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2D {
    /// X position (meters)
    pub x: f64,
    /// Y position (meters)
    pub y: f64,
    /// Heading (radians)
    pub theta: f64,
}

impl Pose2D {
    /// Creates a pose from its components
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose2D { x, y, theta }
    }

    /// Builds a planar pose from a position and a 3D orientation, keeping only yaw
    pub fn with_orientation(x: f64, y: f64, orientation: &UnitQuaternion<f64>) -> Self {
        let (_, _, yaw) = orientation.euler_angles();
        Pose2D { x, y, theta: yaw }
    }

    /// Position as a vector
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance between the positions, heading ignored
    pub fn distance(&self, other: &Pose2D) -> f64 {
        (self.position() - other.position()).norm()
    }

    /// Heading as a rotation about z, as goal messages carry it
    pub fn orientation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_euler_angles(0.0, 0.0, self.theta)
    }
}
