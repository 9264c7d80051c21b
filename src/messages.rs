// Wire types exchanged over zenoh

use serde::{Deserialize, Serialize};

/// A point on the grid, in grid units.
///
/// Paths and pose updates are sequences of these, so it lives with the wire
/// types even though the control layer uses it everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

// Command from teleop/scripts -> runtime
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PilotCommand {
    /// Hold still. Always safe.
    Stop,
    /// Rotate in place. Without an angle, re-targets the previous one.
    RotateTo {
        #[serde(default)]
        angle: Option<f32>,
    },
    /// Follow a path. Without a path, resumes the stored one.
    FollowLine {
        #[serde(default)]
        path: Option<Vec<Point>>,
    },
}

// Position fix from the localizer -> runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PoseUpdate {
    pub x: f32,
    pub y: f32,
}

impl From<PoseUpdate> for Point {
    fn from(pose: PoseUpdate) -> Self {
        Point::new(pose.x, pose.y)
    }
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    PoseStale,
}
