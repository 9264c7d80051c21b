// Path tracking: nearest-point search over a sliding look-ahead window.
//
// The tracker owns the path and a forward-only cursor into it. The cursor only
// ever advances, so the bot cannot re-target a point it has already passed and
// oscillate between two nearby points.

use tracing::debug;

use crate::messages::Point;

use super::Orientation;

/// Number of upcoming path points considered for the nearest-point search
/// (keeps the bot from being misdirected by far-away parts of the path).
pub const LOOKAHEAD_POINTS: usize = 20;

/// A point closer than this counts as reached for cursor-advance purposes.
pub const MAX_CLOSE_TO_POINT: f32 = 0.3;

/// Trailing points kept behind the nearest match when the cursor advances, so
/// the window never snaps exactly onto the just-reached point.
const CURSOR_LAG: usize = 3;

/// The look-ahead window is empty: the whole path has been consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("end of path reached")]
pub struct PathExhausted;

/// Owns the path being followed and the progress cursor into it.
pub struct PathTracker {
    path: Vec<Point>,
    cursor: usize,
}

impl PathTracker {
    pub fn new() -> Self {
        Self {
            path: Vec::new(),
            cursor: 0,
        }
    }

    /// Replace the path. Progress restarts from the first point.
    pub fn set_path(&mut self, path: Vec<Point>) {
        self.cursor = 0;
        self.path = path;
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Compute the signed steering error toward the nearest upcoming point
    /// and advance the cursor past points the bot has reached.
    ///
    /// Positive error means the path lies to the left of the current heading.
    pub fn steering_error(
        &mut self,
        pos: Point,
        orientation: Orientation,
    ) -> Result<f32, PathExhausted> {
        let end = (self.cursor + LOOKAHEAD_POINTS).min(self.path.len());
        if end <= self.cursor {
            return Err(PathExhausted);
        }

        let window = &self.path[self.cursor..end];
        let (error, nearest_distance, nearest_index) = lookahead(pos, window, orientation);

        if nearest_distance < MAX_CLOSE_TO_POINT && nearest_index > CURSOR_LAG {
            self.cursor += nearest_index - CURSOR_LAG;
        }

        debug!(
            "steering error {:.3} (nearest {} at {:.3}, cursor {})",
            error, nearest_index, nearest_distance, self.cursor
        );
        Ok(error)
    }
}

impl Default for PathTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Nearest-point search over the windowed path.
///
/// Returns the signed lateral offset of the nearest point in the robot frame,
/// its raw distance, and its index within the window. The offset is the cross
/// product of the unit heading with the vector to the point, so it is positive
/// when the point lies to the left of the heading and zero when dead ahead.
fn lookahead(pos: Point, window: &[Point], orientation: Orientation) -> (f32, f32, usize) {
    let mut nearest_index = 0;
    let mut nearest_distance = f32::INFINITY;
    for (i, p) in window.iter().enumerate() {
        let d = pos.distance(p);
        if d < nearest_distance {
            nearest_distance = d;
            nearest_index = i;
        }
    }

    let target = window[nearest_index];
    let norm = orientation.x.hypot(orientation.y);
    let error = if norm > f32::EPSILON {
        let hx = orientation.x / norm;
        let hy = orientation.y / norm;
        hx * (target.y - pos.y) - hy * (target.x - pos.x)
    } else {
        // No usable heading, nothing to steer against.
        0.0
    };

    (error, nearest_distance, nearest_index)
}
