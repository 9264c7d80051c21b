// The pilot: mode state machine and per-tick control sequence.
//
// Owns the link, both PID loops and the path tracker, and turns sensed error
// into wheel command words once per tick.

use tracing::{debug, info, warn};

use crate::config::TICK_DT;
use crate::link::frame::{self, Wheel};
use crate::link::{Link, LinkError};
use crate::messages::Point;

use super::smooth::smooth;
use super::{Orientation, PathTracker, Pid};

// Lateral loop: steering error in grid units -> differential speed.
const LINE_KP: f32 = 0.01;
const LINE_KI: f32 = 0.0;
const LINE_KD: f32 = 0.0;

// Heading loop: angle error in radians -> rotation speed.
const ROT_KP: f32 = 0.5;
const ROT_KI: f32 = 0.0;
const ROT_KD: f32 = 0.05;

/// Baseline forward drive while line following; steering is applied
/// differentially around it.
const BASE_FORWARD_SPEED: f32 = 0.1;

// Orientation calibration. The firmware subtracts SENSOR_BIAS from each raw
// axis before transmitting; ROTATION_MID is the at-rest reading and
// ROTATION_SCALE the full swing, putting each axis near [-1, 1].
const SENSOR_BIAS: f32 = 337.0;
const ROTATION_MID: f32 = 465.0;
const ROTATION_SCALE: f32 = 190.0;

/// Control mode. Exactly one is active; it decides which PID loop runs and
/// how wheel speeds are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Still,
    Rotating,
    LineFollow,
}

/// The bot's closed-loop controller.
///
/// All entry points are meant for a single host loop; `update` must be called
/// at the fixed LOOP_HZ cadence for the PID math to hold.
pub struct Pilot<L: Link> {
    link: L,
    pos: Point,
    orientation: Orientation,
    rot_target: f32,
    mode: Mode,
    line_speed: f32,
    ang_speed: f32,
    line_pid: Pid,
    rot_pid: Pid,
    tracker: PathTracker,
}

impl<L: Link> Pilot<L> {
    pub fn new(link: L) -> Self {
        Self {
            link,
            pos: Point::new(0.0, 0.0),
            orientation: Orientation::default(),
            rot_target: 0.0,
            mode: Mode::Still,
            line_speed: 0.0,
            ang_speed: 0.0,
            line_pid: Pid::new(LINE_KP, LINE_KI, LINE_KD),
            rot_pid: Pid::new(ROT_KP, ROT_KI, ROT_KD),
            tracker: PathTracker::new(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_pos(&mut self, pos: Point) {
        self.pos = pos;
    }

    /// Replace the stored path as-is. Progress restarts from the first point.
    pub fn set_path(&mut self, path: Vec<Point>) {
        self.tracker.set_path(path);
    }

    /// Enter LINE_FOLLOW. A supplied path is smoothed and replaces the stored
    /// one; without one the stored path is resumed where it left off.
    pub fn follow_line(&mut self, path: Option<Vec<Point>>) {
        if let Some(path) = path {
            info!("following new path: {} points", path.len());
            self.set_path(smooth(&path));
        }
        self.set_mode(Mode::LineFollow);
    }

    /// Enter ROTATING. A supplied angle (radians) replaces the stored target.
    pub fn rotate_to(&mut self, angle: Option<f32>) {
        if let Some(angle) = angle {
            self.rot_target = angle;
        }
        info!("rotating to {:.3} rad", self.rot_target);
        self.set_mode(Mode::Rotating);
    }

    /// Enter STILL. Safe from any state.
    pub fn stop(&mut self) {
        info!("stopping");
        self.set_mode(Mode::Still);
    }

    /// Run one control tick: take the new position if any, refresh the
    /// orientation, run the active PID loop, and command the motors.
    pub fn update(&mut self, pos: Option<Point>) -> Result<(), LinkError> {
        if let Some(pos) = pos {
            self.pos = pos;
        }

        self.refresh_orientation()?;

        match self.mode {
            Mode::LineFollow => match self.tracker.steering_error(self.pos, self.orientation) {
                Ok(error) => self.line_speed = self.line_pid.update(error, TICK_DT),
                Err(e) => {
                    warn!("{}, stopping", e);
                    self.stop();
                }
            },
            Mode::Rotating => {
                self.ang_speed = self.rot_pid.update(self.orientation.angle(), TICK_DT);
            }
            Mode::Still => {}
        }

        let (left, right) = self.motor_speeds();
        self.drive_motors(left, right)
    }

    // Mode changes re-sync the relevant set-point in the same step, so no
    // tick can observe the new mode with a stale target.
    fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        match mode {
            Mode::LineFollow => self.line_pid.set_point(0.0),
            Mode::Rotating => self.rot_pid.set_point(self.rot_target),
            Mode::Still => {}
        }
    }

    fn refresh_orientation(&mut self) -> Result<(), LinkError> {
        if let Some((a0, a1)) = self.link.read_last()? {
            // The sensor is mounted with its axes swapped relative to the
            // grid frame: sample slot 1 is x, slot 0 is y.
            self.orientation = Orientation {
                x: (a1 as f32 + SENSOR_BIAS - ROTATION_MID) / ROTATION_SCALE,
                y: (a0 as f32 + SENSOR_BIAS - ROTATION_MID) / ROTATION_SCALE,
            };
        }
        Ok(())
    }

    // Wheel speed pair for the current mode, before clamping.
    fn motor_speeds(&self) -> (f32, f32) {
        match self.mode {
            Mode::Still => (0.0, 0.0),
            Mode::Rotating => (self.ang_speed, -self.ang_speed),
            Mode::LineFollow => (
                BASE_FORWARD_SPEED + self.line_speed,
                BASE_FORWARD_SPEED - self.line_speed,
            ),
        }
    }

    fn drive_motors(&mut self, left: f32, right: f32) -> Result<(), LinkError> {
        let left = left.clamp(-1.0, 1.0);
        let right = right.clamp(-1.0, 1.0);
        debug!("motor speeds: left {:.3}, right {:.3}", left, right);

        self.link.write(frame::encode_speed(Wheel::Left, left))?;
        self.link.write(frame::encode_speed(Wheel::Right, right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MockLink;
    use std::f32::consts::FRAC_PI_2;

    fn pilot() -> (Pilot<MockLink>, MockLink) {
        let link = MockLink::new();
        (Pilot::new(link.clone()), link)
    }

    fn straight_path(len: usize) -> Vec<Point> {
        (0..len).map(|i| Point::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn still_commands_zero() {
        let (mut pilot, link) = pilot();
        pilot.update(Some(Point::new(3.0, -2.0))).unwrap();
        assert_eq!(link.written(), vec![0x00, 0x80]);
    }

    #[test]
    fn line_follow_on_path_drives_base_speed() {
        let (mut pilot, link) = pilot();
        pilot.follow_line(Some(straight_path(21)));

        // On the line, facing along it: zero steering error, both wheels at
        // the base forward speed (0.1 quantizes to 6).
        pilot.update(Some(Point::new(0.0, 0.0))).unwrap();
        assert_eq!(link.written(), vec![0x06, 0x86]);
    }

    #[test]
    fn rotating_drives_opposite_wheels() {
        let (mut pilot, link) = pilot();
        pilot.rotate_to(Some(FRAC_PI_2));
        assert_eq!(pilot.rot_pid.target(), FRAC_PI_2);
        pilot.update(None).unwrap();

        let words = link.written();
        assert_eq!(words.len(), 2);
        let (wheel_l, left) = frame::decode_speed(words[0]);
        let (wheel_r, right) = frame::decode_speed(words[1]);
        assert_eq!(wheel_l, Wheel::Left);
        assert_eq!(wheel_r, Wheel::Right);
        // Heading is 0, target pi/2: a positive turn, wheels opposed.
        assert!(left > 0.0);
        assert!(right < 0.0);
        assert!((left + right).abs() < 1e-6);
    }

    #[test]
    fn rotate_reentry_resyncs_target() {
        let (mut pilot, _link) = pilot();
        pilot.rotate_to(Some(1.25));
        pilot.stop();

        // Re-entering without a new angle targets the stored one again.
        pilot.rotate_to(None);
        assert_eq!(pilot.mode(), Mode::Rotating);
        assert_eq!(pilot.rot_pid.target(), 1.25);
    }

    #[test]
    fn follow_line_entry_resets_setpoint_and_cursor() {
        let (mut pilot, _link) = pilot();
        pilot.rot_pid.set_point(2.0);
        pilot.line_pid.set_point(9.0);

        pilot.follow_line(Some(straight_path(21)));
        assert_eq!(pilot.mode(), Mode::LineFollow);
        assert_eq!(pilot.line_pid.target(), 0.0);
        assert_eq!(pilot.tracker.cursor(), 0);

        // Walk far enough to advance the cursor, then re-enter without a new
        // path: progress is kept.
        pilot.update(Some(Point::new(6.0, 0.0))).unwrap();
        let cursor = pilot.tracker.cursor();
        assert!(cursor > 0);
        pilot.follow_line(None);
        assert_eq!(pilot.tracker.cursor(), cursor);
    }

    #[test]
    fn commands_are_always_clamped() {
        let (mut pilot, link) = pilot();
        // Absurd target so the raw PID output is far outside [-1, 1].
        pilot.rotate_to(Some(50.0));
        pilot.update(None).unwrap();

        for word in link.written() {
            let (_, speed) = frame::decode_speed(word);
            assert!(speed.abs() <= 1.0);
        }
    }

    #[test]
    fn stale_sensor_keeps_orientation() {
        let (mut pilot, link) = pilot();
        // Calibrated: a0 -> y = (318+337-465)/190 = 1.0, a1 -> x = 0.0.
        link.push_sample((318, 128));
        pilot.update(None).unwrap();
        let sensed = pilot.orientation;
        assert!((sensed.x - 0.0).abs() < 1e-6);
        assert!((sensed.y - 1.0).abs() < 1e-6);

        // Five ticks with nothing new on the link: value held exactly.
        for _ in 0..5 {
            pilot.update(None).unwrap();
            assert_eq!(pilot.orientation, sensed);
        }
    }

    #[test]
    fn exhausted_path_stops_pilot() {
        let (mut pilot, link) = pilot();
        pilot.follow_line(Some(Vec::new()));
        assert_eq!(pilot.mode(), Mode::LineFollow);

        pilot.update(None).unwrap();
        assert_eq!(pilot.mode(), Mode::Still);
        assert_eq!(link.written(), vec![0x00, 0x80]);
    }
}
