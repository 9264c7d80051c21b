// Generic PID loop shared by the heading and line-following controllers.
//
// The integral and derivative terms are computed against the tick period, so
// update() must be called at a fixed rate (the runtime's interval driver).

/// Stateful PID controller driving a measured value toward a set-point.
pub struct Pid {
    kp: f32,
    ki: f32,
    kd: f32,

    target: f32,
    integral: f32,
    // None until the first update; there is no derivative history yet.
    prev_error: Option<f32>,
}

impl Pid {
    pub fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self {
            kp,
            ki,
            kd,
            target: 0.0,
            integral: 0.0,
            prev_error: None,
        }
    }

    /// Replace the set-point.
    ///
    /// Accumulated integral and derivative history are kept on purpose:
    /// re-targeting mid-motion carries the loop's momentum over instead of
    /// kicking the output back to the proportional term alone.
    pub fn set_point(&mut self, target: f32) {
        self.target = target;
    }

    /// Current set-point.
    pub fn target(&self) -> f32 {
        self.target
    }

    /// Advance the loop by one tick and return the control output.
    ///
    /// `dt` is the tick period in seconds and must be the same on every call.
    pub fn update(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.target - measurement;

        self.integral += error * dt;

        let derivative = match self.prev_error {
            Some(prev) => (error - prev) / dt,
            None => 0.0,
        };
        self.prev_error = Some(error);

        self.kp * error + self.ki * self.integral + self.kd * derivative
    }
}
