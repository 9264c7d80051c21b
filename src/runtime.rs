// 50 Hz control loop with pose watchdog
//
// Line following needs fresh position fixes; if the localizer stops
// publishing, the watchdog stops the bot instead of letting it steer against
// a stale position.

use std::time::{Duration, Instant};
use tokio::time::interval;
use tracing::{info, warn};

// local imports
use crate::config::{LINK_PORT, LOOP_HZ, POSE_TIMEOUT, TOPIC_CMD_PILOT, TOPIC_HEALTH, TOPIC_POSE};
use crate::control::{Mode, Pilot};
use crate::link::{Link, LinkError, SerialLink};
use crate::messages::{PilotCommand, Point, PoseUpdate, RuntimeHealth};

pub struct Runtime<L: Link> {
    pilot: Pilot<L>,
    pending_pose: Option<Point>,
    pose_received_at: Instant,
    health: RuntimeHealth,
}

impl<L: Link> Runtime<L> {
    pub fn new(pilot: Pilot<L>) -> Self {
        Self {
            pilot,
            pending_pose: None,
            pose_received_at: Instant::now(),
            health: RuntimeHealth::PoseStale, // Start stale until first pose
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    /// Process an incoming position fix
    fn on_pose(&mut self, pose: PoseUpdate) {
        self.pending_pose = Some(pose.into());
        self.pose_received_at = Instant::now();
    }

    /// Process an incoming command
    fn on_command(&mut self, cmd: PilotCommand) {
        info!("Received command: {:?}", &cmd);
        match cmd {
            PilotCommand::Stop => self.pilot.stop(),
            PilotCommand::RotateTo { angle } => self.pilot.rotate_to(angle),
            PilotCommand::FollowLine { path } => self.pilot.follow_line(path),
        }
    }

    /// Run one tick: watchdog first, then the control update
    fn tick(&mut self) -> Result<(), LinkError> {
        let pose_age = self.pose_received_at.elapsed();

        if pose_age > POSE_TIMEOUT {
            if self.health != RuntimeHealth::PoseStale {
                warn!("Pose stale ({:?} old)", pose_age);
            }
            self.health = RuntimeHealth::PoseStale;
            if self.pilot.mode() == Mode::LineFollow {
                // Watchdog triggered - stop the bot
                warn!("Line following without a fresh pose, stopping");
                self.pilot.stop();
            }
        } else {
            self.health = RuntimeHealth::Ok;
        }

        self.pilot.update(self.pending_pose.take())
    }
}

pub async fn run() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let sub_cmd = session.declare_subscriber(TOPIC_CMD_PILOT).await?;
    let sub_pose = session.declare_subscriber(TOPIC_POSE).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    info!("Opening bot link on {}", LINK_PORT);
    let link = SerialLink::open(LINK_PORT)?;

    let mut runtime = Runtime::new(Pilot::new(link));
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, {}ms pose timeout",
        LOOP_HZ,
        POSE_TIMEOUT.as_millis()
    );
    info!("Subscribed to: {}, {}", TOPIC_CMD_PILOT, TOPIC_POSE);
    info!("Publishing to: {}", TOPIC_HEALTH);

    loop {
        tick.tick().await;

        // 1. Apply all pending commands in arrival order
        while let Ok(Some(sample)) = sub_cmd.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<PilotCommand>(&payload) {
                Ok(cmd) => {
                    runtime.on_command(cmd);
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Drain pose fixes (non-blocking), keep latest
        while let Ok(Some(sample)) = sub_pose.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<PoseUpdate>(&payload) {
                Ok(pose) => {
                    runtime.on_pose(pose);
                }
                Err(e) => {
                    warn!("Failed to parse pose: {}", e);
                }
            }
        }

        // 3. Control tick (watchdog + PID loops + motor words)
        if let Err(e) = runtime.tick() {
            warn!("Link error during tick: {}", e);
        }

        // 4. Publish health
        let health_json = serde_json::to_string(&runtime.health)?;
        pub_health.put(health_json).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MockLink;

    fn runtime() -> (Runtime<MockLink>, MockLink) {
        let link = MockLink::new();
        (Runtime::new(Pilot::new(link.clone())), link)
    }

    fn demo_path() -> Vec<Point> {
        (0..10).map(|i| Point::new(i as f32, 0.0)).collect()
    }

    #[test]
    fn watchdog_stops_blind_line_follow() {
        let (mut runtime, _link) = runtime();
        runtime.on_pose(PoseUpdate { x: 0.0, y: 0.0 });
        runtime.on_command(PilotCommand::FollowLine {
            path: Some(demo_path()),
        });

        runtime.tick().unwrap();
        assert_eq!(runtime.health(), RuntimeHealth::Ok);
        assert_eq!(runtime.pilot.mode(), Mode::LineFollow);

        // Localizer goes quiet past the timeout.
        runtime.pose_received_at = Instant::now() - POSE_TIMEOUT - Duration::from_millis(50);
        runtime.tick().unwrap();
        assert_eq!(runtime.health(), RuntimeHealth::PoseStale);
        assert_eq!(runtime.pilot.mode(), Mode::Still);
    }

    #[test]
    fn stale_pose_does_not_interrupt_rotation() {
        let (mut runtime, _link) = runtime();
        runtime.on_command(PilotCommand::RotateTo { angle: Some(1.0) });

        // Rotation only needs the orientation sensor, not the localizer.
        runtime.pose_received_at = Instant::now() - POSE_TIMEOUT - Duration::from_millis(50);
        runtime.tick().unwrap();
        assert_eq!(runtime.health(), RuntimeHealth::PoseStale);
        assert_eq!(runtime.pilot.mode(), Mode::Rotating);
    }

    #[test]
    fn commands_dispatch_to_pilot() {
        let (mut runtime, _link) = runtime();
        runtime.on_command(PilotCommand::FollowLine {
            path: Some(demo_path()),
        });
        assert_eq!(runtime.pilot.mode(), Mode::LineFollow);

        runtime.on_command(PilotCommand::Stop);
        assert_eq!(runtime.pilot.mode(), Mode::Still);
    }
}
