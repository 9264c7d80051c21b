// Timeouts, topics, link configuration
use std::time::Duration;

// Control loop frequency
pub const LOOP_HZ: u64 = 50;

// Tick period handed to the PID loops. The interval driver in runtime.rs is
// what actually guarantees this cadence.
pub const TICK_DT: f32 = 1.0 / LOOP_HZ as f32;

// Pose timeout for the watchdog: line following without a fresh position is
// driving blind, so the pilot is stopped once updates go stale.
pub const POSE_TIMEOUT: Duration = Duration::from_millis(500);

// Zenoh topics
pub const TOPIC_CMD_PILOT: &str = "gridbot/cmd/pilot"; // commands
pub const TOPIC_POSE: &str = "gridbot/state/pose"; // position from the localizer
pub const TOPIC_HEALTH: &str = "gridbot/state/health"; // health status

// Serial device for the bluetooth link to the bot (RFCOMM bind of the HC-05)
pub const LINK_PORT: &str = "/dev/rfcomm0";
