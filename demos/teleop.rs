// Keyboard teleop: F follow demo path, 1-4 rotate to compass angles, S stop, Q quit
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::f32::consts::PI;
use std::time::Duration;
use tracing::info;

use gridbot_zenoh_runtime::config::TOPIC_CMD_PILOT;
use gridbot_zenoh_runtime::messages::{PilotCommand, Point};

// Compass targets for keys 1-4, in radians
const HEADINGS: [f32; 4] = [0.0, PI / 2.0, PI, -PI / 2.0];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_PILOT).await?;

    info!("Controls: F=follow demo path, 1-4=rotate E/N/W/S, S=stop, Q=quit");

    enable_raw_mode()?;
    let result = run_teleop(&publisher).await;
    disable_raw_mode()?;

    result
}

async fn run_teleop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    loop {
        // Poll for key with 20ms timeout
        if event::poll(Duration::from_millis(20))? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                if kind != KeyEventKind::Press {
                    continue;
                }

                let cmd = match code {
                    KeyCode::Char('f') => Some(PilotCommand::FollowLine {
                        path: Some(demo_path()),
                    }),
                    KeyCode::Char(c @ '1'..='4') => {
                        let angle = HEADINGS[c as usize - '1' as usize];
                        Some(PilotCommand::RotateTo { angle: Some(angle) })
                    }
                    KeyCode::Char('s') => Some(PilotCommand::Stop),
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    _ => None,
                };

                if let Some(cmd) = cmd {
                    info!("Sending {:?}", cmd);
                    publisher.put(serde_json::to_string(&cmd)?).await?;
                }
            }
        }
    }

    Ok(())
}

// An L-shaped run across the grid
fn demo_path() -> Vec<Point> {
    let mut path: Vec<Point> = (0..10).map(|i| Point::new(i as f32, 0.0)).collect();
    path.extend((1..10).map(|i| Point::new(9.0, i as f32)));
    path
}
