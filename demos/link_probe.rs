// Link probe: READ-ONLY check of the bot serial link
//
// Dumps raw orientation samples as they arrive. Nothing is written to the
// bot, so this is safe to run first when bringing a link up.
//
// Usage: cargo run --example link_probe -- [--baudrate N] [PORT]

use std::thread::sleep;
use std::time::Duration;

use clap::Parser;

use gridbot_zenoh_runtime::config::LINK_PORT;
use gridbot_zenoh_runtime::link::serial::DEFAULT_BAUDRATE;
use gridbot_zenoh_runtime::link::{Link, SerialLink};

#[derive(Parser)]
#[command(about = "Read-only probe of the bot serial link")]
struct Args {
    /// Serial device the link is bound to
    #[arg(default_value = LINK_PORT)]
    port: String,

    /// Baud rate
    #[arg(long, default_value_t = DEFAULT_BAUDRATE)]
    baudrate: u32,

    /// Stop after this many samples
    #[arg(long, default_value_t = 50)]
    count: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    println!("Serial port: {} @ {} baud", args.port, args.baudrate);
    println!("Waiting for {} orientation samples (Ctrl+C to abort)...", args.count);

    let mut link = SerialLink::open_with_baudrate(&args.port, args.baudrate)?;

    let mut seen = 0;
    while seen < args.count {
        if let Some((a0, a1)) = link.read_last()? {
            seen += 1;
            println!("[{:3}] a0={:5}  a1={:5}", seen, a0, a1);
        }
        sleep(Duration::from_millis(20));
    }

    println!("Link OK: {} samples received", seen);
    Ok(())
}
