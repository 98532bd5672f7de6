//! Rover control client — entry point.
//!
//! ```text
//! rover-ctl                      Connect with defaults
//! rover-ctl --config <path>      Use custom config TOML
//! rover-ctl --robot <host:port>  Override the robot address
//! rover-ctl --gen-config         Dump default config and exit
//! ```

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rover_link::{LinkClient, MAX_SPEED};

use rover_ctl::config::CtlConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rover-ctl", about = "Headless rover telemetry monitor and command sender")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "rover-ctl.toml")]
    config: PathBuf,

    /// Robot address (overrides config). Example: 192.168.43.161:5050
    #[arg(short, long)]
    robot: Option<String>,

    /// Fixed drive speed to command, clamped to the drivetrain limit.
    #[arg(long)]
    speed: Option<i32>,

    /// Fixed drive direction to command, in degrees.
    #[arg(long)]
    direction: Option<i32>,

    /// Fixed turn speed to command.
    #[arg(long)]
    turn_speed: Option<i32>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&CtlConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = CtlConfig::load(&cli.config);
    if let Some(addr) = cli.robot {
        config.network.robot_address = addr;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("rover-ctl v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Connect and start the link ───────────────────────────

    let info = config.robot_info()?;
    let client = LinkClient::connect(&info, config.link_config()).await?;
    let robot = client.robot();

    if let Some(v) = cli.speed {
        robot.set_speed(v.clamp(-MAX_SPEED, MAX_SPEED));
    }
    if let Some(v) = cli.direction {
        robot.set_direction(v);
    }
    if let Some(v) = cli.turn_speed {
        robot.set_turn_speed(v);
    }

    // ── 2. Command pump ─────────────────────────────────────────

    // Headless client: there is no camera, so each command frame rides
    // an empty video payload.
    let outgoing = client.outgoing_video();
    let command_interval =
        Duration::from_millis((1000 / config.monitor.command_rate_hz.max(1) as u64).max(1));
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(command_interval);
        loop {
            tick.tick().await;
            outgoing.publish(Bytes::new());
        }
    });

    // ── 3. Monitor loop ─────────────────────────────────────────

    let mut status = client.status();
    let status_view = client.status();
    let mut incoming = client.incoming_video();
    let mut telemetry_tick =
        tokio::time::interval(Duration::from_millis(config.monitor.telemetry_interval_ms.max(100)));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted; closing link");
                break;
            }
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let health = status.borrow_and_update().health;
                if health.is_terminal() {
                    warn!("link is {health}; shutting down");
                    break;
                }
            }
            _ = telemetry_tick.tick() => {
                let t = robot.telemetry();
                let s = status_view.borrow().clone();
                let video = incoming.take();
                info!(
                    "gyro={:>4}  us={:?}  video={}B  rx={} cycles/{}B  tx={} frames/{}B",
                    t.gyro, t.us, video.len(),
                    s.cycles_received, s.bytes_received,
                    s.frames_sent, s.bytes_sent,
                );
            }
        }
    }

    // ── 4. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    client.join().await?;
    Ok(())
}
