//! HID bridge runner: entry point.
//!
//! Runs the bridge firmware core as a host process.  The host link is a
//! byte stream (a serial device, a pty, or stdin/stdout); USB endpoints and
//! PS/2 wires are simulated and log everything the target would receive.
//!
//! # Usage
//!
//! ```text
//! hid-bridge [OPTIONS]
//!
//! Options:
//!   -c, --config <PATH>        Config file [default: hid-bridge.toml]
//!       --transport <KIND>     uart | spi | legacy (overrides config)
//!       --device <PATH>        Host link device, `-` for stdio (overrides config)
//!       --write-config         Write the effective config and exit
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable               | Description                  |
//! |------------------------|------------------------------|
//! | `HID_BRIDGE_CONFIG`    | Config file path             |
//! | `HID_BRIDGE_TRANSPORT` | Transport kind               |
//! | `HID_BRIDGE_DEVICE`    | Host link device             |
//! | `RUST_LOG`             | Log filter (beats config)    |
//!
//! Logs go to stderr so stdout stays free for the host link.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hid_bridge_core::Command;
use tokio::io::{AsyncRead, AsyncWrite};

use hid_bridge_fw::application::{build_bridge, run_bridge, StopReason};
use hid_bridge_fw::infrastructure::link::MonotonicClock;
use hid_bridge_fw::infrastructure::storage::{load_config, save_config, AppConfig, TransportKind};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// KVM HID bridge.
///
/// Accepts framed commands from a KVM host controller and replays them as
/// USB or PS/2 keyboard and mouse input.
#[derive(Debug, Parser)]
#[command(
    name = "hid-bridge",
    about = "Keyboard/mouse bridge between a KVM host controller and a target machine",
    version
)]
struct Cli {
    /// Path of the TOML configuration file.  A missing file means defaults.
    #[arg(short, long, default_value = "hid-bridge.toml", env = "HID_BRIDGE_CONFIG")]
    config: PathBuf,

    /// Host link protocol.
    #[arg(long, value_enum, env = "HID_BRIDGE_TRANSPORT")]
    transport: Option<TransportKind>,

    /// Host link device path; `-` for stdin/stdout.
    #[arg(long, env = "HID_BRIDGE_DEVICE")]
    device: Option<String>,

    /// Write the effective configuration to `--config` and exit.
    #[arg(long)]
    write_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)
        .with_context(|| format!("failed to load config {}", cli.config.display()))?;
    if let Some(kind) = cli.transport {
        config.transport.kind = kind;
    }
    if let Some(device) = cli.device {
        config.transport.device = device;
    }

    // Initialise structured logging on stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&config.log_level))
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if cli.write_config {
        save_config(&config, &cli.config)
            .with_context(|| format!("failed to write config {}", cli.config.display()))?;
        info!(path = %cli.config.display(), "config written");
        return Ok(());
    }

    info!(
        transport = ?config.transport.kind,
        device = %config.transport.device,
        "HID bridge starting"
    );

    let clock = MonotonicClock::new();
    let device = config.transport.device.clone();

    if device == "-" {
        serve(tokio::io::stdin(), tokio::io::stdout(), &config, &clock).await?;
    } else {
        let link = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&device)
            .await
            .with_context(|| format!("failed to open host link {device}"))?;
        let (reader, writer) = tokio::io::split(link);
        serve(reader, writer, &config, &clock).await?;
    }

    info!("HID bridge stopped");
    Ok(())
}

// ── Serve the host link, restarting on output changes ─────────────────────────

async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    config: &AppConfig,
    clock: &MonotonicClock,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let poll_interval = Duration::from_millis(config.poll_interval_ms.max(1));

    loop {
        let (mut bridge, _hardware) =
            build_bridge(config).context("failed to initialise output selection store")?;

        let outcome = tokio::select! {
            result = run_bridge(&mut reader, &mut writer, &mut bridge, clock, poll_interval) => {
                Some(result.context("bridge stopped with an error")?)
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("failed to listen for shutdown signal: {e}");
                }
                info!("shutdown signal received");
                None
            }
        };

        // Leave nothing held on the target.
        bridge.dispatcher_mut().dispatch(Command::ClearHid);

        match outcome {
            Some(stats) if stats.stop == StopReason::RestartRequired => {
                info!(selection = ?bridge.dispatcher().selection(), "restarting with new outputs");
            }
            Some(stats) => {
                info!(bytes_in = stats.bytes_in, bytes_out = stats.bytes_out, "host link closed");
                return Ok(());
            }
            None => return Ok(()),
        }
    }
}
