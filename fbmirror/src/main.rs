//! fbmirror entry point.
//!
//! ```text
//! fbmirror                      Mirror the attached device with defaults
//! fbmirror --config <path>      Use custom config TOML
//! fbmirror --serial <serial>    Pick a device (overrides config)
//! fbmirror --gen-config         Dump default config and exit
//! fbmirror --write-config       Write default config to --config path
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use fbmirror_core::{
    AdbBridge, Coordinator, DecodedFrame, FramebufferDescriptor, SceneLayout, StatusEvent,
};

use fbmirror::config::AppConfig;
use fbmirror::console::{Console, ConsoleCommand};
use fbmirror::sink::StatsSink;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "fbmirror", about = "Android screen mirror over adb")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "fbmirror.toml")]
    config: PathBuf,

    /// Device serial (overrides config). Example: emulator-5554
    #[arg(short, long)]
    serial: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to the `--config` path and exit.
    #[arg(long)]
    write_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&AppConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    if cli.write_config {
        AppConfig::write_default(&cli.config)?;
        println!("wrote {}", cli.config.display());
        return Ok(());
    }

    // Parse errors surface here, before logging exists.
    let mut config = AppConfig::load(&cli.config)?;
    if let Some(serial) = cli.serial {
        config.device.serial = serial;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("fbmirror v{}", env!("CARGO_PKG_VERSION"));
    if cli.config.exists() {
        info!("config loaded from {}", cli.config.display());
    } else {
        info!("no config at {}; using defaults", cli.config.display());
    }
    config.validate()?;

    // ── 1. Start the engine ─────────────────────────────────────

    let bridge = Arc::new(AdbBridge::new(config.to_adb_config()));
    let (mut stats, stats_rx) = StatsSink::new();
    let (handle, mut status_rx) = Coordinator::spawn(
        bridge.clone(),
        bridge,
        move |frame: DecodedFrame| stats.record(&frame),
        config.to_mirror_config(),
    );

    // ── 2. Event loop ───────────────────────────────────────────

    let mut console = Console::new(SceneLayout::fit_view(
        &FramebufferDescriptor::default(),
        config.display.width,
        config.display.height,
    ));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut report = tokio::time::interval(Duration::from_secs(5));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }

            Some(status) = status_rx.recv() => {
                console.observe(&status);
                log_status(&status);
            }

            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match console.parse(&line) {
                    Ok(ConsoleCommand::Input(events)) => {
                        for event in events {
                            handle.send_input(event)?;
                        }
                    }
                    Ok(ConsoleCommand::Quit) => break,
                    Err(e) => warn!("{e}"),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("stdin closed: {e}");
                    stdin_open = false;
                }
            },

            _ = report.tick() => {
                let s = stats_rx.borrow().clone();
                if s.total_frames > 0 {
                    info!(
                        fps = s.fps,
                        frames = s.total_frames,
                        bytes = s.total_bytes,
                        "{}x{}",
                        s.width,
                        s.height
                    );
                }
            }
        }
    }

    // ── 3. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    handle.shutdown().await?;
    Ok(())
}

fn log_status(status: &StatusEvent) {
    match status {
        StatusEvent::Connected => info!("device connected"),
        StatusEvent::Disconnected(reason) => info!("device disconnected: {reason}"),
        StatusEvent::ScreenOn => info!("screen on"),
        StatusEvent::ScreenOff => info!("screen off"),
        StatusEvent::GeometryChanged { descriptor, .. } => info!(
            "framebuffer {}x{} {:?}",
            descriptor.width, descriptor.height, descriptor.pixel_format
        ),
        StatusEvent::LayoutChanged(layout) => info!("scene {:?}", layout.scene_size()),
        StatusEvent::Prompt(Some(text)) => info!("{text}"),
        StatusEvent::Prompt(None) => {}
    }
}
