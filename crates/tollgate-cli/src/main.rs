//! Tollgate controller runner.
//!
//! Runs the control loop against simulated peripherals. Card scans come from
//! stdin as hex UIDs (`C0 5F 6E 1D`). Without `--port` the host side is a
//! loopback: UID lines sent by the controller are logged and `!grant` /
//! `!deny` typed on stdin are delivered as host decisions.

use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tollgate_controller::{Controller, ControllerConfig, Peripherals};
use tollgate_core::Uid;
use tollgate_hardware::AnyHostLink;
use tollgate_hardware::mock::{
    HostInjector, MockBuzzer, MockCardReader, MockCardReaderHandle, MockHostLink,
    MockHostLinkHandle, MockServo, VirtualLcd, VirtualLcdHandle,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "tollgate", version, about = "RFID access-control gate controller")]
struct Cli {
    /// Where authorization decisions come from.
    #[arg(long, value_enum, default_value_t = Mode::Remote, env = "TOLLGATE_MODE")]
    mode: Mode,

    /// Reference UID for local mode, e.g. "C0 5F 6E 1D".
    #[arg(long, env = "TOLLGATE_REFERENCE_UID", required_if_eq("mode", "local"))]
    reference_uid: Option<String>,

    /// Serial port of the host (requires the `serial` feature).
    #[arg(long, env = "TOLLGATE_PORT")]
    port: Option<String>,

    #[arg(long, default_value_t = 9600, env = "TOLLGATE_BAUD")]
    baud: u32,

    /// Control loop period in milliseconds.
    #[arg(long, default_value_t = 20, env = "TOLLGATE_POLL_INTERVAL_MS")]
    poll_interval_ms: u64,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Local,
    Remote,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;

    let (reader, cards) = MockCardReader::new();
    let (display, mut lcd) = VirtualLcd::new();
    // Nobody observes tones or gate moves here; dropping the handles keeps
    // their recording channels from growing.
    let (tone, _) = MockBuzzer::new();
    let (gate, _) = MockServo::new();

    let (link, injector) = match cli.port.as_deref() {
        Some(port) => (open_serial(port, cli.baud)?, None),
        None => {
            let (link, host) = MockHostLink::new();
            let injector = host.injector();
            tokio::spawn(log_host_lines(host));
            (AnyHostLink::Mock(link), Some(injector))
        }
    };

    info!(mode = %config.mode(), link = link.kind(), "Starting tollgate");

    tokio::spawn(async move { log_display(&mut lcd).await });
    tokio::spawn(read_console(cards, injector));

    let mut controller = Controller::new(
        config,
        Peripherals {
            reader,
            display,
            tone,
            gate,
            link,
        },
    );

    controller
        .run_until(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(%error, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!(gate = ?controller.gate(), "Shutdown complete");
    Ok(())
}

fn build_config(cli: &Cli) -> anyhow::Result<ControllerConfig> {
    let builder = ControllerConfig::builder()
        .poll_interval(Duration::from_millis(cli.poll_interval_ms));

    let builder = match (cli.mode, cli.reference_uid.as_deref()) {
        (Mode::Local, Some(reference)) => builder.local_reference(reference),
        (Mode::Local, None) => bail!("local mode needs --reference-uid"),
        (Mode::Remote, _) => builder.remote(),
    };

    builder.build().context("invalid controller configuration")
}

#[cfg(feature = "serial")]
fn open_serial(port: &str, baud: u32) -> anyhow::Result<AnyHostLink> {
    let link = tollgate_hardware::SerialHostLink::open(port, baud)
        .with_context(|| format!("failed to open {port}"))?;
    Ok(AnyHostLink::Serial(link))
}

#[cfg(not(feature = "serial"))]
fn open_serial(port: &str, _baud: u32) -> anyhow::Result<AnyHostLink> {
    bail!("cannot open {port}: built without the `serial` feature")
}

/// Feed stdin lines to the reader, or to the loopback host for `!` commands.
async fn read_console(cards: MockCardReaderHandle, injector: Option<HostInjector>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('!') {
            let decision = match command {
                "grant" => "ACCESS_GRANTED",
                "deny" => "ACCESS_DENIED",
                other => {
                    warn!(command = other, "Unknown console command, use !grant or !deny");
                    continue;
                }
            };
            match &injector {
                Some(injector) => {
                    if let Err(error) = injector.send_line(decision) {
                        warn!(%error, "Loopback host is gone");
                    }
                }
                None => warn!("Host decisions come from the serial port"),
            }
            continue;
        }

        match Uid::from_hex(line) {
            Ok(uid) => {
                if let Err(error) = cards.present_card(uid).await {
                    warn!(%error, "Card reader is gone");
                    return;
                }
            }
            Err(error) => warn!(%error, input = line, "Not a card UID"),
        }
    }
}

async fn log_host_lines(mut host: MockHostLinkHandle) {
    while let Some(line) = host.recv_line().await {
        info!(line = %line, "Host <- controller");
    }
}

/// Log every frame shown on the LCD, draining the frame record as it goes.
async fn log_display(lcd: &mut VirtualLcdHandle) {
    while lcd.changed().await.is_some() {
        for frame in lcd.take_frames() {
            info!(line0 = frame.text(0), line1 = frame.text(1), "LCD");
        }
    }
}
