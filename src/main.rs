//! ble-uart-bridge
//!
//! Bridges the terminal to a serial-over-BLE peripheral: lines typed on stdin
//! are written to the peripheral, notifications are printed to stdout.
//! Ctrl+C stops notifications and disconnects.

use std::io::{self, BufReader, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{anyhow, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use log::{error, info, warn};

use ble_uart_bridge::ble::{BtleConnector, BtleLink};
use ble_uart_bridge::bridge::{
    event_channel, BridgeController, NotificationConsumer, PumpExit, ReassemblyConsumer,
};
use ble_uart_bridge::config::input::PROMPT;
use ble_uart_bridge::config::scan::DEFAULT_TIMEOUT_SECS;
use ble_uart_bridge::config::{parse_uuid, BridgeProfile};

#[derive(Parser)]
#[command(name = "ble-uart-bridge")]
#[command(about = "Console bridge for serial-over-BLE peripherals")]
struct Args {
    /// Peripheral address, e.g. AA:BB:CC:DD:EE:FF
    address: String,

    /// Built-in characteristic profile
    #[arg(
        long,
        default_value = "nordic",
        value_parser = ["nordic", "nus", "transparent", "rn4871"]
    )]
    profile: String,

    /// Seconds to scan for the peripheral before giving up
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    scan_timeout: u64,

    /// Characteristic to write console input into (overrides the profile)
    #[arg(long)]
    tx_uuid: Option<String>,

    /// Characteristic to print notifications from (repeatable, overrides the profile)
    #[arg(long)]
    rx_uuid: Vec<String>,

    /// Maximum bytes per write
    #[arg(long)]
    mtu: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn bridge_profile(&self) -> Result<BridgeProfile> {
        let mut profile = BridgeProfile::by_name(&self.profile)
            .ok_or_else(|| anyhow!("unknown profile {:?}", self.profile))?;

        if let Some(tx) = &self.tx_uuid {
            profile.tx_uuid = parse_uuid(tx)?;
        }
        if !self.rx_uuid.is_empty() {
            profile.notify_uuids = self
                .rx_uuid
                .iter()
                .map(|s| parse_uuid(s))
                .collect::<Result<Vec<_>, _>>()?;
            profile.also_require.clear();
        }
        if let Some(mtu) = self.mtu {
            profile.mtu = mtu;
        }

        Ok(profile)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(_) => {
            println!("{}", Args::command().render_usage());
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if args.verbose { "debug" } else { "info" },
    ))
    .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let profile = args.bridge_profile()?;
    let connector = BtleConnector::with_scan_timeout(Duration::from_secs(args.scan_timeout));
    let mut bridge: BridgeController<BtleLink> = BridgeController::new(profile);

    // Ctrl+C only posts a Cancel. Startup and the event loop both watch for it
    let (canceller, mut events) = event_channel();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            canceller.cancel();
        }
    });

    eprintln!("{} {}", "Connecting to".bold(), args.address);
    bridge
        .start_or_cancel(
            &connector,
            &args.address,
            |_| -> Box<dyn NotificationConsumer> {
                Box::new(ReassemblyConsumer::new(io::stdout()))
            },
            &mut events,
        )
        .await?;
    eprintln!("{}", "Connected!".green());

    println!("{}", PROMPT);
    io::stdout().flush()?;

    let rt = tokio::runtime::Handle::current();
    bridge.launch_pump(BufReader::new(io::stdin()), move |pump| {
        std::thread::spawn(move || match rt.block_on(pump.run()) {
            PumpExit::EndOfInput => info!("Input closed; still printing notifications"),
            exit => warn!("Input pump stopped: {:?}", exit),
        });
    })?;

    let errors = bridge.run(events).await;
    if errors.is_empty() {
        eprintln!("{}", "Disconnected".green());
    } else {
        eprintln!(
            "{}",
            format!("Disconnected with {} shutdown error(s)", errors.len()).yellow()
        );
    }

    Ok(())
}
