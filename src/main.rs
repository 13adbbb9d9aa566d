//! Console frontend for the station.
//!
//! Thin presentation layer: parses the CLI, loads configuration, starts a
//! device session in the requested role, then prints the session's event
//! stream until Ctrl-C. Stdin lines become beacon text updates (beacon
//! role) or outbound messages (messenger role).

use clap::{Parser, Subcommand};
use rylr_station::{
    config, device, AppResult, DeviceSession, PollSettings, Role, SessionEvent, SessionHandle,
    Transport, Variant,
};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "rylr-station",
    version,
    about = "Beacon, messenger, and repeater roles for RYLR993/RYLR998 LoRa modules."
)]
struct Args {
    /// Configuration file path (bypasses the standard resolution order).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Serial port path, e.g. /dev/ttyS0.
    #[arg(short, long, global = true)]
    port: Option<String>,

    /// Hardware variant: RYLR993 or RYLR998.
    #[arg(long, global = true)]
    variant: Option<Variant>,

    /// Radio frequency in Hz.
    #[arg(long, global = true)]
    frequency: Option<u32>,

    /// Node address (0-65535).
    #[arg(long, global = true)]
    address: Option<u16>,

    /// Transmit power in dBm.
    #[arg(long, global = true)]
    power: Option<u8>,

    #[command(subcommand)]
    role: RoleCommand,
}

#[derive(Subcommand, Debug)]
enum RoleCommand {
    /// Transmit a beacon on a fixed interval while receiving.
    Beacon {
        /// Beacon text. Stdin lines replace it at runtime.
        #[arg(long)]
        text: Option<String>,

        /// Beacon interval in seconds.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Interactive messenger: stdin lines are sent, inbound frames shown.
    Messenger,
    /// Stateless single-hop repeater.
    Repeater {
        /// Relay identity; also used as the module address.
        #[arg(long)]
        station: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };

    // CLI flags override file and environment values.
    if let Some(port) = &args.port {
        cfg.station.port = port.clone();
    }
    if let Some(variant) = args.variant {
        cfg.station.variant = variant;
    }
    if let Some(frequency) = args.frequency {
        cfg.station.frequency_hz = frequency;
    }
    if let Some(address) = args.address {
        cfg.station.address = address;
    }
    if let Some(power) = args.power {
        cfg.station.power_dbm = power;
    }

    let role = match &args.role {
        RoleCommand::Beacon { text, interval } => Role::Beacon {
            text: text.clone().unwrap_or_else(|| cfg.beacon.text.clone()),
            interval: interval
                .map(Duration::from_secs)
                .unwrap_or_else(|| cfg.beacon.interval()),
        },
        RoleCommand::Messenger => Role::Interactive,
        RoleCommand::Repeater { station } => {
            let station = station
                .or(args.address)
                .unwrap_or(device::DEFAULT_REPEATER_ADDRESS);
            cfg.station.address = station;
            Role::Repeater {
                station_id: station.to_string(),
            }
        }
    };

    let poll = PollSettings {
        read_timeout: Duration::from_millis(cfg.poll.read_timeout_ms),
        idle_delay: Duration::from_millis(cfg.poll.idle_delay_ms),
    };

    let profile = cfg.station.profile();
    println!(
        "rylr-station: {} on {} at {} Hz, address {}",
        profile.variant, profile.port, profile.frequency_hz, profile.address
    );

    let transport = Transport::open(&profile)?;
    let handle =
        DeviceSession::with_transport(profile, role.clone(), transport, poll).await?;

    run_console(handle, role).await;
    Ok(())
}

/// Print the session's event stream; route stdin by role; Ctrl-C shuts
/// the session down and waits for the terminal state.
async fn run_console(mut handle: SessionHandle, role: Role) {
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            event = handle.next_event() => {
                match event {
                    Some(event) => print_event(&event),
                    None => break,
                }
            }
            line = stdin.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    _ => {
                        stdin_open = false;
                        continue;
                    }
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match &role {
                    Role::Beacon { .. } => {
                        handle.set_beacon_text(line);
                        println!("New beacon text set: {line}");
                    }
                    Role::Interactive => {
                        if let Err(err) = handle.send_user_message(line) {
                            eprintln!("Send failed: {err}");
                        }
                    }
                    Role::Repeater { .. } => {}
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Shutting down...");
                handle.shutdown();
                break;
            }
        }
    }

    handle.closed().await;
    if handle.malformed_count() > 0 {
        println!("Skipped {} malformed lines this session", handle.malformed_count());
    }
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Inbound(inbound) => {
            println!(
                "Message from {}: {} (RSSI {} SNR {})",
                inbound.sender,
                inbound.payload_text(),
                inbound.rssi,
                inbound.snr
            );
        }
        SessionEvent::Log(entry) => println!("{entry}"),
        // Stand-in for the repeater host's LED indicator.
        SessionEvent::Processed => println!("."),
    }
}
