use std::time::Duration;

use clap::{Args, Subcommand};
use uartlink_frame::MessageType;
use uartlink_session::Messenger;

use crate::exit::{session_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod connect;
pub mod fetch;
pub mod ports;
pub mod send;
pub mod version;
pub mod watch;

/// Read timeout for blocking link reads. Bounds how long workers take to
/// notice their shutdown signal.
const READ_TIMEOUT: Duration = Duration::from_millis(50);

const DEFAULT_BAUD: u32 = 115_200;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Queue one or more commands for transmission.
    Send(SendArgs),
    /// Run the receiver and print demultiplexed messages.
    Watch(WatchArgs),
    /// One diagnostic header+payload read, bypassing the queues.
    Fetch(FetchArgs),
    /// Reset the counterpart and perform the ready handshake.
    Connect(ConnectArgs),
    /// List serial devices on this host.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, format),
        Command::Watch(args) => watch::run(args, format),
        Command::Fetch(args) => fetch::run(args, format),
        Command::Connect(args) => connect::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial device path.
    pub port: String,
    /// Commands to transmit, in order.
    #[arg(required = true)]
    pub commands: Vec<String>,
    /// Baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Serial device path.
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
    /// Only print these message types (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<MessageType>>,
    /// Exit after printing N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Serial device path.
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
    /// Give up after this long without a complete message (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Serial device path.
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = DEFAULT_BAUD)]
    pub baud: u32,
    /// How long to wait for the ready announcement (e.g. 10s, 500ms).
    #[arg(long, default_value = "10s")]
    pub timeout: String,
    /// BCM pin wired to the counterpart's reset line (requires the `rpi`
    /// build).
    #[arg(long)]
    pub reset_pin: Option<u8>,
    /// Skip the reset pulse and only wait for the announcement.
    #[arg(long)]
    pub skip_reset: bool,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

fn open_messenger(port: &str, baud: u32) -> CliResult<Messenger> {
    Messenger::open(port, baud, READ_TIMEOUT).map_err(|err| session_error("open failed", err))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(CliError::new(
            USAGE,
            format!("unsupported duration unit: {unit}"),
        )),
    }
}
