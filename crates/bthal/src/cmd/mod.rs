use std::time::Duration;

use bthal_transport::Endpoint;
use clap::{Args, Subcommand};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod console;
pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the interactive HAL console (reads commands from stdin).
    Console(ConsoleArgs),
    /// Run a stand-in HAL service on the socket.
    Serve(ServeArgs),
    /// Send a single raw frame.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Console(args) => console::run(args),
        Command::Serve(args) => serve::run(args),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone)]
pub struct SocketArgs {
    /// HAL socket: `@name` for an abstract socket, otherwise a path.
    #[arg(long, env = "BTHAL_SOCKET", default_value = "@bluez_hal_socket")]
    pub socket: Endpoint,
}

#[derive(Args, Debug)]
pub struct ConsoleArgs {
    #[command(flatten)]
    pub socket: SocketArgs,
    /// Time to wait for each HAL response (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Do not print a prompt even when stdin is a terminal.
    #[arg(long)]
    pub no_prompt: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub socket: SocketArgs,
    /// Exit after handling N commands.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub socket: SocketArgs,
    /// Service id (0 = core, 1 = bluetooth, 3 = hidhost, ...).
    #[arg(long, short = 's', value_parser = parse_u8)]
    pub service: u8,
    /// Opcode within the service.
    #[arg(long, short = 'o', value_parser = parse_u8)]
    pub opcode: u8,
    /// Payload as hex bytes (e.g. `01`, `0a:1b:2c`, `0a 1b`).
    #[arg(long)]
    pub data: Option<String>,
    /// Print frames until the response arrives.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for the response when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
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

/// Accepts decimal or `0x`-prefixed hex.
fn parse_u8(input: &str) -> Result<u8, String> {
    let parsed = match input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("'{input}' is not a byte value"))
}
