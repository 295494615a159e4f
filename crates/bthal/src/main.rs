mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "bthal", version, about = "Bluetooth HAL socket console and tools")]
struct Cli {
    /// Output format for received frames.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "bthal",
            "send",
            "--socket",
            "/tmp/hal.sock",
            "--service",
            "1",
            "--opcode",
            "0x01",
            "--wait",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!((args.service, args.opcode), (1, 0x01));
        assert!(!args.socket.socket.is_abstract());
    }

    #[test]
    fn send_requires_service_and_opcode() {
        let err = Cli::try_parse_from(["bthal", "send", "--opcode", "1"])
            .expect_err("missing --service should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn console_defaults_to_abstract_socket() {
        let cli = Cli::try_parse_from(["bthal", "console"]).expect("console args should parse");
        let Command::Console(args) = cli.command else {
            panic!("expected console");
        };
        if std::env::var_os("BTHAL_SOCKET").is_none() {
            assert_eq!(args.socket.socket.to_string(), "@bluez_hal_socket");
        }
        assert_eq!(args.timeout, "5s");
    }

    #[test]
    fn parses_serve_subcommand() {
        let cli = Cli::try_parse_from(["bthal", "serve", "--socket", "@test_hal", "--count", "3"])
            .expect("serve args should parse");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.count, Some(3));
        assert!(args.socket.socket.is_abstract());
    }
}
