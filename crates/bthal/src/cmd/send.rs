use std::io::Read;
use std::time::{Duration, Instant};

use bthal_frame::{Frame, FrameConfig, FrameError, FrameReader, FrameWriter, MAX_PAYLOAD};
use bthal_proto::{is_event, service};
use bthal_transport::HalSocket;
use tracing::debug;

use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{frame_error, transport_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE};
use crate::output::{print_frame, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    if !service::is_valid(args.service) {
        return Err(CliError::new(
            USAGE,
            format!("unknown service id {}", args.service),
        ));
    }
    let payload = match &args.data {
        Some(data) => parse_hex(data)?,
        None => Vec::new(),
    };
    let timeout = parse_duration(&args.timeout)?;

    let stream = HalSocket::connect(&args.socket.socket)
        .map_err(|err| transport_error("connect failed", err))?;
    let read_half = stream
        .try_clone()
        .map_err(|err| transport_error("connect failed", err))?;
    let config = FrameConfig {
        read_timeout: Some(timeout),
        write_timeout: Some(timeout),
    };

    let mut writer = FrameWriter::with_config_hal(stream, config.clone())
        .map_err(|err| frame_error("send failed", err))?;
    writer
        .send(args.service, args.opcode, &payload)
        .map_err(|err| frame_error("send failed", err))?;
    debug!(
        service_id = args.service,
        opcode = args.opcode,
        len = payload.len(),
        "frame sent"
    );

    if args.wait {
        let mut reader = FrameReader::with_config_hal(read_half, config)
            .map_err(|err| frame_error("receive failed", err))?;
        wait_for_response(&mut reader, timeout, |frame| print_frame(frame, format))?;
    }

    Ok(SUCCESS)
}

/// Pass every frame to `show` until the first non-event frame arrives.
fn wait_for_response<R: Read>(
    reader: &mut FrameReader<R>,
    timeout: Duration,
    mut show: impl FnMut(&Frame),
) -> CliResult<Frame> {
    let deadline = Instant::now() + timeout;
    loop {
        let frame = reader.read_frame().map_err(|err| match err {
            FrameError::Io(io)
                if matches!(
                    io.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                CliError::new(TIMEOUT, format!("no response within {timeout:?}"))
            }
            other => frame_error("receive failed", other),
        })?;
        show(&frame);
        if !is_event(frame.opcode) {
            return Ok(frame);
        }
        if Instant::now() >= deadline {
            return Err(CliError::new(
                TIMEOUT,
                format!("no response within {timeout:?}"),
            ));
        }
    }
}

/// Parse `--data`: hex digit pairs, optionally split by `:`, `-` or spaces.
fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .chars()
        .filter(|c| !matches!(c, ':' | '-' | ' '))
        .collect();
    let digits = digits
        .strip_prefix("0x")
        .unwrap_or(digits.as_str())
        .to_string();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("--data has an odd number of hex digits: {input}"),
        ));
    }

    let bytes = digits
        .as_bytes()
        .chunks(2)
        .map(|pair| match (hex_digit(pair[0]), hex_digit(pair[1])) {
            (Some(hi), Some(lo)) => Some(hi << 4 | lo),
            _ => None,
        })
        .collect::<Option<Vec<u8>>>()
        .ok_or_else(|| CliError::new(USAGE, format!("--data is not hex: {input}")))?;

    if bytes.len() > MAX_PAYLOAD {
        return Err(CliError::new(
            USAGE,
            format!("--data is {} bytes (max {MAX_PAYLOAD})", bytes.len()),
        ));
    }
    Ok(bytes)
}

fn hex_digit(byte: u8) -> Option<u8> {
    char::from(byte).to_digit(16).map(|d| d as u8)
}
