use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use bthal_frame::Frame;
use bthal_proto::{
    classify, describe_event, opcode_name, service, service_name, BluetoothEvent, HalStatus,
    Message, OpcodeKind, Response,
};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    service_id: u8,
    service: &'static str,
    opcode: u8,
    name: &'static str,
    kind: &'static str,
    payload_size: usize,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<HalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    event: Option<BluetoothEvent>,
    timestamp: String,
}

impl FrameOutput {
    fn from_frame(frame: &Frame) -> Self {
        let mut status = None;
        let mut event = None;
        match classify(frame.clone()) {
            Ok(Message::Response(Response::Error { status: s, .. })) => status = Some(s),
            Ok(Message::Event(ev)) if ev.service_id == service::BLUETOOTH => {
                event = BluetoothEvent::decode(ev.opcode, &ev.payload).ok().flatten();
            }
            _ => {}
        }

        Self {
            service_id: frame.service_id,
            service: service_name(frame.service_id).unwrap_or("unknown"),
            opcode: frame.opcode,
            name: opcode_name(frame.service_id, frame.opcode),
            kind: OpcodeKind::of(frame.opcode).as_str(),
            payload_size: frame.payload.len(),
            payload: hex(frame.payload.as_ref()),
            status,
            event,
            timestamp: now_unix_seconds(),
        }
    }
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput::from_frame(frame);
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let out = FrameOutput::from_frame(frame);
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SERVICE", "OPCODE", "NAME", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    out.service.to_string(),
                    format!("{:#04x}", out.opcode),
                    out.name.to_string(),
                    out.payload_size.to_string(),
                    out.payload,
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("{}", describe_frame(frame));
        }
        OutputFormat::Raw => {
            print_raw(frame.payload.as_ref());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// One-line summary of a received frame.
pub fn describe_frame(frame: &Frame) -> String {
    let service = service_name(frame.service_id).unwrap_or("unknown");
    match classify(frame.clone()) {
        Ok(Message::Event(event)) => format!("event {}", describe_event(&event)),
        Ok(Message::Response(Response::Error { status, .. })) => {
            format!("{service} error: {status}")
        }
        Ok(Message::Response(Response::Success {
            service_id,
            opcode,
            payload,
        })) => format!(
            "{service} {}: success payload=[{}]",
            opcode_name(service_id, opcode),
            hex(payload.as_ref())
        ),
        Err(err) => format!(
            "service={} opcode={:#04x} payload=[{}]: {err}",
            frame.service_id,
            frame.opcode,
            hex(frame.payload.as_ref())
        ),
    }
}

pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
