use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bthal_client::{ClientError, ServiceEndpoint, ServiceListener};
use bthal_frame::{Frame, FrameConfig, FrameError};
use bthal_proto::payload::decode_module_command;
use bthal_proto::schema::{bluetooth, control};
use bthal_proto::{service, HalStatus, ReadyServices, ServiceId};
use bthal_transport::{Endpoint, HalSocket};
use tracing::{debug, info, warn};

use crate::cmd::ServeArgs;
use crate::exit::{client_error, CliError, CliResult, INTERNAL, SUCCESS};

/// How often a quiet connection checks for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let endpoint = args.socket.socket;
    let listener = ServiceListener::bind(&endpoint)
        .map_err(|err| client_error("bind failed", err))?
        .with_frame_config(FrameConfig {
            read_timeout: Some(POLL_INTERVAL),
            write_timeout: None,
        });
    info!(endpoint = %endpoint, "stand-in HAL listening");

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), endpoint)?;

    let mut budget = args.count;
    while running.load(Ordering::SeqCst) && budget != Some(0) {
        let mut conn = listener
            .accept()
            .map_err(|err| client_error("accept failed", err))?;
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let mut hal = StandInHal::new();
        match serve_connection(&mut conn, &mut hal, &running, &mut budget) {
            Ok(()) => {}
            Err(ClientError::Disconnected(reason)) => debug!(%reason, "controller disconnected"),
            Err(err) => warn!(error = %err, "dropping controller connection"),
        }
    }

    info!("stand-in HAL stopped");
    Ok(SUCCESS)
}

/// Answer commands on one connection until it closes, shutdown is
/// requested, or `budget` commands have been handled.
fn serve_connection<R: Read, W: Write>(
    conn: &mut ServiceEndpoint<R, W>,
    hal: &mut StandInHal,
    running: &AtomicBool,
    budget: &mut Option<usize>,
) -> Result<(), ClientError> {
    while running.load(Ordering::SeqCst) && *budget != Some(0) {
        let frame = match conn.recv_command() {
            Ok(frame) => frame,
            Err(ClientError::Frame(FrameError::Io(err)))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                continue;
            }
            Err(err) => return Err(err),
        };

        for reply in hal.handle(&frame) {
            match reply {
                Reply::Success {
                    service_id,
                    opcode,
                    payload,
                } => conn.respond(service_id, opcode, &payload)?,
                Reply::Error { service_id, status } => conn.respond_error(service_id, status)?,
                Reply::Event {
                    service_id,
                    opcode,
                    payload,
                } => conn.send_event(service_id, opcode, &payload)?,
            }
        }

        if let Some(left) = budget.as_mut() {
            *left -= 1;
        }
    }
    Ok(())
}

/// A frame the stand-in sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reply {
    Success {
        service_id: ServiceId,
        opcode: u8,
        payload: Vec<u8>,
    },
    Error {
        service_id: ServiceId,
        status: HalStatus,
    },
    Event {
        service_id: ServiceId,
        opcode: u8,
        payload: Vec<u8>,
    },
}

impl Reply {
    fn success(service_id: ServiceId, opcode: u8) -> Self {
        Self::Success {
            service_id,
            opcode,
            payload: Vec::new(),
        }
    }

    fn error(service_id: ServiceId, status: HalStatus) -> Self {
        Self::Error { service_id, status }
    }
}

/// Minimal HAL: registration plus adapter enable/disable.
#[derive(Debug, Default)]
struct StandInHal {
    ready: ReadyServices,
}

impl StandInHal {
    fn new() -> Self {
        Self::default()
    }

    fn handle(&mut self, frame: &Frame) -> Vec<Reply> {
        let service_id = frame.service_id;
        debug!(service_id, opcode = frame.opcode, "command");

        if service_id == service::CORE {
            return vec![self.handle_core(frame)];
        }
        if !self.ready.is_ready(service_id) {
            return vec![Reply::error(service_id, HalStatus::NotReady)];
        }

        match (service_id, frame.opcode) {
            (service::BLUETOOTH, bluetooth::ENABLE) => adapter_state(bluetooth::ENABLE, 0x01),
            (service::BLUETOOTH, bluetooth::DISABLE) => adapter_state(bluetooth::DISABLE, 0x00),
            _ => vec![Reply::error(service_id, HalStatus::Unsupported)],
        }
    }

    fn handle_core(&mut self, frame: &Frame) -> Reply {
        let target = match decode_module_command(&frame.payload) {
            Ok(id) if id != service::CORE => id,
            _ => return Reply::error(service::CORE, HalStatus::InvalidArgument),
        };

        match frame.opcode {
            control::REGISTER_MODULE => match self.ready.mark_ready(target) {
                Ok(()) => {
                    info!(service_id = target, "service registered");
                    Reply::Success {
                        service_id: service::CORE,
                        opcode: control::REGISTER_MODULE,
                        payload: vec![target],
                    }
                }
                Err(_) => Reply::error(service::CORE, HalStatus::InvalidArgument),
            },
            control::UNREGISTER_MODULE => {
                if self.ready.mark_unregistered(target) {
                    info!(service_id = target, "service unregistered");
                }
                Reply::success(service::CORE, control::UNREGISTER_MODULE)
            }
            _ => Reply::error(service::CORE, HalStatus::Unsupported),
        }
    }
}

fn adapter_state(opcode: u8, state: u8) -> Vec<Reply> {
    vec![
        Reply::success(service::BLUETOOTH, opcode),
        Reply::Event {
            service_id: service::BLUETOOTH,
            opcode: bluetooth::EV_ADAPTER_STATE_CHANGED,
            payload: vec![state],
        },
    ]
}

/// Clear `running` on Ctrl-C and wake a blocked `accept` with a throwaway
/// connection.
fn install_ctrlc_handler(running: Arc<AtomicBool>, endpoint: Endpoint) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        let _ = HalSocket::connect(&endpoint);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
