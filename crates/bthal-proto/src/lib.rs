//! Service, opcode and status registry for the Bluetooth HAL protocol.
//!
//! Every service owns an independent opcode namespace split into three
//! ranges:
//! - `0x00` error response carrying one status byte
//! - `0x01..=0x80` commands and their synchronous responses
//! - `0x81..=0xFF` events the service emits without a request
//!
//! [`classify`] turns a received [`Frame`](bthal_frame::Frame) into a
//! [`Message`]; [`ReadyServices`] tracks which services completed
//! registration.

pub mod error;
pub mod message;
pub mod opcode;
pub mod payload;
pub mod ready;
pub mod schema;
pub mod service;
pub mod status;

pub use error::{ProtoError, Result};
pub use message::{classify, Event, Message, Response};
pub use opcode::{is_command, is_event, OpcodeKind, MAX_COMMAND, MIN_EVENT, OP_ERROR};
pub use payload::{describe_event, Bdaddr, BluetoothEvent};
pub use ready::ReadyServices;
pub use schema::{opcode_def, opcode_name, service_def, OpcodeDef, ServiceDef, SERVICES};
pub use service::{service_name, ServiceId, MAX_SERVICE};
pub use status::HalStatus;
