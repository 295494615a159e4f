use bthal_frame::Frame;
use bytes::Bytes;

use crate::error::{ProtoError, Result};
use crate::opcode::{is_event, OP_ERROR};
use crate::schema::opcode_name;
use crate::service::{self, ServiceId};
use crate::status::HalStatus;

/// A received frame, classified by opcode range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Answer to the outstanding command.
    Response(Response),
    /// Unsolicited notification.
    Event(Event),
}

/// Synchronous answer to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Opcode 0x00: the command failed with `status`.
    Error { service_id: ServiceId, status: HalStatus },
    /// The command succeeded. The payload layout is opcode-specific.
    Success {
        service_id: ServiceId,
        opcode: u8,
        payload: Bytes,
    },
}

impl Response {
    pub fn service_id(&self) -> ServiceId {
        match self {
            Self::Error { service_id, .. } | Self::Success { service_id, .. } => *service_id,
        }
    }

    /// Opcode on the wire; `OP_ERROR` for error responses.
    pub fn opcode(&self) -> u8 {
        match self {
            Self::Error { .. } => OP_ERROR,
            Self::Success { opcode, .. } => *opcode,
        }
    }
}

/// Notification pushed by a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub service_id: ServiceId,
    pub opcode: u8,
    pub payload: Bytes,
}

impl Event {
    /// Event name from the service's opcode table.
    pub fn name(&self) -> &'static str {
        opcode_name(self.service_id, self.opcode)
    }
}

/// Classify a received frame.
///
/// Opcodes at or above `MIN_EVENT` are events; everything else is a
/// response. Error responses must carry exactly one known status byte.
pub fn classify(frame: Frame) -> Result<Message> {
    let Frame {
        service_id,
        opcode,
        payload,
    } = frame;

    if !service::is_valid(service_id) {
        return Err(ProtoError::UnknownService(service_id));
    }

    if is_event(opcode) {
        return Ok(Message::Event(Event {
            service_id,
            opcode,
            payload,
        }));
    }

    if opcode == OP_ERROR {
        let status = HalStatus::from_payload(&payload)?;
        return Ok(Message::Response(Response::Error { service_id, status }));
    }

    Ok(Message::Response(Response::Success {
        service_id,
        opcode,
        payload,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::bluetooth;

    #[test]
    fn event_range_classifies_as_event() {
        for opcode in 0x81..=0xFFu8 {
            let message = classify(Frame::new(1, opcode, vec![0x01])).unwrap();
            assert!(matches!(message, Message::Event(ref ev) if ev.opcode == opcode));
        }
    }

    #[test]
    fn command_range_classifies_as_success() {
        for opcode in 0x01..=0x80u8 {
            let message = classify(Frame::new(1, opcode, Vec::new())).unwrap();
            let Message::Response(response) = message else {
                panic!("opcode {opcode:#04x} should be a response");
            };
            assert_eq!(response.opcode(), opcode);
            assert_eq!(response.service_id(), 1);
        }
    }

    #[test]
    fn error_response_decodes_status() {
        let message = classify(Frame::new(3, OP_ERROR, vec![0x02])).unwrap();
        assert_eq!(
            message,
            Message::Response(Response::Error {
                service_id: 3,
                status: HalStatus::NotReady,
            })
        );
    }

    #[test]
    fn error_response_with_bad_payload_is_rejected() {
        assert!(matches!(
            classify(Frame::new(1, OP_ERROR, Vec::new())),
            Err(ProtoError::BadStatus(_))
        ));
        assert!(matches!(
            classify(Frame::new(1, OP_ERROR, vec![0x42])),
            Err(ProtoError::BadStatus(_))
        ));
    }

    #[test]
    fn unknown_service_is_rejected() {
        assert_eq!(
            classify(Frame::new(10, 0x01, Vec::new())),
            Err(ProtoError::UnknownService(10))
        );
    }

    #[test]
    fn event_names_come_from_schema() {
        let Message::Event(event) = classify(Frame::new(
            1,
            bluetooth::EV_ADAPTER_STATE_CHANGED,
            vec![0x01],
        ))
        .unwrap() else {
            panic!("expected event");
        };
        assert_eq!(event.name(), "adapter_state_changed");
    }
}
