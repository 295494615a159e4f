use std::time::Duration;

use bthal_proto::{HalStatus, ServiceId};

/// Errors that can occur talking to the HAL service.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] bthal_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] bthal_frame::FrameError),

    /// A received frame does not fit the service registry.
    #[error("protocol error: {0}")]
    Proto(#[from] bthal_proto::ProtoError),

    /// The service answered with an error response.
    #[error("{service} opcode {opcode:#04x} failed: {status}", service = service_label(.service_id))]
    Status {
        service_id: ServiceId,
        opcode: u8,
        status: HalStatus,
    },

    /// Command issued before the service completed registration.
    #[error("service {name} ({id}) is not ready")]
    ServiceNotReady { id: ServiceId, name: &'static str },

    /// An argument failed a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Recognized operation the service does not implement.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A response did not match the outstanding request.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Another request already occupies the pending slot.
    #[error("request already in flight for service {service_id} opcode {opcode:#04x}")]
    RequestInFlight { service_id: ServiceId, opcode: u8 },

    /// The service closed the connection.
    #[error("service disconnected: {0}")]
    Disconnected(String),

    /// No response arrived in time.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// Status carried by an error response, if this is one.
    pub fn status(&self) -> Option<HalStatus> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn service_label(id: &ServiceId) -> &'static str {
    bthal_proto::service::display_name(*id)
}

pub type Result<T> = std::result::Result<T, ClientError>;
