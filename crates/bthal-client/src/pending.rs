//! The single outstanding request.
//!
//! The HAL socket carries at most one command at a time; the next command
//! may only be written once the previous one has been answered or abandoned.

use std::time::Instant;

use bthal_proto::{Response, ServiceId, OP_ERROR};

use crate::error::{ClientError, Result};

/// Correlation data for the request awaiting its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRequest {
    pub service_id: ServiceId,
    pub opcode: u8,
    pub issued_at: Instant,
}

impl PendingRequest {
    /// Whether `response` answers this request.
    ///
    /// Error responses carry opcode 0x00, so they only need the service to
    /// match.
    pub fn matches(&self, response: &Response) -> bool {
        self.answered_by(response.service_id(), response.opcode())
    }

    /// Same check on a raw header, for frames that fail to classify.
    pub fn answered_by(&self, service_id: ServiceId, opcode: u8) -> bool {
        service_id == self.service_id && (opcode == OP_ERROR || opcode == self.opcode)
    }
}

/// Single-slot pending-request register.
#[derive(Debug, Default)]
pub struct PendingSlot {
    current: Option<PendingRequest>,
}

impl PendingSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupy the slot, failing if a request is already outstanding.
    pub fn begin(&mut self, service_id: ServiceId, opcode: u8) -> Result<PendingRequest> {
        if let Some(current) = self.current {
            return Err(ClientError::RequestInFlight {
                service_id: current.service_id,
                opcode: current.opcode,
            });
        }
        let request = PendingRequest {
            service_id,
            opcode,
            issued_at: Instant::now(),
        };
        self.current = Some(request);
        Ok(request)
    }

    /// Release the slot, returning what occupied it.
    pub fn complete(&mut self) -> Option<PendingRequest> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&PendingRequest> {
        self.current.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }
}
