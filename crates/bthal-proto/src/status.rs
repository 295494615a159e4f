use std::fmt;

use serde::Serialize;

use crate::error::ProtoError;

/// Status byte carried by an error response (opcode 0x00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum HalStatus {
    Failed = 0x01,
    NotReady = 0x02,
    NoMemory = 0x03,
    Busy = 0x04,
    Done = 0x05,
    Unsupported = 0x06,
    InvalidArgument = 0x07,
    Unhandled = 0x08,
    AuthFailure = 0x09,
    RemoteDeviceDown = 0x0a,
}

impl HalStatus {
    pub const ALL: [HalStatus; 10] = [
        Self::Failed,
        Self::NotReady,
        Self::NoMemory,
        Self::Busy,
        Self::Done,
        Self::Unsupported,
        Self::InvalidArgument,
        Self::Unhandled,
        Self::AuthFailure,
        Self::RemoteDeviceDown,
    ];

    /// Wire value.
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse the payload of an error response.
    pub fn from_payload(payload: &[u8]) -> Result<Self, ProtoError> {
        match payload {
            [code] => Self::try_from(*code),
            _ => Err(ProtoError::BadStatus(payload.to_vec())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Failed => "failed",
            Self::NotReady => "not ready",
            Self::NoMemory => "no memory",
            Self::Busy => "busy",
            Self::Done => "already done",
            Self::Unsupported => "unsupported",
            Self::InvalidArgument => "invalid argument",
            Self::Unhandled => "unhandled",
            Self::AuthFailure => "authentication failure",
            Self::RemoteDeviceDown => "remote device down",
        }
    }
}

impl TryFrom<u8> for HalStatus {
    type Error = ProtoError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| ProtoError::BadStatus(vec![code]))
    }
}

impl fmt::Display for HalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
