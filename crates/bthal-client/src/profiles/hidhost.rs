use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use bthal_proto::payload::address_with;
use bthal_proto::schema::hidhost as op;
use bthal_proto::service::HIDHOST;
use bthal_proto::Bdaddr;

use crate::client::HalClient;
use crate::error::{ClientError, Result};
use crate::events::EventSink;

/// HID protocol mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolMode {
    Report,
    Boot,
    Unsupported,
}

impl ProtocolMode {
    pub fn code(self) -> u8 {
        match self {
            Self::Report => op::REPORT_PROTOCOL,
            Self::Boot => op::BOOT_PROTOCOL,
            Self::Unsupported => op::UNSUPPORTED_PROTOCOL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Boot => "boot",
            Self::Unsupported => "unsupported",
        }
    }
}

impl FromStr for ProtocolMode {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "report" => Ok(Self::Report),
            "boot" => Ok(Self::Boot),
            "unsupported" => Ok(Self::Unsupported),
            other => Err(ClientError::InvalidArgument(format!(
                "unknown protocol mode '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ProtocolMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HID host service operations.
pub struct HidHost<'a, R, W, S> {
    client: &'a mut HalClient<R, W, S>,
}

impl<R: Read, W: Write, S: EventSink> HalClient<R, W, S> {
    pub fn hidhost(&mut self) -> HidHost<'_, R, W, S> {
        HidHost { client: self }
    }
}

impl<R: Read, W: Write, S: EventSink> HidHost<'_, R, W, S> {
    pub fn init(&mut self) -> Result<()> {
        self.client.register_module(HIDHOST)
    }

    pub fn cleanup(&mut self) -> Result<bool> {
        self.client.unregister_module(HIDHOST)
    }

    pub fn connect(&mut self, addr: &Bdaddr) -> Result<()> {
        self.call(op::CONNECT, addr.octets())
    }

    pub fn disconnect(&mut self, addr: &Bdaddr) -> Result<()> {
        self.call(op::DISCONNECT, addr.octets())
    }

    pub fn virtual_unplug(&mut self, addr: &Bdaddr) -> Result<()> {
        self.call(op::VIRTUAL_UNPLUG, addr.octets())
    }

    pub fn get_protocol(&mut self, addr: &Bdaddr, mode: ProtocolMode) -> Result<()> {
        self.call(op::GET_PROTOCOL, &address_with(addr, mode.code()))
    }

    pub fn set_protocol(&mut self, addr: &Bdaddr, mode: ProtocolMode) -> Result<()> {
        self.call(op::SET_PROTOCOL, &address_with(addr, mode.code()))
    }

    fn call(&mut self, opcode: u8, payload: &[u8]) -> Result<()> {
        self.client.request(HIDHOST, opcode, payload).map(|_| ())
    }
}
