//! Typed payload layouts for the opcodes the console drives.
//!
//! Payloads are packed; multi-byte integers are little-endian.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::{ProtoError, Result};
use crate::message::Event;
use crate::schema::bluetooth;
use crate::service::{self, ServiceId};

/// Six-octet Bluetooth device address.
///
/// Octets are kept in display order, which is also the order on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Bdaddr(pub [u8; 6]);

impl Bdaddr {
    pub const LEN: usize = 6;

    pub fn octets(&self) -> &[u8; 6] {
        &self.0
    }

    /// Read an address from the first six bytes of `src`.
    pub fn from_slice(src: &[u8]) -> Result<Self> {
        let octets: [u8; 6] = src
            .get(..Self::LEN)
            .and_then(|head| head.try_into().ok())
            .ok_or(ProtoError::PayloadLength {
                what: "bdaddr",
                expected: Self::LEN,
                actual: src.len(),
            })?;
        Ok(Self(octets))
    }
}

impl FromStr for Bdaddr {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ProtoError::InvalidAddress(s.to_string());
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in &mut octets {
            let part = parts.next().ok_or_else(invalid)?;
            if part.len() != 2 {
                return Err(invalid());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
        }
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for Bdaddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl Serialize for Bdaddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Payload of REGISTER_MODULE and UNREGISTER_MODULE commands.
pub fn module_command(service_id: ServiceId) -> [u8; 1] {
    [service_id]
}

/// Parse a REGISTER_MODULE (or UNREGISTER_MODULE) command payload.
pub fn decode_module_command(payload: &[u8]) -> Result<ServiceId> {
    match payload {
        [id] if service::is_valid(*id) => Ok(*id),
        [id] => Err(ProtoError::UnknownService(*id)),
        _ => Err(ProtoError::PayloadLength {
            what: "module command",
            expected: 1,
            actual: payload.len(),
        }),
    }
}

/// Parse a REGISTER_MODULE confirmation, which echoes the service id.
pub fn decode_register_response(payload: &[u8]) -> Result<ServiceId> {
    match payload {
        [id] => Ok(*id),
        _ => Err(ProtoError::PayloadLength {
            what: "register module response",
            expected: 1,
            actual: payload.len(),
        }),
    }
}

/// Address followed by one parameter byte, the layout shared by several
/// bluetooth and hidhost commands.
pub fn address_with(addr: &Bdaddr, param: u8) -> [u8; 7] {
    let mut out = [0u8; 7];
    out[..6].copy_from_slice(addr.octets());
    out[6] = param;
    out
}

/// Decoded bluetooth service events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BluetoothEvent {
    AdapterStateChanged {
        state: u8,
    },
    DiscoveryStateChanged {
        state: u8,
    },
    BondStateChanged {
        status: u8,
        bdaddr: Bdaddr,
        state: u8,
    },
    AclStateChanged {
        status: u8,
        bdaddr: Bdaddr,
        state: u8,
    },
}

impl BluetoothEvent {
    /// Decode a bluetooth event payload. Returns `Ok(None)` for events
    /// without a typed layout.
    pub fn decode(opcode: u8, payload: &[u8]) -> Result<Option<Self>> {
        let event = match opcode {
            bluetooth::EV_ADAPTER_STATE_CHANGED => Self::AdapterStateChanged {
                state: single(payload, "adapter state event")?,
            },
            bluetooth::EV_DISCOVERY_STATE_CHANGED => Self::DiscoveryStateChanged {
                state: single(payload, "discovery state event")?,
            },
            bluetooth::EV_BOND_STATE_CHANGED => {
                let (status, bdaddr, state) = status_addr_state(payload, "bond state event")?;
                Self::BondStateChanged {
                    status,
                    bdaddr,
                    state,
                }
            }
            bluetooth::EV_ACL_STATE_CHANGED => {
                let (status, bdaddr, state) = status_addr_state(payload, "acl state event")?;
                Self::AclStateChanged {
                    status,
                    bdaddr,
                    state,
                }
            }
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

impl fmt::Display for BluetoothEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdapterStateChanged { state } => {
                write!(f, "adapter state changed: {}", adapter_state_name(*state))
            }
            Self::DiscoveryStateChanged { state } => {
                write!(f, "discovery state changed: {}", discovery_state_name(*state))
            }
            Self::BondStateChanged {
                status,
                bdaddr,
                state,
            } => write!(
                f,
                "bond state changed: {bdaddr} {} (status {status})",
                bond_state_name(*state)
            ),
            Self::AclStateChanged {
                status,
                bdaddr,
                state,
            } => write!(
                f,
                "acl state changed: {bdaddr} {} (status {status})",
                acl_state_name(*state)
            ),
        }
    }
}

pub fn adapter_state_name(state: u8) -> &'static str {
    match state {
        0 => "off",
        1 => "on",
        _ => "unknown",
    }
}

pub fn discovery_state_name(state: u8) -> &'static str {
    match state {
        0 => "stopped",
        1 => "started",
        _ => "unknown",
    }
}

pub fn bond_state_name(state: u8) -> &'static str {
    match state {
        0 => "none",
        1 => "bonding",
        2 => "bonded",
        _ => "unknown",
    }
}

pub fn acl_state_name(state: u8) -> &'static str {
    match state {
        0 => "connected",
        1 => "disconnected",
        _ => "unknown",
    }
}

/// One-line human readable rendering of an event.
///
/// Events with a typed layout are decoded; anything else shows its name and
/// payload bytes.
pub fn describe_event(event: &Event) -> String {
    let service = service::display_name(event.service_id);
    if event.service_id == service::BLUETOOTH {
        if let Ok(Some(decoded)) = BluetoothEvent::decode(event.opcode, &event.payload) {
            return format!("{service}: {decoded}");
        }
    }
    if event.payload.is_empty() {
        format!("{service}: {}", event.name())
    } else {
        format!("{service}: {} {:02x?}", event.name(), event.payload.as_ref())
    }
}

fn single(payload: &[u8], what: &'static str) -> Result<u8> {
    match payload {
        [value] => Ok(*value),
        _ => Err(ProtoError::PayloadLength {
            what,
            expected: 1,
            actual: payload.len(),
        }),
    }
}

fn status_addr_state(payload: &[u8], what: &'static str) -> Result<(u8, Bdaddr, u8)> {
    if payload.len() != 8 {
        return Err(ProtoError::PayloadLength {
            what,
            expected: 8,
            actual: payload.len(),
        });
    }
    Ok((payload[0], Bdaddr::from_slice(&payload[1..7])?, payload[7]))
}
