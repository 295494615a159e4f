use std::fmt;
use std::io::{Read, Write};

use bthal_proto::service::{self, A2DP};
use bthal_proto::{Bdaddr, Event};
use tracing::debug;

use crate::client::HalClient;
use crate::error::{ClientError, Result};
use crate::events::EventSink;

/// Receives A2DP events once the profile is initialized.
pub type AvCallback = Box<dyn FnMut(&Event)>;

/// Audio/video (A2DP) profile state.
///
/// Connection management is not implemented by the service yet: with the
/// profile initialized and an address given, `connect` and `disconnect`
/// report `Unsupported`.
#[derive(Default)]
pub struct AvProfile {
    callback: Option<AvCallback>,
}

impl AvProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_initialized(&self) -> bool {
        self.callback.is_some()
    }

    /// Register the A2DP service and install `callback`.
    pub fn init<R: Read, W: Write, S: EventSink>(
        &mut self,
        client: &mut HalClient<R, W, S>,
        callback: AvCallback,
    ) -> Result<()> {
        client.register_module(A2DP)?;
        self.callback = Some(callback);
        debug!("av profile initialized");
        Ok(())
    }

    pub fn connect(&self, addr: Option<&Bdaddr>) -> Result<()> {
        self.check(addr, "av connect")
    }

    pub fn disconnect(&self, addr: Option<&Bdaddr>) -> Result<()> {
        self.check(addr, "av disconnect")
    }

    /// Drop the callback and unregister A2DP. Safe to call repeatedly.
    pub fn cleanup<R: Read, W: Write, S: EventSink>(
        &mut self,
        client: &mut HalClient<R, W, S>,
    ) -> Result<bool> {
        if self.callback.take().is_none() {
            return Ok(false);
        }
        client.unregister_module(A2DP)
    }

    /// Hand an A2DP event to the installed callback. Returns whether it was
    /// consumed.
    pub fn deliver(&mut self, event: &Event) -> bool {
        match (&mut self.callback, event.service_id) {
            (Some(callback), A2DP) => {
                callback(event);
                true
            }
            _ => false,
        }
    }

    fn check(&self, addr: Option<&Bdaddr>, op: &str) -> Result<()> {
        if !self.is_initialized() {
            return Err(ClientError::ServiceNotReady {
                id: A2DP,
                name: service::display_name(A2DP),
            });
        }
        if addr.is_none() {
            return Err(ClientError::InvalidArgument(format!(
                "{op} requires a device address"
            )));
        }
        Err(ClientError::Unsupported(op.to_string()))
    }
}

impl fmt::Debug for AvProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvProfile")
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
