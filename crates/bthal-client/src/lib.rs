//! Controller and service endpoints for the Bluetooth HAL socket.
//!
//! [`HalClient`] is the controller: it registers services, issues one
//! command at a time and routes unsolicited events to an [`EventSink`].
//! [`ServiceListener`] is the other end, used by stand-in services.

pub mod client;
pub mod connector;
pub mod error;
pub mod events;
pub mod pending;
pub mod profiles;

#[cfg(unix)]
pub mod listener;

pub use client::{HalClient, DEFAULT_REQUEST_TIMEOUT};
pub use connector::{connect, connect_with_config, ClientConfig, HalConnection};
pub use error::{ClientError, Result};
pub use events::{EventQueue, EventSink};
pub use pending::{PendingRequest, PendingSlot};
pub use profiles::{AvCallback, AvProfile, Bluetooth, HidHost, ProtocolMode};

#[cfg(unix)]
pub use listener::{ServiceEndpoint, ServiceListener};
