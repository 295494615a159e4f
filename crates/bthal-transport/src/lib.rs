//! Local socket transport for the Bluetooth HAL control channel.
//!
//! The HAL service and its controller talk over a single connected
//! point-to-point byte stream. On Linux the stream is addressed by an
//! abstract socket name (no filesystem entry); filesystem paths are
//! available everywhere Unix domain sockets are.
//!
//! This is the lowest layer of bthal. Everything else builds on top of
//! the [`HalStream`] type provided here.

pub mod endpoint;
pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod socket;

pub use endpoint::{Endpoint, DEFAULT_SOCKET_NAME};
pub use error::{Result, TransportError};
pub use traits::HalStream;

#[cfg(unix)]
pub use socket::HalSocket;
