//! Bluetooth HAL control socket.
//!
//! A controller drives a Bluetooth hardware-abstraction service over one
//! local socket carrying 4-byte-header frames. Frames address a service by
//! id and an operation by opcode; opcodes `0x81..=0xFF` are events the
//! service pushes on its own.
//!
//! # Crate Structure
//!
//! - [`transport`]: local socket endpoints (abstract names, filesystem paths)
//! - [`frame`]: header codec and frame reader/writer
//! - [`proto`]: service ids, opcode tables, status codes, typed payloads
//! - [`client`]: controller and service endpoints (behind `console` feature)
//! - [`console`]: interface/method registry and line dispatch (behind `console` feature)

/// Re-export transport types.
pub mod transport {
    pub use bthal_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use bthal_frame::*;
}

/// Re-export protocol registry types.
pub mod proto {
    pub use bthal_proto::*;
}

/// Re-export client types (requires `console` feature).
#[cfg(feature = "console")]
pub mod client {
    pub use bthal_client::*;
}

/// Re-export console types (requires `console` feature).
#[cfg(feature = "console")]
pub mod console {
    pub use bthal_console::*;
}
