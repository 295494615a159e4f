//! Typed operations per HAL service.

pub mod av;
pub mod bluetooth;
pub mod hidhost;

pub use av::{AvCallback, AvProfile};
pub use bluetooth::Bluetooth;
pub use hidhost::{HidHost, ProtocolMode};
