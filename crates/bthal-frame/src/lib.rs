//! Fixed-header frame codec for the Bluetooth HAL control channel.
//!
//! Every message is one frame:
//! - 1 byte service identifier
//! - 1 byte opcode
//! - 2 byte little-endian payload length
//! - `length` payload bytes
//!
//! A frame never exceeds the 1024 byte MTU and is never fragmented. The codec
//! is agnostic to what service ids and opcodes mean; see `bthal-proto`.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::HalCodec;
pub use codec::{
    decode, decode_frame, encode_frame, Frame, FrameConfig, HEADER_SIZE, MAX_PAYLOAD, MTU,
};
pub use error::{FrameError, Malformed, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;
