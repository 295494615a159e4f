//! `tokio_util::codec` adapter for HAL frames.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame};
use crate::error::FrameError;

/// Frame codec for `tokio_util::codec::Framed` and friends.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalCodec;

impl Decoder for HalCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_frame(src)
    }
}

impl Encoder<Frame> for HalCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(frame.service_id, frame.opcode, &frame.payload, dst)
    }
}
