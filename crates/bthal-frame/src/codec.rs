use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Malformed, Result};

/// Frame header: service id (1) + opcode (1) + length (2) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Largest frame on the wire, header included.
pub const MTU: usize = 1024;

/// Largest payload one frame can carry.
pub const MAX_PAYLOAD: usize = MTU - HEADER_SIZE;

/// One HAL message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Service namespace the opcode belongs to.
    pub service_id: u8,
    /// Operation or event code within the service.
    pub opcode: u8,
    /// Opcode-specific payload.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(service_id: u8, opcode: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            service_id,
            opcode,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Encode this frame into a fresh buffer.
    pub fn encode(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_frame(self.service_id, self.opcode, &self.payload, &mut dst)?;
        Ok(dst.freeze())
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬──────────┬──────────┬────────────────┐
/// │ Service    │ Opcode   │ Length   │ Payload        │
/// │ (1B)       │ (1B)     │ (2B LE)  │ (Length bytes) │
/// └────────────┴──────────┴──────────┴────────────────┘
/// ```
pub fn encode_frame(
    service_id: u8,
    opcode: u8,
    payload: &[u8],
    dst: &mut BytesMut,
) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::TooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u8(service_id);
    dst.put_u8(opcode);
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    Ok(())
}

/// Decode exactly one frame from `src`.
///
/// The buffer must hold the header and precisely the number of payload bytes
/// the header declares.
pub fn decode(src: &[u8]) -> Result<Frame> {
    let (service_id, opcode, declared) = parse_header(src)?;
    let actual = src.len() - HEADER_SIZE;
    if declared != actual {
        return Err(Malformed::LengthMismatch { declared, actual }.into());
    }
    Ok(Frame {
        service_id,
        opcode,
        payload: Bytes::copy_from_slice(&src[HEADER_SIZE..]),
    })
}

/// Decode a frame from the front of a stream buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None); // Need more data
    }

    let (service_id, opcode, payload_len) = parse_header(src)?;
    if payload_len > MAX_PAYLOAD {
        return Err(Malformed::OversizedLength {
            declared: payload_len,
            max: MAX_PAYLOAD,
        }
        .into());
    }

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None); // Need more data
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();

    Ok(Some(Frame {
        service_id,
        opcode,
        payload,
    }))
}

fn parse_header(src: &[u8]) -> Result<(u8, u8, usize)> {
    match src {
        [service_id, opcode, lo, hi, ..] => Ok((
            *service_id,
            *opcode,
            usize::from(u16::from_le_bytes([*lo, *hi])),
        )),
        _ => Err(Malformed::ShortHeader { len: src.len() }.into()),
    }
}

/// Configuration for framed streams.
#[derive(Debug, Clone, Default)]
pub struct FrameConfig {
    /// Read timeout for blocking operations.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}
