use std::io::{self, ErrorKind, Write};

use bthal_transport::HalStream;
use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_frame, Frame, FrameConfig, MTU};
use crate::error::{FrameError, Result};

/// Writes complete frames to any `Write` stream.
///
/// Each call writes the whole frame before returning, so one `send` on the
/// HAL socket is one frame on the wire.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MTU),
        }
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.service_id, frame.opcode, frame.payload.as_ref())
    }

    /// Encode and send one frame, then flush.
    ///
    /// Oversized payloads are rejected before anything reaches the stream.
    pub fn send(&mut self, service_id: u8, opcode: u8, payload: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_frame(service_id, opcode, payload, &mut self.buf)?;

        let mut unsent = &self.buf[..];
        while !unsent.is_empty() {
            let inner = &mut self.inner;
            match retry_interrupted(|| inner.write(unsent))? {
                0 => return Err(FrameError::ConnectionClosed),
                n => unsent = &unsent[n..],
            }
        }
        trace!(service_id, opcode, len = payload.len(), "wrote frame");

        self.flush()
    }

    pub fn flush(&mut self) -> Result<()> {
        retry_interrupted(|| self.inner.flush())?;
        Ok(())
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FrameWriter<HalStream> {
    /// Writer over a HAL stream with the configured write timeout applied.
    pub fn with_config_hal(inner: HalStream, config: FrameConfig) -> Result<Self> {
        inner.set_write_timeout(config.write_timeout)?;
        Ok(Self::new(inner))
    }
}

fn retry_interrupted<R>(mut op: impl FnMut() -> io::Result<R>) -> io::Result<R> {
    loop {
        match op() {
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
