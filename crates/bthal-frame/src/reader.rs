use std::io::{ErrorKind, Read};

use bthal_transport::HalStream;
use bytes::BytesMut;
use tracing::trace;

use crate::codec::{decode_frame, Frame, FrameConfig, HEADER_SIZE, MTU};
use crate::error::{FrameError, Result};

/// Reads complete frames from any `Read` stream.
///
/// The stream is asked for the header first and then for exactly the payload
/// it declares. The buffer never holds more than one MTU and a read never
/// reaches into the following frame. Bytes of an unfinished frame survive
/// errors, so a call that timed out can simply be repeated.
pub struct FrameReader<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Read> FrameReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MTU),
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_frame(&mut self) -> Result<Frame> {
        loop {
            if let Some(frame) = decode_frame(&mut self.buf)? {
                trace!(
                    service_id = frame.service_id,
                    opcode = frame.opcode,
                    len = frame.payload.len(),
                    "read frame"
                );
                return Ok(frame);
            }
            let end = self.frame_end();
            self.fill_to(end)?;
        }
    }

    /// Buffer length at which the pending frame is complete. `decode_frame`
    /// has already rejected lengths beyond the MTU.
    fn frame_end(&self) -> usize {
        match &self.buf[..] {
            [_, _, lo, hi, ..] => HEADER_SIZE + usize::from(u16::from_le_bytes([*lo, *hi])),
            _ => HEADER_SIZE,
        }
    }

    /// Issue one read for the bytes still missing below `end`.
    fn fill_to(&mut self, end: usize) -> Result<()> {
        let start = self.buf.len();
        self.buf.resize(end, 0);
        let result = self.inner.read(&mut self.buf[start..]);
        self.buf.truncate(start + result.as_ref().copied().unwrap_or(0));

        match result {
            Ok(0) => Err(FrameError::ConnectionClosed),
            Ok(_) => Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => Ok(()),
            Err(err) => Err(FrameError::Io(err)),
        }
    }

    /// Number of bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FrameReader<HalStream> {
    /// Reader over a HAL stream with the configured read timeout applied.
    pub fn with_config_hal(inner: HalStream, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::Cursor;

    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::codec::{encode_frame, MAX_PAYLOAD};
    use crate::error::Malformed;

    #[test]
    fn read_single_frame() {
        let mut wire = BytesMut::new();
        encode_frame(0, 0x01, &[0x01], &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let frame = reader.read_frame().unwrap();

        assert_eq!((frame.service_id, frame.opcode), (0, 0x01));
        assert_eq!(frame.payload.as_ref(), &[0x01]);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn read_response_then_event() {
        let mut wire = BytesMut::new();
        encode_frame(1, 0x01, &[], &mut wire).unwrap();
        encode_frame(1, 0x81, &[0x01], &mut wire).unwrap();
        encode_frame(3, 0x00, &[0x06], &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!((f1.service_id, f1.opcode, f1.payload.len()), (1, 0x01, 0));
        assert_eq!((f2.service_id, f2.opcode, f2.payload.as_ref()), (1, 0x81, &[0x01][..]));
        assert_eq!((f3.service_id, f3.opcode, f3.payload.as_ref()), (3, 0x00, &[0x06][..]));
    }

    #[test]
    fn read_full_mtu_frame() {
        let payload = vec![0xAB; MAX_PAYLOAD];
        let mut wire = BytesMut::new();
        encode_frame(9, 0x02, &payload, &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.service_id, 9);
        assert_eq!(frame.payload.as_ref(), payload.as_slice());
    }

    #[test]
    fn partial_read_handling() {
        let mut wire = BytesMut::new();
        encode_frame(4, 0x03, b"slow", &mut wire).unwrap();

        let byte_reader = ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut reader = FrameReader::new(byte_reader);

        let frame = reader.read_frame().unwrap();
        assert_eq!((frame.service_id, frame.opcode), (4, 0x03));
        assert_eq!(frame.payload.as_ref(), b"slow");
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let mut partial = BytesMut::new();
        partial.put_u8(1);
        partial.put_u8(0x05);
        partial.put_u16_le(16);
        partial.put_slice(b"only-part");

        let mut reader = FrameReader::new(Cursor::new(partial.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn oversized_length_in_stream() {
        let mut wire = BytesMut::new();
        wire.put_u8(1);
        wire.put_u8(0x05);
        wire.put_u16_le(u16::MAX);

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Malformed(Malformed::OversizedLength { .. })
        ));
    }

    #[test]
    fn stops_at_frame_boundary() {
        let mut wire = BytesMut::new();
        encode_frame(1, 0x01, &[0x00], &mut wire).unwrap();
        encode_frame(1, 0x81, &[0x05, 0x06], &mut wire).unwrap();

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        reader.read_frame().unwrap();

        assert_eq!(reader.get_ref().position(), 5);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn oversized_length_rejected_before_payload_is_read() {
        let mut wire = BytesMut::new();
        wire.put_u8(1);
        wire.put_u8(0x05);
        wire.put_u16_le((MAX_PAYLOAD + 1) as u16);
        wire.put_slice(&[0u8; MAX_PAYLOAD + 1]);

        let mut reader = FrameReader::new(Cursor::new(wire.to_vec()));
        let err = reader.read_frame().unwrap_err();

        assert!(matches!(
            err,
            FrameError::Malformed(Malformed::OversizedLength { declared, max })
                if declared == MAX_PAYLOAD + 1 && max == MAX_PAYLOAD
        ));
        assert_eq!(reader.get_ref().position(), HEADER_SIZE as u64);
    }

    #[test]
    fn reads_are_sized_by_the_header() {
        let payload = vec![0x5A; MAX_PAYLOAD];
        let mut wire = BytesMut::new();
        encode_frame(1, 0x01, &payload, &mut wire).unwrap();
        encode_frame(1, 0x02, &payload, &mut wire).unwrap();

        let mut reader = FrameReader::new(RecordingReader {
            inner: Cursor::new(wire.to_vec()),
            requests: Vec::new(),
        });
        reader.read_frame().unwrap();
        reader.read_frame().unwrap();

        assert_eq!(
            reader.into_inner().requests,
            vec![HEADER_SIZE, MAX_PAYLOAD, HEADER_SIZE, MAX_PAYLOAD]
        );
    }

    #[test]
    fn partial_frame_survives_would_block() {
        let mut wire = BytesMut::new();
        encode_frame(2, 0x04, b"abcdef", &mut wire).unwrap();
        let wire = wire.to_vec();

        let mut reader = FrameReader::new(ChunkedReader {
            chunks: VecDeque::from([
                Some(wire[..2].to_vec()),
                None,
                Some(wire[2..7].to_vec()),
                None,
                Some(wire[7..].to_vec()),
            ]),
        });

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
        assert_eq!(reader.buffered(), 2);

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));
        assert_eq!(reader.buffered(), 7);

        let frame = reader.read_frame().unwrap();
        assert_eq!((frame.service_id, frame.opcode), (2, 0x04));
        assert_eq!(frame.payload.as_ref(), b"abcdef");
        assert_eq!(reader.buffered(), 0);
    }

    struct RecordingReader {
        inner: Cursor<Vec<u8>>,
        requests: Vec<usize>,
    }

    impl Read for RecordingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.requests.push(buf.len());
            self.inner.read(buf)
        }
    }

    /// `None` entries fail one read with `WouldBlock`.
    struct ChunkedReader {
        chunks: VecDeque<Option<Vec<u8>>>,
    }

    impl Read for ChunkedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(None) => Err(std::io::Error::from(ErrorKind::WouldBlock)),
                Some(Some(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.chunks.push_front(Some(chunk.split_off(n)));
                    }
                    Ok(n)
                }
            }
        }
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }

            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn roundtrip_over_socket_pair() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(0, 0x01, &[0x01]).unwrap();
        let frame = reader.read_frame().unwrap();

        assert_eq!((frame.service_id, frame.opcode), (0, 0x01));
        assert_eq!(frame.payload.as_ref(), &[0x01]);
    }

    #[test]
    fn read_would_block_propagates_io_error() {
        let mut wire = BytesMut::new();
        encode_frame(7, 0x01, b"ok", &mut wire).unwrap();

        let reader = FlakyReader {
            first_error: Some(ErrorKind::WouldBlock),
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let err = framed.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::WouldBlock));

        // Nothing was consumed; the next call delivers the frame.
        let frame = framed.read_frame().unwrap();
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    #[test]
    fn interrupted_read_retries() {
        let mut wire = BytesMut::new();
        encode_frame(8, 0x02, b"ok", &mut wire).unwrap();

        let reader = FlakyReader {
            first_error: Some(ErrorKind::Interrupted),
            bytes: wire.to_vec(),
            pos: 0,
        };
        let mut framed = FrameReader::new(reader);
        let frame = framed.read_frame().unwrap();

        assert_eq!((frame.service_id, frame.opcode), (8, 0x02));
        assert_eq!(frame.payload.as_ref(), b"ok");
    }

    struct FlakyReader {
        first_error: Option<ErrorKind>,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(kind) = self.first_error.take() {
                return Err(std::io::Error::from(kind));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn applies_read_timeout_for_hal_stream() {
        let (left, _right) = std::os::unix::net::UnixStream::pair().unwrap();
        let cfg = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let mut reader = FrameReader::with_config_hal(HalStream::from_unix(left), cfg).unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        ));
    }
}
