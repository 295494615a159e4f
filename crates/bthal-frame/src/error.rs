/// Ways a received byte sequence can fail to be a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    /// Fewer bytes than the fixed header.
    #[error("{len} bytes is shorter than the 4 byte header")]
    ShortHeader { len: usize },

    /// The length field disagrees with the bytes that follow the header.
    #[error("header declares {declared} payload bytes but {actual} follow")]
    LengthMismatch { declared: usize, actual: usize },

    /// The length field exceeds what fits in one MTU.
    #[error("header declares {declared} payload bytes (max {max})")]
    OversizedLength { declared: usize, max: usize },
}

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit in one MTU.
    #[error("frame too large ({size} payload bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// The received bytes do not form a valid frame.
    #[error("malformed frame: {0}")]
    Malformed(#[from] Malformed),

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl From<bthal_transport::TransportError> for FrameError {
    fn from(err: bthal_transport::TransportError) -> Self {
        use bthal_transport::TransportError;
        match err {
            TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
            TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
                FrameError::Io(source)
            }
            other => FrameError::Io(std::io::Error::other(other.to_string())),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
