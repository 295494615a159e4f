/// Errors raised while interpreting frames against the service registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtoError {
    /// The frame addresses a service id outside `0..=MAX_SERVICE`.
    #[error("unknown service id {0}")]
    UnknownService(u8),

    /// An error response did not carry exactly one known status byte.
    #[error("invalid error response payload {0:02x?}")]
    BadStatus(Vec<u8>),

    /// A payload is shorter or longer than its opcode's layout.
    #[error("{what}: expected {expected} payload bytes, got {actual}")]
    PayloadLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A Bluetooth address failed to parse.
    #[error("invalid bluetooth address '{0}'")]
    InvalidAddress(String),

    /// The service has not completed registration.
    #[error("service {name} ({id}) is not ready")]
    NotReady { id: u8, name: &'static str },
}

pub type Result<T> = std::result::Result<T, ProtoError>;
