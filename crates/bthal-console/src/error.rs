use bthal_client::ClientError;

/// Failure inside a method or command handler.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The HAL service rejected or failed the operation.
    #[error("{0}")]
    Client(#[from] ClientError),

    /// Writing console output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or extra arguments; carries the expected form.
    #[error("usage: {0}")]
    Usage(&'static str),

    /// An argument failed to parse.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `help <name>` named no interface.
    #[error("No such interface {0}")]
    NoSuchInterface(String),
}

impl HandlerError {
    /// Whether the connection to the service is unusable afterwards.
    pub fn is_connection_lost(&self) -> bool {
        matches!(
            self,
            Self::Client(
                ClientError::Disconnected(_) | ClientError::Transport(_) | ClientError::Frame(_)
            )
        )
    }
}

impl From<bthal_proto::ProtoError> for HandlerError {
    fn from(err: bthal_proto::ProtoError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

pub type HandlerResult = std::result::Result<(), HandlerError>;

/// Name resolution or handler failure for one console line.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("No such interface {0}")]
    NoSuchInterface(String),

    #[error("No function {method} found")]
    NoSuchMethod { interface: String, method: String },

    #[error("No such command {0}")]
    NoSuchCommand(String),

    #[error("{0}")]
    Handler(HandlerError),
}

impl From<HandlerError> for DispatchError {
    fn from(err: HandlerError) -> Self {
        match err {
            HandlerError::NoSuchInterface(name) => Self::NoSuchInterface(name),
            other => Self::Handler(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
