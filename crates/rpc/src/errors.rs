use crate::proto::rpc::Code;

/// The error type of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    ProtoBuf(#[from] protobuf::Error),

    #[error(transparent)]
    ReadError(#[from] unsigned_varint::io::ReadError),

    #[error("receiving packet length is out of range: {0}")]
    Overflow(usize),

    #[error("Listener is closed.")]
    ListenerClosed,

    #[error("No transport security set, dial with `DialOption::Insecure` explicitly.")]
    TransportSecurity,

    #[error("Rpc call timeout.")]
    Timeout,

    #[error("Rpc call failed, code={code:?}, message='{message}'")]
    Remote { code: Code, message: String },

    #[error("Rpc client is shutdown.")]
    Shutdown,

    #[error("{0}")]
    Handler(String),
}

/// The result type of this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::IoError(err) => err,
            Error::ListenerClosed => {
                std::io::Error::new(std::io::ErrorKind::NotConnected, Error::ListenerClosed)
            }
            Error::Timeout => std::io::Error::new(std::io::ErrorKind::TimedOut, Error::Timeout),
            err => std::io::Error::new(std::io::ErrorKind::Other, err),
        }
    }
}

impl Error {
    /// Returns true if this error is a clean end of stream while waiting for the next frame.
    pub(crate) fn is_eof(&self) -> bool {
        match self {
            Error::IoError(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            Error::ReadError(unsigned_varint::io::ReadError::Io(err)) => {
                err.kind() == std::io::ErrorKind::UnexpectedEof
            }
            _ => false,
        }
    }
}
