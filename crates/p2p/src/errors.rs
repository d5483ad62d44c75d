use xstack::identity::PeerId;

/// The error type of this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    XStackError(#[from] xstack::Error),

    #[error(transparent)]
    Rpc(#[from] xstack_rpc::Error),

    #[error("Protocol suffix '{0}' must not contain '/' or line breaks")]
    InvalidSuffix(String),

    #[error("Invalid base protocol id '{0}'")]
    InvalidProtocol(String),

    #[error("Protocol '{0}' is registered already")]
    ProtocolRegistered(String),

    #[error("Connect to peer, id={0}, error='peer is unknown'")]
    UnknownPeer(PeerId),

    #[error("Protocol negotiation failed, '{0}'")]
    NegotiationFailed(String),
}

/// The result type of this crate.
pub type Result<T> = std::result::Result<T, Error>;

impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::IoError(err) => err,
            Error::XStackError(err) => err.into(),
            Error::Rpc(err) => err.into(),
            err => std::io::Error::new(std::io::ErrorKind::Other, err),
        }
    }
}
