use std::net::SocketAddr;

use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite};

use crate::Result;

/// The connection-oriented listener contract consumed by [`RpcServer::serve`](crate::RpcServer::serve).
///
/// Any byte-stream source can drive the rpc server as long as it can hand out
/// inbound connections one by one.
#[async_trait]
pub trait RpcListener: Send + Sync {
    /// Type of inbound connection.
    type Conn: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// Wait for and return the next inbound connection.
    ///
    /// Once the listener is closed, this function returns [`Error::ListenerClosed`](crate::Error::ListenerClosed).
    async fn accept(&self) -> Result<Self::Conn>;

    /// Returns the local address that this listener is bound to.
    async fn local_addr(&self) -> SocketAddr;

    /// Close the listener, any blocked `accept` operations will be unblocked and return errors.
    async fn close(&self) -> Result<()>;
}
