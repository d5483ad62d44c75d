//! The echo rpc service: a peer answers every request with the request message and its own peer id.
//!
//! The `echo` binary of this crate runs the service on a tcp [`Switch`](xstack::Switch), and optionally
//! dials another instance.

#[allow(renamed_and_removed_lints)]
mod proto;

pub use proto::echo::{EchoReply, EchoRequest};

use futures::{AsyncRead, AsyncWrite};
use xstack::{
    identity::PeerId,
    multiaddr::{Multiaddr, Protocol},
};
use xstack_rpc::{DialOption, RpcClient, RpcServer};
use xstack_rpc_p2p::{Result, RpcProtocol};

/// Method name of the echo call.
pub const ECHO_METHOD: &str = "/xstack.echo.EchoService/Echo";

/// Create a rpc server that answers echo requests on behalf of `peer_id`.
pub fn echo_server(peer_id: &PeerId) -> RpcServer {
    let peer_id = peer_id.to_base58();

    RpcServer::new().message_method(ECHO_METHOD, move |request: EchoRequest| {
        log::trace!("echo request, message={}", request.message);

        let mut reply = EchoReply::new();

        reply.message = request.message;
        reply.peer_id = peer_id.clone();

        async move { Ok::<_, xstack_rpc::Error>(reply) }
    })
}

/// Typed client of the echo service.
pub struct EchoClient<C> {
    client: RpcClient<C>,
}

impl<C> EchoClient<C>
where
    C: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a rpc client session.
    pub fn new(client: RpcClient<C>) -> Self {
        Self { client }
    }

    /// Ask the remote peer to echo `message`.
    pub async fn echo<M>(&self, message: M) -> xstack_rpc::Result<EchoReply>
    where
        M: AsRef<str>,
    {
        let mut request = EchoRequest::new();

        request.message = message.as_ref().to_owned();

        self.client.call_message(ECHO_METHOD, &request).await
    }

    /// Close the underlying rpc session.
    pub async fn close(&self) -> xstack_rpc::Result<()> {
        self.client.close().await
    }
}

/// Dial `peer_id` with the rpc protocol derived from `suffix`, and create an echo client.
pub async fn dial_echo(
    protocol: &RpcProtocol,
    peer_id: &PeerId,
    suffix: &str,
) -> Result<EchoClient<xstack_rpc_p2p::P2pConn>> {
    let client = protocol
        .dial(peer_id, suffix, [DialOption::Insecure, DialOption::Block])
        .await?;

    Ok(EchoClient::new(client))
}

/// Split a `.../p2p/<peer id>` address into the peer id and the transport address.
///
/// Returns `None` if `addr` has no `/p2p` component.
pub fn split_p2p_addr(addr: &Multiaddr) -> Option<(PeerId, Multiaddr)> {
    let peer_id = addr.iter().find_map(|protocol| match protocol {
        Protocol::P2p(peer_id) => Some(peer_id),
        _ => None,
    })?;

    let raddr = addr
        .iter()
        .filter(|protocol| !matches!(protocol, Protocol::P2p(_)))
        .collect();

    Some((peer_id, raddr))
}
