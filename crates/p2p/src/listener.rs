use std::net::SocketAddr;

use async_trait::async_trait;
use futures::{
    future::{select, select_all, Either},
    StreamExt,
};
use rand::{seq::SliceRandom, thread_rng};
use xstack_rpc::{Error, Result, RpcListener};

use crate::{
    addr::{first_sockaddr, PLACEHOLDER_LOCAL_ADDR},
    Lifecycle, P2pConn, RpcProtocol,
};

/// A [`RpcListener`] that accepts inbound streams of every protocol registered on one [`RpcProtocol`].
///
/// The listener is open until [`close`](Self::close) is called or the lifecycle of the
/// [`RpcProtocol`] is done, after that `accept` returns [`Error::ListenerClosed`] immediately.
pub struct P2pListener {
    protocol: RpcProtocol,
    lifecycle: Lifecycle,
}

impl P2pListener {
    pub(crate) fn new(protocol: RpcProtocol, lifecycle: Lifecycle) -> Self {
        Self {
            protocol,
            lifecycle,
        }
    }

    /// Wait for the next inbound stream on any registered protocol.
    ///
    /// The set of protocols is taken when the call starts, protocols registered later are observed
    /// by the next call. When several protocols are ready at once, one is picked at random.
    ///
    /// If no protocol is registered when the call starts, it blocks until the listener is closed
    /// and then returns [`Error::ListenerClosed`].
    pub async fn accept(&self) -> Result<P2pConn> {
        if self.lifecycle.is_cancelled() {
            return Err(Error::ListenerClosed);
        }

        let mut receivers = self.protocol.receivers().await;

        if receivers.is_empty() {
            log::warn!("accept without registered protocols, wait for close");

            self.lifecycle.cancelled().await;

            return Err(Error::ListenerClosed);
        }

        receivers.shuffle(&mut thread_rng());

        let incoming = receivers.iter().map(|(protocol_id, receiver)| {
            Box::pin(async move {
                let mut receiver = receiver.lock().await;

                // skip offers whose handler gave up on the stream.
                while let Some(offer) = receiver.next().await {
                    if let Some(stream) = offer.take() {
                        return (protocol_id, Some(stream));
                    }
                }

                (protocol_id, None)
            })
        });

        let result = match select(select_all(incoming), self.lifecycle.cancelled()).await {
            Either::Left((((protocol_id, Some(stream)), _, _), _)) => {
                log::trace!(
                    "accept stream, peer={}, protocol={}",
                    stream.peer_id(),
                    protocol_id
                );

                Ok(P2pConn::new(stream, protocol_id.as_str()))
            }
            Either::Left((((protocol_id, None), _, _), _)) => {
                log::trace!("intake channel of {} is closed", protocol_id);

                self.lifecycle.cancel();

                Err(Error::ListenerClosed)
            }
            Either::Right(_) => Err(Error::ListenerClosed),
        };

        result
    }

    /// Returns the first listen address of the host that can be expressed as [`SocketAddr`],
    /// or `127.0.0.1:0` if there is none.
    pub async fn local_addr(&self) -> SocketAddr {
        let addrs = self.protocol.host().local_addrs().await;

        first_sockaddr(&addrs).unwrap_or(PLACEHOLDER_LOCAL_ADDR)
    }

    /// Close this listener, pending and future `accept` calls return [`Error::ListenerClosed`].
    ///
    /// Connections already returned by `accept` are not affected. calling it twice has no effect.
    pub fn close(&self) {
        if !self.lifecycle.is_cancelled() {
            log::info!("close rpc listener");
        }

        self.lifecycle.cancel();
    }

    /// Returns true if this listener is closed.
    pub fn is_closed(&self) -> bool {
        self.lifecycle.is_cancelled()
    }
}

#[async_trait]
impl RpcListener for P2pListener {
    type Conn = P2pConn;

    async fn accept(&self) -> Result<Self::Conn> {
        P2pListener::accept(self).await
    }

    async fn local_addr(&self) -> SocketAddr {
        P2pListener::local_addr(self).await
    }

    async fn close(&self) -> Result<()> {
        P2pListener::close(self);

        Ok(())
    }
}
