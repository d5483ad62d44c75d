//! Host driver backed by the [`xstack::Switch`].

use std::{
    io::Result,
    pin::Pin,
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures::{AsyncRead, AsyncWrite};
use rasi::task::spawn_ok;
use xstack::{identity::PeerId, multiaddr::Multiaddr, ProtocolStream, Switch};

use crate::{
    host_syscall::{DriverHost, DriverStream},
    P2pStream, StreamHandler,
};

impl DriverStream for ProtocolStream {
    fn peer_id(&self) -> PeerId {
        (**self).public_key().to_peer_id()
    }

    fn local_addr(&self) -> &Multiaddr {
        (**self).local_addr()
    }

    fn peer_addr(&self) -> &Multiaddr {
        (**self).peer_addr()
    }

    fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<Result<usize>> {
        AsyncRead::poll_read(self, cx, buf)
    }

    fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize>> {
        AsyncWrite::poll_write(self, cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        AsyncWrite::poll_flush(self, cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        AsyncWrite::poll_close(self, cx)
    }
}

#[async_trait]
impl DriverHost for Switch {
    fn local_id(&self) -> PeerId {
        Switch::local_id(self).to_owned()
    }

    async fn local_addrs(&self) -> Vec<Multiaddr> {
        Switch::local_addrs(self).await
    }

    async fn set_stream_handler(
        &self,
        protocol_id: &str,
        handler: StreamHandler,
    ) -> crate::Result<()> {
        let listener = self.bind([protocol_id]).await?;

        let protocol_id = protocol_id.to_owned();

        spawn_ok(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, negotiated)) => {
                        log::trace!(
                            "inbound stream, peer={}, protocol={}",
                            stream.peer_addr(),
                            negotiated
                        );

                        spawn_ok(handler(P2pStream::from(stream), negotiated));
                    }
                    Err(err) => {
                        log::info!("stream handler({}) stop, err={}", protocol_id, err);
                        return;
                    }
                }
            }
        });

        Ok(())
    }

    async fn connect(&self, peer_id: &PeerId, protocol_id: &str) -> crate::Result<P2pStream> {
        let (stream, _) = Switch::connect(self, peer_id, [protocol_id]).await?;

        Ok(stream.into())
    }
}
