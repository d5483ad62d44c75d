//! The peer-to-peer host seam.

use std::{
    ops::{Deref, DerefMut},
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures::{future::BoxFuture, AsyncRead, AsyncWrite};

/// A peer-to-peer host driver must implement the `Driver-*` traits in this module.
pub mod host_syscall {
    use std::{
        io::Result,
        pin::Pin,
        task::{Context, Poll},
    };

    use async_trait::async_trait;
    use xstack::{identity::PeerId, multiaddr::Multiaddr};

    use super::{P2pStream, StreamHandler};

    /// A stream whose application protocol is already negotiated by the host.
    pub trait DriverStream: Sync + Send + Unpin {
        /// Returns the remote peer's id.
        fn peer_id(&self) -> PeerId;

        /// Returns the local address that this stream is bound to.
        fn local_addr(&self) -> &Multiaddr;

        /// Returns the remote address that this stream is connected to.
        fn peer_addr(&self) -> &Multiaddr;

        /// Attempt to read data via this stream.
        fn poll_read(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &mut [u8])
            -> Poll<Result<usize>>;

        /// Attempt to write data via this stream.
        fn poll_write(self: Pin<&mut Self>, cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize>>;

        /// Attempt to flush the write data.
        fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>>;

        /// Close this stream.
        fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>>;
    }

    /// The host functions consumed by the rpc bridge.
    #[async_trait]
    pub trait DriverHost: Sync + Send {
        /// Returns the peer id of this host.
        fn local_id(&self) -> PeerId;

        /// Returns the addresses list this host is listening on.
        async fn local_addrs(&self) -> Vec<Multiaddr>;

        /// Install `handler` for inbound streams negotiated with `protocol_id`.
        ///
        /// The host calls the `handler` once per inbound stream, each call on its own task.
        async fn set_stream_handler(
            &self,
            protocol_id: &str,
            handler: StreamHandler,
        ) -> crate::Result<()>;

        /// Open a new outbound stream to `peer_id`, and negotiate `protocol_id` with the peer.
        async fn connect(&self, peer_id: &PeerId, protocol_id: &str) -> crate::Result<P2pStream>;
    }
}

/// Callback invoked by the host with an inbound stream and its negotiated protocol id.
pub type StreamHandler = Arc<dyn Fn(P2pStream, String) -> BoxFuture<'static, ()> + Send + Sync>;

/// A type wrapper of [`DriverStream`](host_syscall::DriverStream)
pub struct P2pStream(Box<dyn host_syscall::DriverStream>);

impl<D: host_syscall::DriverStream + 'static> From<D> for P2pStream {
    fn from(value: D) -> Self {
        Self(Box::new(value))
    }
}

impl Deref for P2pStream {
    type Target = dyn host_syscall::DriverStream;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl DerefMut for P2pStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.0
    }
}

impl P2pStream {
    pub fn as_driver(&mut self) -> &mut dyn host_syscall::DriverStream {
        &mut *self.0
    }
}

impl AsyncRead for P2pStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(self.as_driver()).poll_read(cx, buf)
    }
}

impl AsyncWrite for P2pStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(self.as_driver()).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(self.as_driver()).poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(self.as_driver()).poll_close(cx)
    }
}

/// A shared handle of [`DriverHost`](host_syscall::DriverHost)
#[derive(Clone)]
pub struct Host(Arc<dyn host_syscall::DriverHost>);

impl<D: host_syscall::DriverHost + 'static> From<D> for Host {
    fn from(value: D) -> Self {
        Self(Arc::new(value))
    }
}

impl Deref for Host {
    type Target = dyn host_syscall::DriverHost;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}
