use std::{
    io,
    net::SocketAddr,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use futures::{future::BoxFuture, AsyncRead, AsyncWrite, FutureExt};
use rasi::timer::sleep;
use xstack::{identity::PeerId, multiaddr::Multiaddr};

use crate::{
    addr::{to_sockaddr, PLACEHOLDER_LOCAL_ADDR, PLACEHOLDER_PEER_ADDR},
    P2pStream,
};

/// A connection-oriented view of one negotiated [`P2pStream`].
///
/// This is the connection type handed to the rpc framework on both the server side
/// ([`P2pListener::accept`](crate::P2pListener)) and the client side ([`RpcProtocol::connect`](crate::RpcProtocol::connect)).
pub struct P2pConn {
    stream: P2pStream,
    protocol_id: String,
    closed: bool,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
    read_timer: Option<BoxFuture<'static, ()>>,
    write_timer: Option<BoxFuture<'static, ()>>,
}

impl P2pConn {
    /// Wrap `stream` that was negotiated with `protocol_id`.
    pub fn new<P>(stream: P2pStream, protocol_id: P) -> Self
    where
        P: Into<String>,
    {
        Self {
            stream,
            protocol_id: protocol_id.into(),
            closed: false,
            read_deadline: None,
            write_deadline: None,
            read_timer: None,
            write_timer: None,
        }
    }

    /// Returns the negotiated protocol id.
    pub fn protocol_id(&self) -> &str {
        &self.protocol_id
    }

    /// Returns the remote peer's id.
    pub fn peer_id(&self) -> PeerId {
        self.stream.peer_id()
    }

    /// Returns the local address, or `127.0.0.1:0` if the stream is not bound to an ip address.
    pub fn local_addr(&self) -> SocketAddr {
        to_sockaddr(self.stream.local_addr()).unwrap_or(PLACEHOLDER_LOCAL_ADDR)
    }

    /// Returns the remote address, or `127.0.0.1:1` if the stream is not connected to an ip address.
    pub fn peer_addr(&self) -> SocketAddr {
        to_sockaddr(self.stream.peer_addr()).unwrap_or(PLACEHOLDER_PEER_ADDR)
    }

    /// Returns the local [`Multiaddr`] of the underlying stream.
    pub fn local_multiaddr(&self) -> &Multiaddr {
        self.stream.local_addr()
    }

    /// Returns the remote [`Multiaddr`] of the underlying stream.
    pub fn peer_multiaddr(&self) -> &Multiaddr {
        self.stream.peer_addr()
    }

    /// Set both the read and write deadline, `None` clears them.
    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.set_read_deadline(deadline);
        self.set_write_deadline(deadline);
    }

    /// Pending and future reads fail with [`io::ErrorKind::TimedOut`] after `deadline`.
    pub fn set_read_deadline(&mut self, deadline: Option<Instant>) {
        self.read_deadline = deadline;
        self.read_timer = None;
    }

    /// Pending and future writes fail with [`io::ErrorKind::TimedOut`] after `deadline`.
    pub fn set_write_deadline(&mut self, deadline: Option<Instant>) {
        self.write_deadline = deadline;
        self.write_timer = None;
    }

    /// Returns true if [`close`](futures::AsyncWriteExt::close) has completed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Returns `Ready` once `deadline` is reached.
fn poll_deadline(
    deadline: Option<Instant>,
    timer: &mut Option<BoxFuture<'static, ()>>,
    cx: &mut Context<'_>,
) -> Poll<()> {
    let Some(deadline) = deadline else {
        return Poll::Pending;
    };

    let now = Instant::now();

    if now >= deadline {
        return Poll::Ready(());
    }

    timer
        .get_or_insert_with(|| sleep(deadline - now).boxed())
        .poll_unpin(cx)
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "p2p conn deadline exceeded")
}

fn conn_closed() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "p2p conn is closed")
}

impl AsyncRead for P2pConn {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;

        if this.closed {
            return Poll::Ready(Err(conn_closed()));
        }

        if poll_deadline(this.read_deadline, &mut this.read_timer, cx).is_ready() {
            return Poll::Ready(Err(timed_out()));
        }

        Pin::new(&mut this.stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for P2pConn {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;

        if this.closed {
            return Poll::Ready(Err(conn_closed()));
        }

        if poll_deadline(this.write_deadline, &mut this.write_timer, cx).is_ready() {
            return Poll::Ready(Err(timed_out()));
        }

        Pin::new(&mut this.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = &mut *self;

        if this.closed {
            return Poll::Ready(Ok(()));
        }

        if poll_deadline(this.write_deadline, &mut this.write_timer, cx).is_ready() {
            return Poll::Ready(Err(timed_out()));
        }

        Pin::new(&mut this.stream).poll_flush(cx)
    }

    /// Close the underlying stream once, repeated calls return `Ok(())` immediately.
    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.closed {
            return Poll::Ready(Ok(()));
        }

        let result = futures::ready!(Pin::new(&mut self.stream).poll_close(cx));

        self.closed = true;

        log::trace!(
            "p2p conn closed, peer={}, protocol={}",
            self.stream.peer_id(),
            self.protocol_id
        );

        Poll::Ready(result)
    }
}
