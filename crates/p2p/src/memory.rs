//! An in-process host driver, peers exchange bytes through memory channels.
//!
//! This driver has no transport, no security and no multistream negotiation,
//! it is used to drive the rpc bridge in tests and demos.

use std::{
    collections::HashMap,
    io::{Error, ErrorKind, Result},
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex as StdMutex, PoisonError, Weak,
    },
    task::{Context, Poll},
};

use async_trait::async_trait;
use futures::{
    channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
    lock::Mutex,
    StreamExt,
};
use rasi::task::spawn_ok;
use xstack::{
    identity::PeerId,
    multiaddr::{Multiaddr, Protocol},
};

use crate::{
    host_syscall::{DriverHost, DriverStream},
    P2pStream, StreamHandler,
};

#[derive(Default)]
struct RawMemoryNetwork {
    next_port: AtomicU64,
    hosts: StdMutex<HashMap<PeerId, Weak<RawMemoryHost>>>,
}

impl RawMemoryNetwork {
    fn hosts(&self) -> std::sync::MutexGuard<'_, HashMap<PeerId, Weak<RawMemoryHost>>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A set of [`MemoryHost`]s that can dial each other.
#[derive(Clone, Default)]
pub struct MemoryNetwork(Arc<RawMemoryNetwork>);

impl MemoryNetwork {
    /// Create a new host with a random peer id, and attach it to this network.
    pub async fn create_host(&self) -> MemoryHost {
        let port = self.0.next_port.fetch_add(1, Ordering::Relaxed) + 1;

        let host = Arc::new(RawMemoryHost {
            id: PeerId::random(),
            addr: Multiaddr::empty().with(Protocol::Memory(port)),
            network: self.clone(),
            handlers: Default::default(),
        });

        self.0.hosts().insert(host.id.clone(), Arc::downgrade(&host));

        log::trace!("memory host created, id={}, addr={}", host.id, host.addr);

        MemoryHost(host)
    }

    fn lookup(&self, peer_id: &PeerId) -> Option<MemoryHost> {
        self.0
            .hosts()
            .get(peer_id)
            .and_then(Weak::upgrade)
            .map(MemoryHost)
    }
}

struct RawMemoryHost {
    id: PeerId,
    addr: Multiaddr,
    network: MemoryNetwork,
    handlers: Mutex<HashMap<String, StreamHandler>>,
}

impl Drop for RawMemoryHost {
    fn drop(&mut self) {
        self.network.0.hosts().remove(&self.id);

        log::trace!("memory host dropped, id={}", self.id);
    }
}

/// A host attached to one [`MemoryNetwork`].
///
/// The host is removed from the network once all of its handles are dropped.
#[derive(Clone)]
pub struct MemoryHost(Arc<RawMemoryHost>);

impl MemoryHost {
    /// Returns the peer id of this host.
    pub fn id(&self) -> &PeerId {
        &self.0.id
    }

    /// Returns the `/memory/<n>` address of this host.
    pub fn addr(&self) -> &Multiaddr {
        &self.0.addr
    }
}

#[async_trait]
impl DriverHost for MemoryHost {
    fn local_id(&self) -> PeerId {
        self.0.id.clone()
    }

    async fn local_addrs(&self) -> Vec<Multiaddr> {
        vec![self.0.addr.clone()]
    }

    async fn set_stream_handler(
        &self,
        protocol_id: &str,
        handler: StreamHandler,
    ) -> crate::Result<()> {
        let mut handlers = self.0.handlers.lock().await;

        if handlers.contains_key(protocol_id) {
            return Err(crate::Error::ProtocolRegistered(protocol_id.to_owned()));
        }

        handlers.insert(protocol_id.to_owned(), handler);

        Ok(())
    }

    async fn connect(&self, peer_id: &PeerId, protocol_id: &str) -> crate::Result<P2pStream> {
        let remote = self
            .0
            .network
            .lookup(peer_id)
            .ok_or_else(|| crate::Error::UnknownPeer(peer_id.clone()))?;

        let handler = remote
            .0
            .handlers
            .lock()
            .await
            .get(protocol_id)
            .cloned()
            .ok_or_else(|| {
                crate::Error::NegotiationFailed(format!(
                    "peer {} does not support {}",
                    peer_id, protocol_id
                ))
            })?;

        let (outbound, inbound) = MemoryStream::pair(self, &remote);

        log::trace!(
            "memory stream opened, from={}, to={}, protocol={}",
            self.0.id,
            peer_id,
            protocol_id
        );

        spawn_ok(handler(inbound.into(), protocol_id.to_owned()));

        Ok(outbound.into())
    }
}

/// One half of an in-memory duplex byte stream.
struct MemoryStream {
    peer_id: PeerId,
    local_addr: Multiaddr,
    peer_addr: Multiaddr,
    sender: Option<UnboundedSender<Vec<u8>>>,
    receiver: UnboundedReceiver<Vec<u8>>,
    pending: Vec<u8>,
    offset: usize,
}

impl MemoryStream {
    fn pair(local: &MemoryHost, remote: &MemoryHost) -> (Self, Self) {
        let (local_sender, remote_receiver) = unbounded();
        let (remote_sender, local_receiver) = unbounded();

        let outbound = Self {
            peer_id: remote.0.id.clone(),
            local_addr: local.0.addr.clone(),
            peer_addr: remote.0.addr.clone(),
            sender: Some(local_sender),
            receiver: local_receiver,
            pending: vec![],
            offset: 0,
        };

        let inbound = Self {
            peer_id: local.0.id.clone(),
            local_addr: remote.0.addr.clone(),
            peer_addr: local.0.addr.clone(),
            sender: Some(remote_sender),
            receiver: remote_receiver,
            pending: vec![],
            offset: 0,
        };

        (outbound, inbound)
    }
}

impl DriverStream for MemoryStream {
    fn peer_id(&self) -> PeerId {
        self.peer_id.clone()
    }

    fn local_addr(&self) -> &Multiaddr {
        &self.local_addr
    }

    fn peer_addr(&self) -> &Multiaddr {
        &self.peer_addr
    }

    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<Result<usize>> {
        while self.offset == self.pending.len() {
            match futures::ready!(self.receiver.poll_next_unpin(cx)) {
                Some(data) => {
                    self.pending = data;
                    self.offset = 0;
                }
                // eof
                None => return Poll::Ready(Ok(0)),
            }
        }

        let this = &mut *self;

        let len = buf.len().min(this.pending.len() - this.offset);

        buf[..len].copy_from_slice(&this.pending[this.offset..this.offset + len]);

        this.offset += len;

        Poll::Ready(Ok(len))
    }

    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<Result<usize>> {
        let Some(sender) = &self.sender else {
            return Poll::Ready(Err(Error::new(
                ErrorKind::NotConnected,
                "memory stream is closed",
            )));
        };

        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        if sender.unbounded_send(buf.to_vec()).is_err() {
            return Poll::Ready(Err(Error::new(
                ErrorKind::BrokenPipe,
                "memory stream peer is closed",
            )));
        }

        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        if let Some(sender) = self.sender.take() {
            sender.close_channel();
        }

        Poll::Ready(Ok(()))
    }
}
