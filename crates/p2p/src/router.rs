use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError, Weak},
};

use futures::{
    channel::{
        mpsc::{unbounded, UnboundedReceiver, UnboundedSender},
        oneshot,
    },
    future::{select, BoxFuture, Either},
    lock::Mutex,
    AsyncWriteExt,
};
use xstack::identity::PeerId;
use xstack_rpc::{DialOption, RpcClient, RpcServer};

use crate::{
    protocol::{check_base, protocol_id},
    Error, Host, Lifecycle, P2pConn, P2pListener, P2pStream, Result, PROTOCOL_P2P_RPC,
};

/// The receiving half of one protocol's intake channel, shared by all listeners.
pub(crate) type IntakeReceiver = Arc<Mutex<UnboundedReceiver<Offer>>>;

type Slot = Arc<StdMutex<Option<P2pStream>>>;

/// An inbound stream waiting for an `accept` call.
///
/// The stream can be taken once, either by a listener or back by the stream handler.
pub(crate) struct Offer {
    slot: Slot,
    ack: Option<oneshot::Sender<()>>,
}

impl Offer {
    fn new(stream: P2pStream) -> (Self, Slot, oneshot::Receiver<()>) {
        let slot = Arc::new(StdMutex::new(Some(stream)));
        let (ack, taken) = oneshot::channel();

        (
            Self {
                slot: slot.clone(),
                ack: Some(ack),
            },
            slot,
            taken,
        )
    }

    /// Take the stream and release the waiting handler.
    ///
    /// Returns `None` if the handler already took the stream back.
    pub(crate) fn take(mut self) -> Option<P2pStream> {
        let stream = reclaim(&self.slot)?;

        if let Some(ack) = self.ack.take() {
            _ = ack.send(());
        }

        Some(stream)
    }
}

fn reclaim(slot: &Slot) -> Option<P2pStream> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// A rendezvous point between the host's stream handlers and the listeners.
struct Intake {
    sender: UnboundedSender<Offer>,
    receiver: IntakeReceiver,
}

impl Intake {
    fn new() -> Self {
        // offers are queued, streams are not: a handler keeps ownership until one listener takes it.
        let (sender, receiver) = unbounded();

        Self {
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }
}

struct RawRpcProtocol {
    host: Host,
    base: String,
    lifecycle: Lifecycle,
    intakes: Mutex<HashMap<String, Intake>>,
}

/// Routes the host's inbound rpc streams to [`P2pListener`]s, and dials outbound rpc streams.
///
/// ```no_run
/// use xstack_rpc::{DialOption, RpcServer};
/// use xstack_rpc_p2p::{Lifecycle, MemoryNetwork, RpcProtocol};
///
/// # async fn boostrap() {
/// let network = MemoryNetwork::default();
///
/// let server = RpcProtocol::new(network.create_host().await, Lifecycle::new());
///
/// server.register_suffix("").await.unwrap();
///
/// let server_id = server.host().local_id();
///
/// let rpc_server = RpcServer::new();
///
/// let serve = server.clone();
///
/// rasi::task::spawn_ok(async move {
///     _ = serve.serve(&rpc_server).await;
/// });
///
/// let client = RpcProtocol::new(network.create_host().await, Lifecycle::new());
///
/// let session = client
///     .dial(&server_id, "", [DialOption::Insecure, DialOption::Block])
///     .await
///     .unwrap();
/// # }
/// ```
#[derive(Clone)]
pub struct RpcProtocol {
    inner: Arc<RawRpcProtocol>,
}

impl RpcProtocol {
    /// Attach the rpc protocol to `host`, using [`PROTOCOL_P2P_RPC`] as the base protocol id.
    ///
    /// Cancelling `lifecycle` shuts down every listener created by this instance,
    /// and makes the stream handlers close inbound streams instead of waiting for an `accept` call,
    /// including the streams whose handlers are already waiting.
    pub fn new<H>(host: H, lifecycle: Lifecycle) -> Self
    where
        H: Into<Host>,
    {
        Self::from_parts(host.into(), PROTOCOL_P2P_RPC.to_owned(), lifecycle)
    }

    /// Like [`new`](Self::new), but with a custom base protocol id.
    pub fn with_base<H, B>(host: H, lifecycle: Lifecycle, base: B) -> Result<Self>
    where
        H: Into<Host>,
        B: AsRef<str>,
    {
        check_base(base.as_ref())?;

        Ok(Self::from_parts(
            host.into(),
            base.as_ref().to_owned(),
            lifecycle,
        ))
    }

    fn from_parts(host: Host, base: String, lifecycle: Lifecycle) -> Self {
        Self {
            inner: Arc::new(RawRpcProtocol {
                host,
                base,
                lifecycle,
                intakes: Default::default(),
            }),
        }
    }

    /// Returns the attached host.
    pub fn host(&self) -> &Host {
        &self.inner.host
    }

    /// Returns the base protocol id.
    pub fn base(&self) -> &str {
        &self.inner.base
    }

    /// Returns the lifecycle scope of this instance.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.inner.lifecycle
    }

    /// Returns the protocol id derived from `suffix`.
    pub fn protocol_id(&self, suffix: &str) -> Result<String> {
        protocol_id(&self.inner.base, suffix)
    }

    /// Returns the registered protocol ids.
    pub async fn protocols(&self) -> Vec<String> {
        self.inner.intakes.lock().await.keys().cloned().collect()
    }

    /// Register a rpc service protocol suffix, and install its stream handler on the host.
    ///
    /// On success, returns the derived protocol id.
    /// Registering the same suffix twice returns [`Error::ProtocolRegistered`].
    pub async fn register_suffix(&self, suffix: &str) -> Result<String> {
        let protocol_id = self.protocol_id(suffix)?;

        let mut intakes = self.inner.intakes.lock().await;

        if intakes.contains_key(&protocol_id) {
            return Err(Error::ProtocolRegistered(protocol_id));
        }

        let inner = Arc::downgrade(&self.inner);

        self.inner
            .host
            .set_stream_handler(
                &protocol_id,
                Arc::new(
                    move |stream: P2pStream, protocol_id: String| -> BoxFuture<'static, ()> {
                        Box::pin(Self::handle_stream(inner.clone(), stream, protocol_id))
                    },
                ),
            )
            .await?;

        intakes.insert(protocol_id.clone(), Intake::new());

        log::info!("register rpc protocol {}", protocol_id);

        Ok(protocol_id)
    }

    /// Hand `stream` over to one `accept` call, or close it if the lifecycle is done first.
    ///
    /// Returns only after a listener took the stream or the stream was closed.
    async fn handle_stream(inner: Weak<RawRpcProtocol>, stream: P2pStream, protocol_id: String) {
        let Some(inner) = inner.upgrade() else {
            drop_stream(stream, &protocol_id, "rpc protocol is dropped").await;
            return;
        };

        if inner.lifecycle.is_cancelled() {
            drop_stream(stream, &protocol_id, "rpc protocol is shutting down").await;
            return;
        }

        let sender = inner
            .intakes
            .lock()
            .await
            .get(&protocol_id)
            .map(|intake| intake.sender.clone());

        let Some(sender) = sender else {
            drop_stream(stream, &protocol_id, "protocol is not registered").await;
            return;
        };

        let cancelled = inner.lifecycle.cancelled();

        // the protocol must be droppable while this handler waits.
        drop(inner);

        let peer_id = stream.peer_id();

        let (offer, slot, taken) = Offer::new(stream);

        if let Err(err) = sender.unbounded_send(offer) {
            if let Some(stream) = err.into_inner().take() {
                drop_stream(stream, &protocol_id, "intake channel is closed").await;
            }

            return;
        }

        let reason = match select(taken, cancelled).await {
            Either::Left((Ok(_), _)) => {
                log::trace!("route stream, peer={}, protocol={}", peer_id, protocol_id);
                return;
            }
            Either::Left((Err(_), _)) => "intake channel is closed",
            Either::Right(_) => "rpc protocol is shutting down",
        };

        match reclaim(&slot) {
            Some(stream) => drop_stream(stream, &protocol_id, reason).await,
            None => {
                log::trace!("route stream, peer={}, protocol={}", peer_id, protocol_id);
            }
        }
    }

    /// Snapshot of the registered intake channels.
    pub(crate) async fn receivers(&self) -> Vec<(String, IntakeReceiver)> {
        self.inner
            .intakes
            .lock()
            .await
            .iter()
            .map(|(protocol_id, intake)| (protocol_id.clone(), intake.receiver.clone()))
            .collect()
    }

    /// Create a new listener over all registered protocols.
    ///
    /// See [`P2pListener::accept`] for the behavior when no protocol is registered yet.
    pub fn listener(&self) -> P2pListener {
        P2pListener::new(self.clone(), self.inner.lifecycle.child())
    }

    /// Serve `server` on a new [`listener`](Self::listener).
    ///
    /// Returns [`xstack_rpc::Error::ListenerClosed`] once the lifecycle is done.
    pub async fn serve(&self, server: &RpcServer) -> xstack_rpc::Result<()> {
        server.serve(self.listener()).await
    }

    /// Open a raw rpc connection to `peer_id`, on the protocol derived from `suffix`.
    pub async fn connect(&self, peer_id: &PeerId, suffix: &str) -> Result<P2pConn> {
        let protocol_id = self.protocol_id(suffix)?;

        let stream = self.inner.host.connect(peer_id, &protocol_id).await?;

        log::trace!("open rpc stream, peer={}, protocol={}", peer_id, protocol_id);

        Ok(P2pConn::new(stream, protocol_id))
    }

    /// Dial `peer_id` and create a rpc client session on it.
    ///
    /// The `options` are passed to [`RpcClient::new`] unmodified, host errors are not retried.
    pub async fn dial<I>(
        &self,
        peer_id: &PeerId,
        suffix: &str,
        options: I,
    ) -> Result<RpcClient<P2pConn>>
    where
        I: IntoIterator<Item = DialOption>,
    {
        let conn = self.connect(peer_id, suffix).await?;

        Ok(RpcClient::new(conn, options).await?)
    }
}

async fn drop_stream(mut stream: P2pStream, protocol_id: &str, reason: &str) {
    log::warn!(
        "drop stream from={}, protocol={}, reason='{}'",
        stream.peer_id(),
        protocol_id,
        reason
    );

    if let Err(err) = stream.close().await {
        log::trace!("close dropped stream, err={}", err);
    }
}
