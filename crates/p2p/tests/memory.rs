use std::{
    io,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};

use async_trait::async_trait;
use futures::{future::BoxFuture, AsyncWriteExt};
use rasi::timer::TimeoutExt;
use xstack::{
    identity::PeerId,
    multiaddr::{Multiaddr, Protocol},
};
use xstack_rpc_p2p::{
    host_syscall::{DriverHost, DriverStream},
    Error, Host, Lifecycle, MemoryNetwork, P2pConn, P2pStream, Result, RpcProtocol, StreamHandler,
    PLACEHOLDER_LOCAL_ADDR, PLACEHOLDER_PEER_ADDR, PROTOCOL_P2P_RPC,
};
use xstack_rpc_spec::{
    rpc::{rpc_specs, RpcSpecContext},
    setup,
};

struct MemoryMock;

#[async_trait]
impl RpcSpecContext for MemoryMock {
    async fn create_hosts(&self) -> Result<(Host, Host)> {
        let network = MemoryNetwork::default();

        let server = network.create_host().await;
        let client = network.create_host().await;

        Ok((server.into(), client.into()))
    }
}

#[futures_test::test]
async fn test_specs() {
    rpc_specs(MemoryMock).await.unwrap();
}

#[futures_test::test]
async fn test_with_base() {
    setup();

    let network = MemoryNetwork::default();

    let protocol = RpcProtocol::with_base(
        network.create_host().await,
        Lifecycle::new(),
        "/custom/rpc/1.0.0",
    )
    .unwrap();

    assert_eq!(protocol.base(), "/custom/rpc/1.0.0");

    assert_eq!(
        protocol.register_suffix("").await.unwrap(),
        "/custom/rpc/1.0.0"
    );

    assert_eq!(
        protocol.register_suffix("echo").await.unwrap(),
        "/custom/rpc/1.0.0/echo"
    );

    assert!(matches!(
        RpcProtocol::with_base(network.create_host().await, Lifecycle::new(), "custom"),
        Err(Error::InvalidProtocol(_))
    ));

    let protocol = RpcProtocol::new(network.create_host().await, Lifecycle::new());

    assert_eq!(protocol.base(), PROTOCOL_P2P_RPC);
}

#[futures_test::test]
async fn test_conn_addrs() {
    setup();

    let network = MemoryNetwork::default();

    let server_host = network.create_host().await;
    let client_host = network.create_host().await;

    let server = RpcProtocol::new(server_host.clone(), Lifecycle::new());
    let client = RpcProtocol::new(client_host.clone(), Lifecycle::new());

    server.register_suffix("addrs").await.unwrap();

    let listener = server.listener();

    // memory addresses have no ip form.
    assert_eq!(listener.local_addr().await, PLACEHOLDER_LOCAL_ADDR);

    let outbound = client.connect(server_host.id(), "addrs").await.unwrap();

    let inbound = listener.accept().await.unwrap();

    assert_eq!(outbound.local_addr(), PLACEHOLDER_LOCAL_ADDR);
    assert_eq!(outbound.peer_addr(), PLACEHOLDER_PEER_ADDR);

    assert_eq!(outbound.local_multiaddr(), client_host.addr());
    assert_eq!(outbound.peer_multiaddr(), server_host.addr());
    assert_eq!(inbound.local_multiaddr(), server_host.addr());
    assert_eq!(inbound.peer_multiaddr(), client_host.addr());
}

#[futures_test::test]
async fn test_dial_unknown_peer() {
    setup();

    let network = MemoryNetwork::default();

    let client = RpcProtocol::new(network.create_host().await, Lifecycle::new());

    let peer_id = PeerId::random();

    assert!(matches!(
        client.connect(&peer_id, "").await,
        Err(Error::UnknownPeer(id)) if id == peer_id
    ));
}

/// A stream that only counts `poll_close` calls.
struct CountingStream {
    peer_id: PeerId,
    addr: Multiaddr,
    closed: Arc<AtomicUsize>,
}

impl DriverStream for CountingStream {
    fn peer_id(&self) -> PeerId {
        self.peer_id.clone()
    }

    fn local_addr(&self) -> &Multiaddr {
        &self.addr
    }

    fn peer_addr(&self) -> &Multiaddr {
        &self.addr
    }

    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(0))
    }

    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.closed.fetch_add(1, Ordering::SeqCst);

        Poll::Ready(Ok(()))
    }
}

/// A host that keeps the installed handler, so the test can feed streams into it.
#[derive(Clone)]
struct ManualHost {
    id: PeerId,
    handler: Arc<std::sync::Mutex<Option<StreamHandler>>>,
}

impl ManualHost {
    fn new() -> Self {
        Self {
            id: PeerId::random(),
            handler: Default::default(),
        }
    }

    fn handler(&self) -> StreamHandler {
        self.handler.lock().unwrap().clone().unwrap()
    }
}

#[async_trait]
impl DriverHost for ManualHost {
    fn local_id(&self) -> PeerId {
        self.id.clone()
    }

    async fn local_addrs(&self) -> Vec<Multiaddr> {
        vec![]
    }

    async fn set_stream_handler(&self, _protocol_id: &str, handler: StreamHandler) -> Result<()> {
        *self.handler.lock().unwrap() = Some(handler);

        Ok(())
    }

    async fn connect(&self, peer_id: &PeerId, _protocol_id: &str) -> Result<P2pStream> {
        Err(Error::UnknownPeer(peer_id.clone()))
    }
}

fn counting_stream(closed: &Arc<AtomicUsize>) -> P2pStream {
    CountingStream {
        peer_id: PeerId::random(),
        addr: Multiaddr::empty().with(Protocol::Memory(1)),
        closed: closed.clone(),
    }
    .into()
}

#[futures_test::test]
async fn test_close_exactly_once() {
    setup();

    let closed = Arc::new(AtomicUsize::new(0));

    let mut conn = P2pConn::new(counting_stream(&closed), "/test");

    conn.close().await.unwrap();
    conn.close().await.unwrap();
    conn.close().await.unwrap();

    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[futures_test::test]
async fn test_drop_closes_stream() {
    setup();

    let host = ManualHost::new();

    let lifecycle = Lifecycle::new();

    let protocol = RpcProtocol::new(host.clone(), lifecycle.clone());

    let protocol_id = protocol.register_suffix("").await.unwrap();

    let handler = host.handler();

    let closed = Arc::new(AtomicUsize::new(0));

    // an unregistered protocol id.
    let delivery: BoxFuture<'static, ()> =
        handler(counting_stream(&closed), format!("{}/unknown", protocol_id));

    delivery.await;

    assert_eq!(closed.load(Ordering::SeqCst), 1);

    lifecycle.cancel();

    handler(counting_stream(&closed), protocol_id).await;

    assert_eq!(closed.load(Ordering::SeqCst), 2);
}

#[futures_test::test]
async fn test_delivery_aborts_on_shutdown() {
    setup();

    let host = ManualHost::new();

    let lifecycle = Lifecycle::new();

    let protocol = RpcProtocol::new(host.clone(), lifecycle.clone());

    let protocol_id = protocol.register_suffix("").await.unwrap();

    let handler = host.handler();

    let closed = Arc::new(AtomicUsize::new(0));

    // no `accept` call, so both deliveries wait until shutdown.
    let first = handler(counting_stream(&closed), protocol_id.clone());
    let second = handler(counting_stream(&closed), protocol_id.clone());

    let shutdown = async {
        rasi::timer::sleep(Duration::from_millis(100)).await;

        assert_eq!(closed.load(Ordering::SeqCst), 0);

        lifecycle.cancel();
    };

    futures::future::join3(first, second, shutdown).await;

    assert_eq!(closed.load(Ordering::SeqCst), 2);

    // the protocol is still alive, the closed streams must not reach a listener.
    assert!(matches!(
        protocol.listener().accept().await,
        Err(xstack_rpc::Error::ListenerClosed)
    ));
}

#[futures_test::test]
async fn test_delivery_waits_for_accept() {
    setup();

    let host = ManualHost::new();

    let protocol = RpcProtocol::new(host.clone(), Lifecycle::new());

    let protocol_id = protocol.register_suffix("").await.unwrap();

    let handler = host.handler();

    let closed = Arc::new(AtomicUsize::new(0));

    let delivered = Arc::new(AtomicBool::new(false));

    let delivery = {
        let delivered = delivered.clone();
        let delivery = handler(counting_stream(&closed), protocol_id.clone());

        async move {
            delivery.await;
            delivered.store(true, Ordering::SeqCst);
        }
    };

    let listener = protocol.listener();

    let accept = async {
        rasi::timer::sleep(Duration::from_millis(100)).await;

        assert!(!delivered.load(Ordering::SeqCst));

        listener.accept().await.unwrap()
    };

    let (_, conn) = futures::future::join(delivery, accept).await;

    assert!(delivered.load(Ordering::SeqCst));
    assert_eq!(conn.protocol_id(), protocol_id);
    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[futures_test::test]
async fn test_accept_without_protocols() {
    setup();

    let protocol = RpcProtocol::new(ManualHost::new(), Lifecycle::new());

    let listener = protocol.listener();

    let pending = listener
        .accept()
        .timeout(Duration::from_millis(100))
        .await;

    assert!(pending.is_none(), "accept returns without registered protocols");

    let close = async {
        rasi::timer::sleep(Duration::from_millis(50)).await;
        listener.close();
    };

    let (accepted, _) = futures::future::join(listener.accept(), close).await;

    assert!(matches!(accepted, Err(xstack_rpc::Error::ListenerClosed)));
}
