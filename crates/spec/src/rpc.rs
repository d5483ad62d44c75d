//! test specs for the rpc bridge over a host driver.

use std::{
    collections::HashSet,
    io,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use futures::{channel::oneshot, future::join, AsyncReadExt, AsyncWriteExt};
use rasi::{
    task::spawn_ok,
    timer::{sleep, TimeoutExt},
};
use xstack_rpc::{ClientState, Code, DialOption, RpcListener, RpcServer};
use xstack_rpc_p2p::{Error, Host, Lifecycle, Result, RpcProtocol};

use crate::setup;

/// A trait to access context data of the rpc test suites.
#[async_trait]
pub trait RpcSpecContext: Sync {
    /// Create a `(server, client)` host pair, the client host must be able to connect to the server host by peer id.
    async fn create_hosts(&self) -> Result<(Host, Host)>;
}

/// entry point for rpc bridge tests.
pub async fn rpc_specs<C>(cx: C) -> Result<()>
where
    C: RpcSpecContext,
{
    setup();

    routing(&cx).await?;
    fan_in(&cx).await?;
    fairness(&cx).await?;
    accept_snapshot(&cx).await?;
    shutdown_unblocks_accept(&cx).await?;
    drop_after_shutdown(&cx).await?;
    close_twice(&cx).await?;
    conn_round_trip(&cx).await?;
    suffix_isolation(&cx).await?;
    rpc_round_trip(&cx).await?;

    Ok(())
}

/// Upper bound of any wait that is expected to finish.
const SPEC_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait before concluding that nothing arrives.
const SILENCE: Duration = Duration::from_millis(200);

async fn routing(cx: &dyn RpcSpecContext) -> Result<()> {
    let (server, client) = cx.create_hosts().await?;
    let (other, _) = cx.create_hosts().await?;

    let server_id = server.local_id();
    let client_id = client.local_id();

    let server = RpcProtocol::new(server, Lifecycle::new());
    let other = RpcProtocol::new(other, Lifecycle::new());
    let client = RpcProtocol::new(client, Lifecycle::new());

    let protocol_id = server.register_suffix("routing").await?;

    assert_eq!(other.register_suffix("routing").await?, protocol_id);

    let listener = server.listener();
    let other_listener = other.listener();

    let mut outbound = client.connect(&server_id, "routing").await?;

    let mut inbound = listener
        .accept()
        .timeout(SPEC_TIMEOUT)
        .await
        .expect("routing: accept timeout")?;

    assert_eq!(inbound.protocol_id(), protocol_id);
    assert_eq!(outbound.protocol_id(), protocol_id);
    assert_eq!(inbound.peer_id(), client_id);
    assert_eq!(outbound.peer_id(), server_id);

    outbound.write_all(b"routing").await?;

    let mut buf = [0u8; 7];

    inbound.read_exact(&mut buf).await?;

    assert_eq!(&buf, b"routing");

    assert!(
        other_listener.accept().timeout(SILENCE).await.is_none(),
        "routing: stream is delivered to another listener"
    );

    Ok(())
}

async fn fan_in(cx: &dyn RpcSpecContext) -> Result<()> {
    const PROTOCOLS: usize = 4;

    let (server, client) = cx.create_hosts().await?;

    let server_id = server.local_id();

    let server = RpcProtocol::new(server, Lifecycle::new());
    let client = RpcProtocol::new(client, Lifecycle::new());

    let mut expected = HashSet::new();

    for i in 0..PROTOCOLS {
        expected.insert(server.register_suffix(&format!("fan_in_{}", i)).await?);
    }

    assert_eq!(server.protocols().await.into_iter().collect::<HashSet<_>>(), expected);

    let listener = server.listener();

    let mut outbound = vec![];

    for i in 0..PROTOCOLS {
        outbound.push(client.connect(&server_id, &format!("fan_in_{}", i)).await?);
    }

    let mut accepted = HashSet::new();

    for _ in 0..PROTOCOLS {
        let conn = listener
            .accept()
            .timeout(SPEC_TIMEOUT)
            .await
            .expect("fan_in: accept blocked with pending streams")?;

        accepted.insert(conn.protocol_id().to_owned());
    }

    assert_eq!(accepted, expected);

    Ok(())
}

async fn fairness(cx: &dyn RpcSpecContext) -> Result<()> {
    // streams kept waiting on the busy protocol.
    const BACKLOG: usize = 4;
    // a fair pick misses the quiet stream this many times in a row with probability 2^-32.
    const ROUNDS: usize = 32;

    let (server, client) = cx.create_hosts().await?;

    let server_id = server.local_id();

    let server = RpcProtocol::new(server, Lifecycle::new());
    let client = RpcProtocol::new(client, Lifecycle::new());

    server.register_suffix("busy").await?;
    let quiet = server.register_suffix("quiet").await?;

    let listener = server.listener();

    let mut outbound = vec![];

    for _ in 0..BACKLOG {
        outbound.push(client.connect(&server_id, "busy").await?);
    }

    outbound.push(client.connect(&server_id, "quiet").await?);

    // let all handlers reach the handoff.
    sleep(SILENCE).await;

    for round in 0..ROUNDS {
        let conn = listener
            .accept()
            .timeout(SPEC_TIMEOUT)
            .await
            .expect("fairness: accept blocked with pending streams")?;

        if conn.protocol_id() == quiet {
            log::trace!("fairness: quiet protocol accepted in round {}", round);
            return Ok(());
        }

        // keep the busy protocol ready.
        outbound.push(client.connect(&server_id, "busy").await?);
    }

    panic!("fairness: quiet protocol is starved for {} accept calls", ROUNDS);
}

async fn accept_snapshot(cx: &dyn RpcSpecContext) -> Result<()> {
    let (server, client) = cx.create_hosts().await?;

    let server_id = server.local_id();

    let server = RpcProtocol::new(server, Lifecycle::new());
    let client = RpcProtocol::new(client, Lifecycle::new());

    server.register_suffix("early").await?;

    let listener = server.listener();

    let (accepted, late) = join(listener.accept().timeout(SILENCE * 5), async {
        sleep(Duration::from_millis(50)).await;

        let protocol_id = server.register_suffix("late").await?;

        let outbound = client.connect(&server_id, "late").await?;

        Ok::<_, Error>((protocol_id, outbound))
    })
    .await;

    let (late, _outbound) = late?;

    assert!(
        accepted.is_none(),
        "accept_snapshot: running accept returns a protocol registered after it started"
    );

    let conn = listener
        .accept()
        .timeout(SPEC_TIMEOUT)
        .await
        .expect("accept_snapshot: next accept misses the late protocol")?;

    assert_eq!(conn.protocol_id(), late);

    Ok(())
}

async fn shutdown_unblocks_accept(cx: &dyn RpcSpecContext) -> Result<()> {
    let (server, _client) = cx.create_hosts().await?;

    let server = RpcProtocol::new(server, Lifecycle::new());

    server.register_suffix("shutdown").await?;

    let listener = server.listener();

    let (accepted, _) = join(listener.accept().timeout(SPEC_TIMEOUT), async {
        sleep(Duration::from_millis(100)).await;
        listener.close();
    })
    .await;

    assert!(matches!(
        accepted.expect("shutdown: accept is not unblocked by close"),
        Err(xstack_rpc::Error::ListenerClosed)
    ));

    for _ in 0..3 {
        let accepted = listener.accept().timeout(SILENCE).await;

        assert!(matches!(
            accepted,
            Some(Err(xstack_rpc::Error::ListenerClosed))
        ));
    }

    // closing one listener leaves the protocol open.
    assert!(!server.lifecycle().is_cancelled());
    assert!(!server.listener().is_closed());

    Ok(())
}

async fn drop_after_shutdown(cx: &dyn RpcSpecContext) -> Result<()> {
    let (server, client) = cx.create_hosts().await?;

    let server_id = server.local_id();

    let lifecycle = Lifecycle::new();

    let server = RpcProtocol::new(server, lifecycle.clone());
    let client = RpcProtocol::new(client, Lifecycle::new());

    server.register_suffix("drop").await?;

    let listener = server.listener();

    // nobody accepts this one, it waits in the handoff until shutdown.
    let mut pending = client.connect(&server_id, "drop").await?;

    sleep(SILENCE).await;

    lifecycle.cancel();

    let mut buf = [0u8; 16];

    let read = pending
        .read(&mut buf)
        .timeout(SPEC_TIMEOUT)
        .await
        .expect("drop: waiting stream is not closed by shutdown");

    assert!(!matches!(read, Ok(read_size) if read_size > 0));

    assert!(listener.is_closed());
    assert!(matches!(
        listener.accept().await,
        Err(xstack_rpc::Error::ListenerClosed)
    ));

    match client.connect(&server_id, "drop").await {
        Ok(mut conn) => {
            let mut buf = [0u8; 16];

            let read = conn
                .read(&mut buf)
                .timeout(SPEC_TIMEOUT)
                .await
                .expect("drop: dropped stream is not closed");

            assert!(!matches!(read, Ok(read_size) if read_size > 0));
        }
        Err(err) => {
            log::trace!("drop: connect after shutdown, err={}", err);
        }
    }

    Ok(())
}

async fn close_twice(cx: &dyn RpcSpecContext) -> Result<()> {
    let (server, _client) = cx.create_hosts().await?;

    let server = RpcProtocol::new(server, Lifecycle::new());

    server.register_suffix("close").await?;

    let listener = server.listener();

    log::trace!("close: listener laddr={}", listener.local_addr().await);

    listener.close();
    listener.close();

    assert!(listener.is_closed());

    RpcListener::close(&listener).await?;
    RpcListener::close(&listener).await?;

    assert!(matches!(
        listener.accept().await,
        Err(xstack_rpc::Error::ListenerClosed)
    ));

    Ok(())
}

async fn conn_round_trip(cx: &dyn RpcSpecContext) -> Result<()> {
    let (server, client) = cx.create_hosts().await?;

    let server_id = server.local_id();

    let server = RpcProtocol::new(server, Lifecycle::new());
    let client = RpcProtocol::new(client, Lifecycle::new());

    server.register_suffix("round_trip").await?;

    let listener = server.listener();

    let mut outbound = client.connect(&server_id, "round_trip").await?;

    let mut inbound = listener
        .accept()
        .timeout(SPEC_TIMEOUT)
        .await
        .expect("round_trip: accept timeout")?;

    let payload = (0..64 * 1024).map(|i| (i % 251) as u8).collect::<Vec<_>>();

    let echo = async {
        let mut buf = vec![0u8; payload.len()];

        inbound.read_exact(&mut buf).await?;

        for chunk in buf.chunks(1000) {
            inbound.write_all(chunk).await?;
        }

        inbound.flush().await?;

        Ok::<_, io::Error>(buf)
    };

    let send = async {
        for chunk in payload.chunks(1000) {
            outbound.write_all(chunk).await?;
        }

        outbound.flush().await?;

        let mut buf = vec![0u8; payload.len()];

        outbound.read_exact(&mut buf).await?;

        Ok::<_, io::Error>(buf)
    };

    let (received, echoed) = join(echo, send).await;

    assert_eq!(received?, payload);
    assert_eq!(echoed?, payload);

    // nothing is sent, so the read deadline expires.
    outbound.set_read_deadline(Some(Instant::now() + Duration::from_millis(100)));

    let mut buf = [0u8; 16];

    let err = outbound
        .read(&mut buf)
        .timeout(SPEC_TIMEOUT)
        .await
        .expect("round_trip: read deadline is not enforced")
        .expect_err("round_trip: read before deadline");

    assert_eq!(err.kind(), io::ErrorKind::TimedOut);

    outbound.set_read_deadline(None);

    outbound.close().await?;
    outbound.close().await?;

    assert!(outbound.is_closed());

    assert_eq!(
        outbound.write(b"closed").await.expect_err("write after close").kind(),
        io::ErrorKind::NotConnected
    );

    let read_size = inbound
        .read(&mut buf)
        .timeout(SPEC_TIMEOUT)
        .await
        .expect("round_trip: close is not observed by the peer")?;

    assert_eq!(read_size, 0);

    Ok(())
}

async fn suffix_isolation(cx: &dyn RpcSpecContext) -> Result<()> {
    let (server, client) = cx.create_hosts().await?;

    let server_id = server.local_id();

    let server = RpcProtocol::new(server, Lifecycle::new());
    let client = RpcProtocol::new(client, Lifecycle::new());

    let svc1 = server.register_suffix("svc1").await?;
    let svc2 = server.register_suffix("svc2").await?;

    assert_ne!(svc1, svc2);

    assert!(matches!(
        server.register_suffix("svc1").await,
        Err(Error::ProtocolRegistered(id)) if id == svc1
    ));

    assert!(matches!(
        server.register_suffix("svc1/svc2").await,
        Err(Error::InvalidSuffix(_))
    ));

    let listener = server.listener();

    let mut outbound = vec![];

    for _ in 0..10 {
        outbound.push(client.connect(&server_id, "svc1").await?);

        let inbound = listener
            .accept()
            .timeout(SPEC_TIMEOUT)
            .await
            .expect("isolation: accept timeout")?;

        assert_eq!(inbound.protocol_id(), svc1);
    }

    outbound.push(client.connect(&server_id, "svc2").await?);

    let inbound = listener
        .accept()
        .timeout(SPEC_TIMEOUT)
        .await
        .expect("isolation: accept timeout")?;

    assert_eq!(inbound.protocol_id(), svc2);

    assert!(
        client.connect(&server_id, "svc3").await.is_err(),
        "isolation: unregistered suffix is negotiated"
    );

    Ok(())
}

async fn rpc_round_trip(cx: &dyn RpcSpecContext) -> Result<()> {
    let (server, client) = cx.create_hosts().await?;

    let server_id = server.local_id();

    let lifecycle = Lifecycle::new();

    let server = RpcProtocol::new(server, lifecycle.clone());
    let client = RpcProtocol::new(client, Lifecycle::new());

    server.register_suffix("").await?;

    let rpc_server = RpcServer::new().method("/spec/reverse", |mut body: Vec<u8>| async move {
        body.reverse();

        Ok::<_, xstack_rpc::Error>(body)
    });

    let (sender, receiver) = oneshot::channel();

    let serve = server.clone();

    spawn_ok(async move {
        _ = sender.send(serve.serve(&rpc_server).await);
    });

    let session = client
        .dial(
            &server_id,
            "",
            [
                DialOption::Insecure,
                DialOption::Block,
                DialOption::Timeout(SPEC_TIMEOUT),
            ],
        )
        .await?;

    assert_eq!(session.state(), ClientState::Ready);

    assert_eq!(
        session.call("/spec/reverse", b"hello".to_vec()).await?,
        b"olleh"
    );

    match session.call("/spec/unknown", vec![]).await {
        Err(xstack_rpc::Error::Remote { code, .. }) => assert_eq!(code, Code::NOT_FOUND),
        other => panic!("rpc: unexpected result {:?}", other),
    }

    let err = client
        .dial(&server_id, "", [DialOption::Block])
        .await
        .err()
        .expect("rpc: dial without channel security");

    assert!(matches!(
        err,
        Error::Rpc(xstack_rpc::Error::TransportSecurity)
    ));

    session.close().await?;

    assert_eq!(session.state(), ClientState::Shutdown);

    assert!(matches!(
        session.ping().await,
        Err(xstack_rpc::Error::Shutdown)
    ));

    lifecycle.cancel();

    let served = receiver
        .timeout(SPEC_TIMEOUT)
        .await
        .expect("rpc: serve is not stopped by shutdown");

    assert!(matches!(
        served,
        Ok(Err(xstack_rpc::Error::ListenerClosed))
    ));

    Ok(())
}
