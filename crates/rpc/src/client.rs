use std::{
    sync::atomic::{AtomicU64, AtomicU8, Ordering},
    time::Duration,
};

use futures::{lock::Mutex, AsyncRead, AsyncWrite, AsyncWriteExt};
use protobuf::Message;
use rasi::timer::TimeoutExt;

use crate::{
    frame::{recv_message, send_message, DEFAULT_MAX_PACKET_SIZE},
    proto::rpc::{Code, Request, Response},
    Error, Result, PING_METHOD,
};

/// Options accepted by [`RpcClient::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialOption {
    /// Run without channel security of the rpc layer; the underlying stream must provide it.
    Insecure,
    /// Block `new` until the server answered one ping.
    Block,
    /// Deadline of every call.
    ///
    /// A call that misses its deadline may leave the connection in the middle of a frame,
    /// so the client shuts down and closes the connection.
    Timeout(Duration),
    /// Maximum length of one response frame.
    MaxPacketSize(usize),
}

/// The folded form of a [`DialOption`] list.
#[derive(Debug, Clone)]
pub struct DialOptions {
    pub insecure: bool,
    pub block: bool,
    pub timeout: Option<Duration>,
    pub max_packet_size: usize,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            insecure: false,
            block: false,
            timeout: None,
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

impl FromIterator<DialOption> for DialOptions {
    fn from_iter<T: IntoIterator<Item = DialOption>>(iter: T) -> Self {
        let mut options = DialOptions::default();

        for option in iter {
            match option {
                DialOption::Insecure => options.insecure = true,
                DialOption::Block => options.block = true,
                DialOption::Timeout(duration) => options.timeout = Some(duration),
                DialOption::MaxPacketSize(len) => options.max_packet_size = len,
            }
        }

        options
    }
}

/// Connectivity state of a [`RpcClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ClientState {
    /// No call has completed on the connection yet.
    Idle = 0,
    /// At least one call has completed.
    Ready = 1,
    /// The client is closed.
    Shutdown = 2,
}

impl From<u8> for ClientState {
    fn from(value: u8) -> Self {
        match value {
            0 => ClientState::Idle,
            1 => ClientState::Ready,
            _ => ClientState::Shutdown,
        }
    }
}

/// A rpc client session bound to one connection.
///
/// Calls are serialised on the connection, concurrent callers wait for their turn.
pub struct RpcClient<C> {
    conn: Mutex<C>,
    options: DialOptions,
    next_id: AtomicU64,
    state: AtomicU8,
}

impl<C> RpcClient<C>
where
    C: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a client session over `conn`.
    ///
    /// Returns [`Error::TransportSecurity`] if `options` does not contain [`DialOption::Insecure`].
    pub async fn new<I>(conn: C, options: I) -> Result<Self>
    where
        I: IntoIterator<Item = DialOption>,
    {
        let options = DialOptions::from_iter(options);

        if !options.insecure {
            return Err(Error::TransportSecurity);
        }

        let client = Self {
            conn: Mutex::new(conn),
            options,
            next_id: AtomicU64::new(0),
            state: AtomicU8::new(ClientState::Idle as u8),
        };

        if client.options.block {
            client.ping().await?;
        }

        Ok(client)
    }

    /// Returns the connectivity state.
    pub fn state(&self) -> ClientState {
        self.state.load(Ordering::Acquire).into()
    }

    /// Returns the options this client was created with.
    pub fn options(&self) -> &DialOptions {
        &self.options
    }

    /// Invoke `method` with raw `body`, and returns the raw response body.
    ///
    /// On [`Error::Timeout`] the client is shut down, later calls return [`Error::Shutdown`].
    pub async fn call<M>(&self, method: M, body: Vec<u8>) -> Result<Vec<u8>>
    where
        M: AsRef<str>,
    {
        if self.state() == ClientState::Shutdown {
            return Err(Error::Shutdown);
        }

        let mut request = Request::new();

        request.id = self.next_id.fetch_add(1, Ordering::Relaxed);
        request.method = method.as_ref().to_owned();
        request.body = body;

        let response = if let Some(timeout) = self.options.timeout {
            match self.round_trip(&request).timeout(timeout).await {
                Some(response) => response?,
                None => {
                    log::warn!(
                        "call timeout, method={}, id={}, shutdown client",
                        request.method,
                        request.id
                    );

                    if let Err(err) = self.close().await {
                        log::trace!("close timed out connection, err={}", err);
                    }

                    return Err(Error::Timeout);
                }
            }
        } else {
            self.round_trip(&request).await?
        };

        _ = self.state.compare_exchange(
            ClientState::Idle as u8,
            ClientState::Ready as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        match response.code.enum_value() {
            Ok(Code::OK) => Ok(response.body),
            Ok(code) => Err(Error::Remote {
                code,
                message: response.message,
            }),
            Err(value) => Err(Error::Remote {
                code: Code::INTERNAL,
                message: format!("unknown result code {}: {}", value, response.message),
            }),
        }
    }

    /// Invoke `method` with a protobuf request, and decode the response as `Resp`.
    pub async fn call_message<M, Req, Resp>(&self, method: M, request: &Req) -> Result<Resp>
    where
        M: AsRef<str>,
        Req: Message,
        Resp: Message,
    {
        let body = self.call(method, request.write_to_bytes()?).await?;

        Ok(Resp::parse_from_bytes(&body)?)
    }

    /// Check the server is alive.
    pub async fn ping(&self) -> Result<()> {
        self.call(PING_METHOD, vec![]).await?;

        Ok(())
    }

    /// Close the underlying connection, further calls return [`Error::Shutdown`].
    pub async fn close(&self) -> Result<()> {
        let prev = self
            .state
            .swap(ClientState::Shutdown as u8, Ordering::AcqRel);

        if prev != ClientState::Shutdown as u8 {
            self.conn.lock().await.close().await?;
        }

        Ok(())
    }

    async fn round_trip(&self, request: &Request) -> Result<Response> {
        let mut conn = self.conn.lock().await;

        send_message(&mut *conn, request).await?;

        loop {
            let response: Response = recv_message(&mut *conn, self.options.max_packet_size).await?;

            if response.id == request.id {
                return Ok(response);
            }

            // not an answer to this request.
            log::trace!(
                "skip stale response, id={}, expect={}",
                response.id,
                request.id
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        pin::Pin,
        task::{Context, Poll},
    };

    use std::sync::{
        atomic::{AtomicBool, AtomicUsize},
        Arc,
    };

    use futures::io::Cursor;
    use protobuf::EnumOrUnknown;

    use super::*;

    fn init() {
        static INIT: std::sync::Once = std::sync::Once::new();

        INIT.call_once(|| {
            _ = pretty_env_logger::try_init_timed();
            rasi_mio::timer::register_mio_timer();
        });
    }

    /// Yields the scripted bytes, then never wakes up again.
    struct StallConn {
        data: Cursor<Vec<u8>>,
        writes: Arc<AtomicUsize>,
        closed: Arc<AtomicBool>,
    }

    impl AsyncRead for StallConn {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut [u8],
        ) -> Poll<std::io::Result<usize>> {
            if self.data.position() as usize == self.data.get_ref().len() {
                return Poll::Pending;
            }

            Pin::new(&mut self.data).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for StallConn {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            self.writes.fetch_add(1, Ordering::SeqCst);

            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            self.closed.store(true, Ordering::SeqCst);

            Poll::Ready(Ok(()))
        }
    }

    /// Replays scripted responses, drops every written byte.
    struct ReplayConn(Cursor<Vec<u8>>);

    impl AsyncRead for ReplayConn {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut [u8],
        ) -> Poll<std::io::Result<usize>> {
            Pin::new(&mut self.0).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for ReplayConn {
        fn poll_write(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Poll::Ready(Ok(buf.len()))
        }

        fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }

        fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Poll::Ready(Ok(()))
        }
    }

    async fn replay(responses: &[(u64, Code, &[u8])]) -> ReplayConn {
        let mut buf = Cursor::new(vec![]);

        for (id, code, body) in responses {
            let mut response = Response::new();
            response.id = *id;
            response.code = EnumOrUnknown::new(*code);
            response.body = body.to_vec();

            send_message(&mut buf, &response).await.unwrap();
        }

        buf.set_position(0);

        ReplayConn(buf)
    }

    #[futures_test::test]
    async fn insecure_option_is_required() {
        let conn = replay(&[]).await;

        let err = RpcClient::new(conn, [DialOption::Block]).await.err().unwrap();

        assert!(matches!(err, Error::TransportSecurity));
    }

    #[futures_test::test]
    async fn block_waits_for_ping() {
        let conn = replay(&[(0, Code::OK, b"")]).await;

        let client = RpcClient::new(conn, [DialOption::Insecure, DialOption::Block])
            .await
            .unwrap();

        assert_eq!(client.state(), ClientState::Ready);
    }

    #[futures_test::test]
    async fn lazy_client_stays_idle() {
        let conn = replay(&[]).await;

        let client = RpcClient::new(conn, [DialOption::Insecure]).await.unwrap();

        assert_eq!(client.state(), ClientState::Idle);

        client.close().await.unwrap();
        client.close().await.unwrap();

        assert_eq!(client.state(), ClientState::Shutdown);

        assert!(matches!(
            client.call("/echo", vec![]).await,
            Err(Error::Shutdown)
        ));
    }

    #[futures_test::test]
    async fn skip_stale_responses() {
        let conn = replay(&[(7, Code::OK, b"stale"), (0, Code::OK, b"fresh")]).await;

        let client = RpcClient::new(conn, [DialOption::Insecure]).await.unwrap();

        assert_eq!(client.call("/echo", vec![]).await.unwrap(), b"fresh");
    }

    #[futures_test::test]
    async fn remote_error_code() {
        let conn = replay(&[(0, Code::NOT_FOUND, b"")]).await;

        let client = RpcClient::new(conn, [DialOption::Insecure]).await.unwrap();

        let err = client.call("/missing", vec![]).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Remote {
                code: Code::NOT_FOUND,
                ..
            }
        ));
    }

    #[futures_test::test]
    async fn timeout_mid_frame_shuts_down() {
        init();

        let mut response = Response::new();
        response.id = 0;
        response.body = b"a response that never fully arrives".to_vec();

        let mut buf = Cursor::new(vec![]);

        send_message(&mut buf, &response).await.unwrap();

        // the length prefix and part of the body.
        let mut data = buf.into_inner();
        data.truncate(data.len() / 2);

        let writes = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));

        let conn = StallConn {
            data: Cursor::new(data),
            writes: writes.clone(),
            closed: closed.clone(),
        };

        let client = RpcClient::new(
            conn,
            [
                DialOption::Insecure,
                DialOption::Timeout(Duration::from_millis(100)),
            ],
        )
        .await
        .unwrap();

        assert!(matches!(
            client.call("/echo", vec![]).await,
            Err(Error::Timeout)
        ));

        assert_eq!(client.state(), ClientState::Shutdown);
        assert!(closed.load(Ordering::SeqCst));

        let sent = writes.load(Ordering::SeqCst);

        assert!(matches!(
            client.call("/echo", vec![]).await,
            Err(Error::Shutdown)
        ));

        // the second call never touches the connection.
        assert_eq!(writes.load(Ordering::SeqCst), sent);
    }
}
