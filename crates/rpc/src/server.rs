use std::{collections::HashMap, future::Future, sync::Arc};

use futures::{future::BoxFuture, AsyncRead, AsyncWrite, AsyncWriteExt, FutureExt};
use protobuf::{EnumOrUnknown, Message};
use rasi::task::spawn_ok;

use crate::{
    frame::{recv_message, send_message, DEFAULT_MAX_PACKET_SIZE},
    proto::rpc::{Code, Request, Response},
    Result, RpcListener,
};

/// Method name of the built-in liveness check, answered with an empty body.
pub const PING_METHOD: &str = "/xstack/rpc/ping";

type MethodHandler = Arc<dyn Fn(Vec<u8>) -> BoxFuture<'static, Result<Vec<u8>>> + Send + Sync>;

/// A rpc server that dispatches inbound requests to registered methods.
///
/// ```no_run
/// use xstack_rpc::RpcServer;
///
/// let server = RpcServer::new().method("/echo", |body: Vec<u8>| async move {
///     Ok::<_, xstack_rpc::Error>(body)
/// });
/// ```
#[derive(Clone)]
pub struct RpcServer {
    methods: HashMap<String, MethodHandler>,
    max_packet_size: usize,
}

impl Default for RpcServer {
    fn default() -> Self {
        Self {
            methods: Default::default(),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

impl RpcServer {
    /// Create a server without any registered method.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum length of one inbound request frame.
    pub fn max_packet_size(mut self, value: usize) -> Self {
        self.max_packet_size = value;
        self
    }

    /// Register a raw method handler, the body in and out are opaque bytes.
    pub fn method<N, F, Fut>(mut self, name: N, f: F) -> Self
    where
        N: AsRef<str>,
        F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<u8>>> + Send + 'static,
    {
        self.methods
            .insert(name.as_ref().to_owned(), Arc::new(move |body| f(body).boxed()));

        self
    }

    /// Register a method handler whose request and response are protobuf [`Message`]s.
    pub fn message_method<N, Req, Resp, F, Fut>(self, name: N, f: F) -> Self
    where
        N: AsRef<str>,
        Req: Message,
        Resp: Message,
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp>> + Send + 'static,
    {
        let f = Arc::new(f);

        self.method(name, move |body: Vec<u8>| {
            let f = f.clone();

            async move {
                let request = Req::parse_from_bytes(&body)?;

                let response = f(request).await?;

                Ok::<_, crate::Error>(response.write_to_bytes()?)
            }
        })
    }

    /// Returns the names of registered methods.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(|name| name.as_str())
    }

    /// Accept inbound connections on `listener` and serve each one on its own task.
    ///
    /// This function only returns when `accept` fails, e.g. with [`Error::ListenerClosed`](crate::Error::ListenerClosed)
    /// after the listener is closed.
    pub async fn serve<L>(&self, listener: L) -> Result<()>
    where
        L: RpcListener,
    {
        let this = Arc::new(self.clone());

        log::info!("rpc server start, laddr={}", listener.local_addr().await);

        loop {
            let conn = match listener.accept().await {
                Ok(conn) => conn,
                Err(err) => {
                    log::info!("rpc server stop, err={}", err);
                    return Err(err);
                }
            };

            let this = this.clone();

            spawn_ok(async move {
                if let Err(err) = this.serve_conn(conn).await {
                    log::error!("rpc connection stopped, err={}", err);
                } else {
                    log::trace!("rpc connection closed");
                }
            });
        }
    }

    /// Serve requests on one connection sequentially, until the peer closes the write side.
    pub async fn serve_conn<C>(&self, mut conn: C) -> Result<()>
    where
        C: AsyncRead + AsyncWrite + Unpin,
    {
        loop {
            let request: Request = match recv_message(&mut conn, self.max_packet_size).await {
                Ok(request) => request,
                Err(err) if err.is_eof() => break,
                Err(err) => return Err(err),
            };

            log::trace!("rpc request, id={}, method={}", request.id, request.method);

            let response = self.dispatch(request).await;

            send_message(&mut conn, &response).await?;
        }

        conn.close().await?;

        Ok(())
    }

    async fn dispatch(&self, request: Request) -> Response {
        let mut response = Response::new();

        response.id = request.id;

        match self.methods.get(&request.method) {
            Some(handler) => match handler(request.body).await {
                Ok(body) => {
                    response.code = EnumOrUnknown::new(Code::OK);
                    response.body = body;
                }
                Err(err) => {
                    log::trace!("rpc method {} failed, err={}", request.method, err);
                    response.code = EnumOrUnknown::new(Code::INTERNAL);
                    response.message = err.to_string();
                }
            },
            None if request.method == PING_METHOD => {
                response.code = EnumOrUnknown::new(Code::OK);
            }
            None => {
                response.code = EnumOrUnknown::new(Code::NOT_FOUND);
                response.message = format!("method not found: {}", request.method);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::VecDeque,
        net::SocketAddr,
        pin::Pin,
        task::{Context, Poll},
    };

    use async_trait::async_trait;
    use futures::{io::Cursor, lock::Mutex};

    use crate::Error;

    use super::*;

    /// Reads scripted input, collects everything written.
    struct ScriptConn {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl AsyncRead for ScriptConn {
        fn poll_read(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &mut [u8],
        ) -> Poll<std::io::Result<usize>> {
            Pin::new(&mut self.input).poll_read(cx, buf)
        }
    }

    impl AsyncWrite for ScriptConn {
        fn poll_write(
            mut self: Pin<&mut Self>,
            cx: &mut Context<'_>,
            buf: &[u8],
        ) -> Poll<std::io::Result<usize>> {
            Pin::new(&mut self.output).poll_write(cx, buf)
        }

        fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.output).poll_flush(cx)
        }

        fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
            Pin::new(&mut self.output).poll_close(cx)
        }
    }

    async fn script(requests: &[(&str, &[u8])]) -> ScriptConn {
        let mut input = Cursor::new(vec![]);

        for (id, (method, body)) in requests.iter().enumerate() {
            let mut request = Request::new();
            request.id = id as u64;
            request.method = method.to_string();
            request.body = body.to_vec();

            send_message(&mut input, &request).await.unwrap();
        }

        input.set_position(0);

        ScriptConn {
            input,
            output: vec![],
        }
    }

    async fn responses(output: Vec<u8>) -> Vec<Response> {
        let mut output = Cursor::new(output);

        let mut responses = vec![];

        loop {
            match recv_message::<_, Response>(&mut output, DEFAULT_MAX_PACKET_SIZE).await {
                Ok(response) => responses.push(response),
                Err(err) if err.is_eof() => return responses,
                Err(err) => panic!("{}", err),
            }
        }
    }

    fn echo_server() -> RpcServer {
        RpcServer::new()
            .method("/echo", |body: Vec<u8>| async move { Ok::<_, Error>(body) })
            .method("/fail", |_: Vec<u8>| async move {
                Err::<Vec<u8>, _>(Error::Handler("boom".to_owned()))
            })
    }

    #[futures_test::test]
    async fn dispatch_by_method_name() {
        let mut conn = script(&[
            ("/echo", b"hello"),
            ("/missing", b""),
            ("/fail", b""),
            (PING_METHOD, b""),
        ])
        .await;

        echo_server().serve_conn(&mut conn).await.unwrap();

        let responses = responses(conn.output).await;

        assert_eq!(responses.len(), 4);

        assert_eq!(responses[0].id, 0);
        assert_eq!(responses[0].code.enum_value(), Ok(Code::OK));
        assert_eq!(responses[0].body, b"hello");

        assert_eq!(responses[1].code.enum_value(), Ok(Code::NOT_FOUND));
        assert_eq!(responses[1].message, "method not found: /missing");

        assert_eq!(responses[2].code.enum_value(), Ok(Code::INTERNAL));
        assert_eq!(responses[2].message, "boom");

        assert_eq!(responses[3].id, 3);
        assert_eq!(responses[3].code.enum_value(), Ok(Code::OK));
        assert!(responses[3].body.is_empty());
    }

    #[futures_test::test]
    async fn message_method_decodes_request() {
        let server = RpcServer::new().message_method("/reverse", |request: Request| async move {
            let mut response = Response::new();
            response.body = request.body.into_iter().rev().collect();
            Ok::<_, Error>(response)
        });

        let mut inner = Request::new();
        inner.body = b"abc".to_vec();

        let body = inner.write_to_bytes().unwrap();

        let mut conn = script(&[("/reverse", &body)]).await;

        server.serve_conn(&mut conn).await.unwrap();

        let responses = responses(conn.output).await;

        let reversed = Response::parse_from_bytes(&responses[0].body).unwrap();

        assert_eq!(reversed.body, b"cba");
    }

    struct ScriptListener(Mutex<VecDeque<ScriptConn>>);

    #[async_trait]
    impl RpcListener for ScriptListener {
        type Conn = ScriptConn;

        async fn accept(&self) -> Result<Self::Conn> {
            self.0.lock().await.pop_front().ok_or(Error::ListenerClosed)
        }

        async fn local_addr(&self) -> SocketAddr {
            "127.0.0.1:0".parse().unwrap()
        }

        async fn close(&self) -> Result<()> {
            self.0.lock().await.clear();
            Ok(())
        }
    }

    #[futures_test::test]
    async fn serve_returns_when_listener_closed() {
        let conns = vec![script(&[("/echo", b"1")]).await, script(&[]).await];

        let listener = ScriptListener(Mutex::new(conns.into()));

        let err = echo_server().serve(listener).await.unwrap_err();

        assert!(matches!(err, Error::ListenerClosed));
    }
}
