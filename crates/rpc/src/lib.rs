//! A minimal request/response rpc framework that runs over any [`AsyncRead`](futures::AsyncRead) +
//! [`AsyncWrite`](futures::AsyncWrite) connection.
//!
//! The framework knows nothing about where connections come from: a server consumes a [`RpcListener`],
//! a client session is bound to one already established connection.
//!
//! ```no_run
//! use xstack_rpc::{DialOption, RpcClient, RpcListener, RpcServer};
//!
//! # async fn serve<L: RpcListener>(listener: L) {
//! RpcServer::new()
//!     .method("/echo", |body: Vec<u8>| async move { Ok::<_, xstack_rpc::Error>(body) })
//!     .serve(listener)
//!     .await
//!     .unwrap();
//! # }
//!
//! # async fn call<C>(conn: C)
//! # where C: futures::AsyncRead + futures::AsyncWrite + Unpin + Send {
//! let client = RpcClient::new(conn, [DialOption::Insecure]).await.unwrap();
//!
//! let reply = client.call("/echo", b"hello".to_vec()).await.unwrap();
//! # }
//! ```
//!
//! On the wire every request and response is one unsigned-varint length-prefixed protobuf message.

#[allow(renamed_and_removed_lints)]
mod proto;

pub use proto::rpc::Code;

mod errors;
pub use errors::*;

pub mod frame;

mod listener;
pub use listener::*;

mod server;
pub use server::*;

mod client;
pub use client::*;
