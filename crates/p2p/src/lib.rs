//! Bridges the [`xstack-rpc`](xstack_rpc) framework onto libp2p protocol streams.
//!
//! An [`RpcProtocol`] attaches to one [`Host`], registers any number of rpc service protocols
//! (`<base>` or `<base>/<suffix>`), and exposes the inbound streams of all of them as one
//! [`P2pListener`]. Outbound, [`RpcProtocol::dial`] opens a stream to a remote peer and wraps it
//! into a [`RpcClient`](xstack_rpc::RpcClient).
//!
//! Two host drivers are provided:
//!
//! * [`xstack::Switch`]: the real libp2p switch.
//! * [`MemoryHost`]: in-process peers created by one [`MemoryNetwork`].
//!
//! Other hosts can be plugged in by implementing the traits of [`host_syscall`].

mod errors;
pub use errors::*;

mod protocol;
pub use protocol::*;

mod lifecycle;
pub use lifecycle::*;

mod host;
pub use host::*;

mod switch;

mod addr;
pub use addr::*;

mod conn;
pub use conn::*;

mod router;
pub use router::*;

mod listener;
pub use listener::*;

mod memory;
pub use memory::*;
