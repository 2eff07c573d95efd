//! Adapters Layer: Blocking Socket Handles
//!
//! Provides thin, safe socket handles over the platform socket API, intended
//! as building blocks for higher-level networking and as the implementation
//! behind the C-ABI exports in `api_facades`.
//!
//! ## Overview
//!
//! The `adapters_net` crate provides:
//! - **TCP connections**: resolve, connect (trying candidates in order),
//!   send/receive, half-close and close a stream
//! - **Connected UDP sockets**: bind a local interface, fix a single peer,
//!   send/receive datagrams
//! - **Network subsystem lifecycle**: reference-counted platform startup and
//!   cleanup, with an optional explicit init/teardown pair
//!
//! All calls block the calling thread. There is no retry, framing, timeout, or
//! I/O multiplexing; those belong to the layers built on top.
//!
//! ## Errors
//!
//! Every failed OS call surfaces immediately as a typed error carrying the
//! native error code. The library logs through the `log` facade and never
//! prints.
//!
//! ## See Also
//!
//! - [`api_facades`](../api_facades/index.html): C-ABI exports over these handles

pub mod error;
pub mod subsystem;
pub mod tcp;
pub mod udp;

mod socket;

pub use error::{
    ConnectError, InitError, NativeError, NativeErrorKind, RecvError, ResolutionError, SendError,
    TeardownError, UdpOpenError, UdpOpenStep,
};
pub use socket::AddressFamily;
pub use subsystem::{NativePlatform, Platform, Subsystem, SubsystemGuard};
pub use tcp::{resolve, TcpConnection, TcpState};
pub use udp::{UdpConfig, UdpConnectedSocket};
