//! API Facades Layer
//!
//! C-ABI exports over the socket handles in `adapters_net`, for hosts that
//! load the library as a `cdylib`. Every export keeps a C signature:
//! sockets are named by integer handles, failures by integer status codes.
//!
//! ## Conventions
//!
//! - Handles are registry ids starting at `1`; `0` is never valid and a
//!   closed handle is never handed out again.
//! - Functions returning `i32` status return `0` on success. Byte-count
//!   functions return `-1` on failure.
//! - Every call records its status, and the native error code when there is
//!   one, for the calling thread; read them with `net_last_status` and
//!   `net_last_os_error`.
//!
//! ## See Also
//!
//! - [`adapters_net`](../adapters_net/index.html): the safe Rust API behind these exports

mod args;
mod registry;

pub mod net_facades;
pub mod status;
pub mod tcp_facades;
pub mod udp_facades;

pub use net_facades::*;
pub use status::NetStatus;
pub use tcp_facades::*;
pub use udp_facades::*;
