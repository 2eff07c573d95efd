//! Socket Module
//!
//! Owning wrapper around one OS socket. The descriptor is closed exactly once,
//! when the wrapper drops, and never leaves the crate. Every socket holds a
//! reference to the network subsystem so the platform layer outlives it.
//!
//! Sockets are left in blocking mode: `recv` suspends the calling thread until
//! data, end of stream, or an error arrives, and `send` may block while the OS
//! send buffer is full.

use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr};
use std::os::raw::c_int;

use socket2::{Domain, Protocol as Socket2Protocol, SockAddr, Socket as Socket2, Type};

use crate::error::NativeError;
use crate::subsystem::SubsystemGuard;

/// Suppresses SIGPIPE when sending on a stream whose write side is gone.
#[cfg(any(target_os = "linux", target_os = "android"))]
const SEND_FLAGS: c_int = libc::MSG_NOSIGNAL;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const SEND_FLAGS: c_int = 0;

/// Address family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressFamily {
    /// IPv4
    Ipv4,
    /// IPv6
    Ipv6,
}

impl AddressFamily {
    /// Family of an address
    pub fn of(addr: &SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(_) => AddressFamily::Ipv4,
            SocketAddr::V6(_) => AddressFamily::Ipv6,
        }
    }
}

impl From<AddressFamily> for Domain {
    fn from(family: AddressFamily) -> Self {
        match family {
            AddressFamily::Ipv4 => Domain::IPV4,
            AddressFamily::Ipv6 => Domain::IPV6,
        }
    }
}

/// Socket type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SocketType {
    /// Stream socket (TCP)
    Stream,
    /// Datagram socket (UDP)
    Datagram,
}

impl SocketType {
    fn protocol(self) -> Socket2Protocol {
        match self {
            SocketType::Stream => Socket2Protocol::TCP,
            SocketType::Datagram => Socket2Protocol::UDP,
        }
    }
}

impl From<SocketType> for Type {
    fn from(ty: SocketType) -> Self {
        match ty {
            SocketType::Stream => Type::STREAM,
            SocketType::Datagram => Type::DGRAM,
        }
    }
}

/// Owned OS socket
///
/// Field order matters: the descriptor is closed before the subsystem
/// reference is released.
pub(crate) struct Socket {
    inner: Socket2,
    family: AddressFamily,
    _subsystem: SubsystemGuard<'static>,
}

impl Socket {
    /// Create a new blocking socket
    ///
    /// # Arguments
    ///
    /// * `subsystem` - Subsystem reference kept alive for the socket's lifetime
    /// * `family` - Address family (IPv4 or IPv6)
    /// * `socket_type` - Socket type (Stream or Datagram)
    ///
    /// # Returns
    ///
    /// * `Ok(Socket)` - Created socket
    /// * `Err(NativeError)` - Error creating socket
    pub(crate) fn new(
        subsystem: SubsystemGuard<'static>,
        family: AddressFamily,
        socket_type: SocketType,
    ) -> Result<Self, NativeError> {
        let inner = Socket2::new(family.into(), socket_type.into(), Some(socket_type.protocol()))?;

        #[cfg(any(target_os = "macos", target_os = "ios", target_os = "tvos", target_os = "watchos"))]
        inner.set_nosigpipe(true)?;

        Ok(Self {
            inner,
            family,
            _subsystem: subsystem,
        })
    }

    pub(crate) fn bind(&self, addr: &SocketAddr) -> Result<(), NativeError> {
        self.inner.bind(&SockAddr::from(*addr))?;
        Ok(())
    }

    pub(crate) fn connect(&self, addr: &SocketAddr) -> Result<(), NativeError> {
        self.inner.connect(&SockAddr::from(*addr))?;
        Ok(())
    }

    /// Single `send` call; may accept fewer bytes than offered
    pub(crate) fn send(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.send_with_flags(buf, SEND_FLAGS)
    }

    /// Single `recv` call; `Ok(0)` is end of stream on a stream socket
    pub(crate) fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        (&self.inner).read(buf)
    }

    pub(crate) fn shutdown(&self, how: Shutdown) -> Result<(), NativeError> {
        self.inner.shutdown(how)?;
        Ok(())
    }

    pub(crate) fn local_addr(&self) -> Result<SocketAddr, NativeError> {
        socket_addr(self.inner.local_addr()?)
    }

    pub(crate) fn peer_addr(&self) -> Result<SocketAddr, NativeError> {
        socket_addr(self.inner.peer_addr()?)
    }

    pub(crate) fn family(&self) -> AddressFamily {
        self.family
    }
}

fn socket_addr(addr: SockAddr) -> Result<SocketAddr, NativeError> {
    addr.as_socket().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "not an IP socket address").into()
    })
}
