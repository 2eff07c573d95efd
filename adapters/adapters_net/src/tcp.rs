//! TCP Connection Module
//!
//! One connected TCP stream. A connection is established by resolving a
//! host/port pair and trying each candidate address in resolver order until
//! one accepts; failed candidates are closed and skipped.
//!
//! Lifecycle: `connect` yields a `Connected` stream, the half-close calls move
//! it to one of the `HalfClosed*` states, and `close` (or drop) releases the
//! socket. The type system makes use after close impossible.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr};
use std::sync::atomic::{AtomicU8, Ordering};

use dns_lookup::{getaddrinfo, AddrInfoHints, SockType};
use log::{debug, trace};

use super::error::{ConnectError, NativeError, RecvError, ResolutionError, SendError};
use super::socket::{AddressFamily, Socket, SocketType};
use super::subsystem;

const SEND_SHUT: u8 = 0b01;
const RECV_SHUT: u8 = 0b10;

/// Direction state of a [`TcpConnection`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    /// Both directions open
    Connected,
    /// Send side shut down; receiving still possible
    HalfClosedSend,
    /// Receive side shut down; sending still possible
    HalfClosedReceive,
    /// Both directions shut down; the handle is still owned
    HalfClosedBoth,
}

/// Resolve `host:port` into candidate addresses, in resolver order
///
/// # Arguments
///
/// * `host` - Hostname or literal IPv4/IPv6 address
/// * `port` - Port number
///
/// # Returns
///
/// * `Ok(Vec<SocketAddr>)` - At least one candidate
/// * `Err(ResolutionError)` - Lookup failed or produced nothing
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>, ResolutionError> {
    let lookup_failed = |source: NativeError| ResolutionError::Lookup {
        host: host.to_string(),
        port,
        source,
    };

    if host.contains('\0') {
        let err = io::Error::new(io::ErrorKind::InvalidInput, "host name contains a NUL byte");
        return Err(lookup_failed(err.into()));
    }

    let hints = AddrInfoHints {
        socktype: SockType::Stream.into(),
        ..AddrInfoHints::default()
    };
    let service = port.to_string();
    let candidates = getaddrinfo(Some(host), Some(&service), Some(hints))
        .map_err(|err| lookup_failed(err.into()))?
        .map(|info| info.map(|info| info.sockaddr))
        .collect::<io::Result<Vec<SocketAddr>>>()
        .map_err(|err| lookup_failed(err.into()))?;

    if candidates.is_empty() {
        return Err(ResolutionError::NoAddresses {
            host: host.to_string(),
            port,
        });
    }
    debug!("{host}:{port} resolved to {} candidate(s)", candidates.len());
    Ok(candidates)
}

/// Connected TCP stream
///
/// `send`, `receive` and the half-close calls take `&self`, so one thread may
/// send while another receives on the same connection.
///
/// # Hazards
///
/// There is no timeout on `receive` or `send`. Closing from another thread
/// is not a way to unblock a call in flight: `close` consumes the connection,
/// so it cannot race an outstanding borrow.
pub struct TcpConnection {
    socket: Socket,
    shutdown: AtomicU8,
}

impl TcpConnection {
    /// Connect to `host:port`
    ///
    /// Candidates are tried in resolver order; the first to accept wins.
    ///
    /// # Arguments
    ///
    /// * `host` - Hostname or literal IPv4/IPv6 address
    /// * `port` - Port number
    ///
    /// # Returns
    ///
    /// * `Ok(TcpConnection)` - Live, exclusively owned connection
    /// * `Err(ConnectError)` - Subsystem unavailable, resolution failed, or
    ///   no candidate accepted (carrying the last native error)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adapters_net::TcpConnection;
    /// use std::net::TcpListener;
    ///
    /// let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    /// let port = listener.local_addr().unwrap().port();
    ///
    /// let conn = TcpConnection::connect("127.0.0.1", port).unwrap();
    /// assert_eq!(conn.peer_addr().unwrap().port(), port);
    /// conn.close();
    /// ```
    pub fn connect(host: &str, port: u16) -> Result<Self, ConnectError> {
        // Hold the subsystem across resolution; lookups need it on Windows.
        let _subsystem = subsystem::acquire()?;
        let candidates = resolve(host, port)?;
        Self::connect_candidates(host, port, candidates)
    }

    fn connect_candidates(
        host: &str,
        port: u16,
        candidates: Vec<SocketAddr>,
    ) -> Result<Self, ConnectError> {
        let mut attempts = 0;
        let mut last: Option<NativeError> = None;

        for addr in candidates {
            attempts += 1;
            let socket = match Socket::new(
                subsystem::acquire()?,
                AddressFamily::of(&addr),
                SocketType::Stream,
            ) {
                Ok(socket) => socket,
                Err(err) => {
                    debug!("skipping candidate {addr}: socket creation failed: {err}");
                    last = Some(err);
                    continue;
                }
            };

            match socket.connect(&addr) {
                Ok(()) => {
                    debug!("connected to {addr} ({host}:{port}, attempt {attempts})");
                    return Ok(Self {
                        socket,
                        shutdown: AtomicU8::new(0),
                    });
                }
                Err(err) => {
                    debug!("candidate {addr} for {host}:{port} failed: {err}");
                    last = Some(err);
                }
            }
        }

        match last {
            Some(last) => Err(ConnectError::Unreachable {
                host: host.to_string(),
                port,
                attempts,
                last,
            }),
            None => Err(ResolutionError::NoAddresses {
                host: host.to_string(),
                port,
            }
            .into()),
        }
    }

    /// Send up to `data.len()` bytes
    ///
    /// Issues a single send; the OS may accept fewer bytes than offered and
    /// the caller resends the remainder. Use [`Write::write_all`] to loop.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of bytes accepted by the OS
    /// * `Err(SendError)` - Socket error, not retried
    pub fn send(&self, data: &[u8]) -> Result<usize, SendError> {
        let sent = self.socket.send(data).map_err(NativeError::from)?;
        trace!("tcp sent {sent}/{} bytes", data.len());
        Ok(sent)
    }

    /// Receive up to `buffer.len()` bytes, blocking until data arrives
    ///
    /// # Returns
    ///
    /// * `Ok(0)` - The peer shut down its send side (end of stream)
    /// * `Ok(usize)` - Number of bytes read
    /// * `Err(RecvError)` - Socket error
    pub fn receive(&self, buffer: &mut [u8]) -> Result<usize, RecvError> {
        let read = self.socket.recv(buffer).map_err(NativeError::from)?;
        trace!("tcp received {read} bytes");
        Ok(read)
    }

    /// Shut down the send side; the peer sees end of stream
    pub fn half_close_send(&self) {
        self.shutdown(Shutdown::Write, SEND_SHUT);
    }

    /// Shut down the receive side
    pub fn half_close_receive(&self) {
        self.shutdown(Shutdown::Read, RECV_SHUT);
    }

    /// Shut down both directions without releasing the socket
    pub fn half_close_both(&self) {
        self.shutdown(Shutdown::Both, SEND_SHUT | RECV_SHUT);
    }

    fn shutdown(&self, how: Shutdown, bits: u8) {
        // Shutting down an already-closed direction is not actionable.
        if let Err(err) = self.socket.shutdown(how) {
            debug!("tcp shutdown({how:?}) ignored: {err}");
        }
        self.shutdown.fetch_or(bits, Ordering::AcqRel);
    }

    /// Current direction state
    pub fn state(&self) -> TcpState {
        match self.shutdown.load(Ordering::Acquire) {
            0 => TcpState::Connected,
            SEND_SHUT => TcpState::HalfClosedSend,
            RECV_SHUT => TcpState::HalfClosedReceive,
            _ => TcpState::HalfClosedBoth,
        }
    }

    /// Release the socket
    pub fn close(self) {
        debug!("closing tcp connection");
    }

    /// Local address of the connection
    pub fn local_addr(&self) -> Result<SocketAddr, NativeError> {
        self.socket.local_addr()
    }

    /// Address of the connected peer
    pub fn peer_addr(&self) -> Result<SocketAddr, NativeError> {
        self.socket.peer_addr()
    }

    /// Address family of the candidate that accepted
    pub fn family(&self) -> AddressFamily {
        self.socket.family()
    }
}

impl fmt::Debug for TcpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpConnection")
            .field("local", &self.local_addr().ok())
            .field("peer", &self.peer_addr().ok())
            .field("state", &self.state())
            .finish()
    }
}

impl Read for &TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf)
    }
}

impl Write for &TcpConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.socket.send(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for TcpConnection {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for TcpConnection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
