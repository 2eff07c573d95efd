//! UDP Connected Socket Module
//!
//! A datagram socket bound to a local interface and pre-connected to one
//! peer, so plain `send`/`recv` replace `sendto`/`recvfrom` and datagrams
//! from other sources are filtered out by the OS.
//!
//! Lifecycle: `open` → open socket → `close`. There is no half-close.

use std::env;
use std::fmt;
use std::net::{IpAddr, Shutdown, SocketAddr};

use log::{debug, trace};

use super::error::{NativeError, RecvError, SendError, UdpOpenError};
use super::socket::{AddressFamily, Socket, SocketType};
use super::subsystem;

/// Environment variable overriding [`UdpConfig::local_interface`]
pub const LOCAL_INTERFACE_ENV: &str = "NET_UDP_LOCAL_INTERFACE";

/// Interface bound by default: the IPv4 loopback literal
pub const DEFAULT_LOCAL_INTERFACE: &str = "127.0.0.1";

/// Configuration for opening a [`UdpConnectedSocket`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpConfig {
    /// Literal address of the local interface to bind
    pub local_interface: String,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            local_interface: DEFAULT_LOCAL_INTERFACE.to_string(),
        }
    }
}

impl UdpConfig {
    /// Configuration from the environment
    ///
    /// Reads `NET_UDP_LOCAL_INTERFACE`, falling back to the loopback literal
    /// when it is unset or empty. The value is validated when a socket is
    /// opened.
    pub fn from_env() -> Self {
        match env::var(LOCAL_INTERFACE_ENV) {
            Ok(value) if !value.trim().is_empty() => Self {
                local_interface: value.trim().to_string(),
            },
            _ => Self::default(),
        }
    }

    /// Set the local interface address
    pub fn with_local_interface(mut self, address: impl Into<String>) -> Self {
        self.local_interface = address.into();
        self
    }
}

/// UDP socket fixed to a single peer
pub struct UdpConnectedSocket {
    socket: Socket,
}

impl UdpConnectedSocket {
    /// Open a socket on the loopback interface, connected to a peer
    ///
    /// # Arguments
    ///
    /// * `local_port` - Local port to bind (`0` lets the OS choose)
    /// * `remote_host` - Literal IPv4/IPv6 address of the peer; hostnames are
    ///   rejected, no resolution is performed
    /// * `remote_port` - Peer port
    ///
    /// # Returns
    ///
    /// * `Ok(UdpConnectedSocket)` - Open socket
    /// * `Err(UdpOpenError)` - Identifies the failing step
    ///
    /// # Examples
    ///
    /// ```rust
    /// use adapters_net::{UdpConnectedSocket, UdpOpenStep};
    ///
    /// let err = UdpConnectedSocket::open(0, "not-an-ip", 9001).unwrap_err();
    /// assert_eq!(err.step(), UdpOpenStep::ParseRemote);
    /// ```
    pub fn open(local_port: u16, remote_host: &str, remote_port: u16) -> Result<Self, UdpOpenError> {
        Self::open_with(&UdpConfig::default(), local_port, remote_host, remote_port)
    }

    /// Open a socket on the interface named by `config`, connected to a peer
    pub fn open_with(
        config: &UdpConfig,
        local_port: u16,
        remote_host: &str,
        remote_port: u16,
    ) -> Result<Self, UdpOpenError> {
        let subsystem = subsystem::acquire()?;

        let local_ip: IpAddr = config
            .local_interface
            .parse()
            .map_err(|source| UdpOpenError::ParseLocal {
                address: config.local_interface.clone(),
                source,
            })?;
        let local = SocketAddr::new(local_ip, local_port);

        let socket = Socket::new(subsystem, AddressFamily::of(&local), SocketType::Datagram)
            .map_err(UdpOpenError::Create)?;

        socket
            .bind(&local)
            .map_err(|source| UdpOpenError::Bind { address: local, source })?;

        let remote_ip: IpAddr = remote_host
            .parse()
            .map_err(|source| UdpOpenError::ParseRemote {
                address: remote_host.to_string(),
                source,
            })?;
        let remote = SocketAddr::new(remote_ip, remote_port);

        socket
            .connect(&remote)
            .map_err(|source| UdpOpenError::ConnectPeer { address: remote, source })?;

        debug!("udp socket {local} connected to {remote}");
        Ok(Self { socket })
    }

    /// Send one datagram to the peer
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of bytes sent
    /// * `Err(SendError)` - Socket error
    pub fn send(&self, data: &[u8]) -> Result<usize, SendError> {
        let sent = self.socket.send(data).map_err(NativeError::from)?;
        trace!("udp sent {sent} bytes");
        Ok(sent)
    }

    /// Receive one datagram from the peer, blocking until it arrives
    ///
    /// A datagram larger than `buffer` is truncated as the OS dictates.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of bytes placed in `buffer`
    /// * `Err(RecvError)` - Socket error
    pub fn receive(&self, buffer: &mut [u8]) -> Result<usize, RecvError> {
        let read = self.socket.recv(buffer).map_err(NativeError::from)?;
        trace!("udp received {read} bytes");
        Ok(read)
    }

    /// Shut down both directions without releasing the socket
    ///
    /// Wakes a `receive` blocked on this socket in another thread; it returns
    /// `Ok(0)` or an error. Further sends fail. A failed shutdown is ignored.
    pub fn shutdown(&self) {
        if let Err(err) = self.socket.shutdown(Shutdown::Both) {
            debug!("udp shutdown ignored: {err}");
        }
    }

    /// Release the socket
    pub fn close(self) {
        debug!("closing udp socket");
    }

    /// Bound local address
    pub fn local_addr(&self) -> Result<SocketAddr, NativeError> {
        self.socket.local_addr()
    }

    /// Fixed peer address
    pub fn peer_addr(&self) -> Result<SocketAddr, NativeError> {
        self.socket.peer_addr()
    }
}

impl fmt::Debug for UdpConnectedSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UdpConnectedSocket")
            .field("local", &self.local_addr().ok())
            .field("peer", &self.peer_addr().ok())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{NativeErrorKind, UdpOpenStep};
    use serial_test::serial;
    use std::net::{Ipv4Addr, UdpSocket};
    use std::thread;

    fn peer() -> (UdpSocket, u16) {
        let peer = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = peer.local_addr().unwrap().port();
        (peer, port)
    }

    #[test]
    fn test_udp_open_and_addresses() {
        let (_peer, peer_port) = peer();
        let socket = UdpConnectedSocket::open(0, "127.0.0.1", peer_port).unwrap();

        let local = socket.local_addr().unwrap();
        assert_eq!(local.ip(), Ipv4Addr::LOCALHOST);
        assert!(local.port() > 0);
        assert_eq!(
            socket.peer_addr().unwrap(),
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), peer_port)
        );
    }

    #[test]
    fn test_udp_send_receive_echo() {
        let (peer, peer_port) = peer();
        let echo = thread::spawn(move || {
            let mut buf = [0u8; 64];
            let (n, from) = peer.recv_from(&mut buf).unwrap();
            peer.send_to(&buf[..n], from).unwrap();
        });

        let socket = UdpConnectedSocket::open(0, "127.0.0.1", peer_port).unwrap();
        assert_eq!(socket.send(b"ping").unwrap(), 4);

        let mut buf = [0u8; 64];
        let n = socket.receive(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"ping");

        socket.close();
        echo.join().unwrap();
    }

    #[test]
    fn test_udp_ignores_datagrams_from_other_sources() {
        let (peer, peer_port) = peer();
        let socket = UdpConnectedSocket::open(0, "127.0.0.1", peer_port).unwrap();
        let local = socket.local_addr().unwrap();

        let stranger = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        stranger.send_to(b"noise", local).unwrap();
        peer.send_to(b"signal", local).unwrap();

        let mut buf = [0u8; 16];
        let n = socket.receive(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"signal");
    }

    #[cfg(unix)]
    #[test]
    fn test_udp_oversized_datagram_is_truncated() {
        let (peer, peer_port) = peer();
        let socket = UdpConnectedSocket::open(0, "127.0.0.1", peer_port).unwrap();

        peer.send_to(b"0123456789", socket.local_addr().unwrap()).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(socket.receive(&mut buf).unwrap(), 4);
        assert_eq!(&buf, b"0123");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_udp_shutdown_wakes_blocked_receive() {
        use std::sync::mpsc;
        use std::sync::Arc;
        use std::time::Duration;

        let (_peer, peer_port) = peer();
        let socket = Arc::new(UdpConnectedSocket::open(0, "127.0.0.1", peer_port).unwrap());

        let (done, finished) = mpsc::channel();
        let receiver = Arc::clone(&socket);
        let blocked = thread::spawn(move || {
            let mut buf = [0u8; 16];
            done.send(receiver.receive(&mut buf)).unwrap();
        });

        thread::sleep(Duration::from_millis(100));
        socket.shutdown();

        let result = finished.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result, Ok(0));
        blocked.join().unwrap();
    }

    #[test]
    fn test_udp_parse_remote_failure() {
        let err = UdpConnectedSocket::open(0, "not-an-ip", 9001).unwrap_err();
        assert_eq!(err.step(), UdpOpenStep::ParseRemote);
        assert_eq!(err.code(), None);
    }

    #[test]
    fn test_udp_hostname_is_not_resolved() {
        let err = UdpConnectedSocket::open(0, "localhost", 9001).unwrap_err();
        assert_eq!(err.step(), UdpOpenStep::ParseRemote);
    }

    #[test]
    fn test_udp_parse_local_failure() {
        let config = UdpConfig::default().with_local_interface("loopback");
        let err = UdpConnectedSocket::open_with(&config, 0, "127.0.0.1", 9001).unwrap_err();
        assert_eq!(err.step(), UdpOpenStep::ParseLocal);
    }

    #[test]
    fn test_udp_bind_failure() {
        let (taken, taken_port) = peer();
        let err = UdpConnectedSocket::open(taken_port, "127.0.0.1", 9001).unwrap_err();
        assert_eq!(err.step(), UdpOpenStep::Bind);
        match err {
            UdpOpenError::Bind { source, .. } => {
                assert_eq!(source.kind(), NativeErrorKind::AddressInUse)
            }
            other => panic!("expected bind failure, got {:?}", other),
        }
        drop(taken);
    }

    #[test]
    fn test_udp_connect_peer_failure() {
        // An IPv4 socket cannot be connected to an IPv6 peer
        let err = UdpConnectedSocket::open(0, "::1", 9001).unwrap_err();
        assert_eq!(err.step(), UdpOpenStep::ConnectPeer);
        assert!(err.code().is_some());
    }

    #[test]
    fn test_udp_config_builder() {
        let config = UdpConfig::default();
        assert_eq!(config.local_interface, DEFAULT_LOCAL_INTERFACE);

        let config = config.with_local_interface("::1");
        assert_eq!(config.local_interface, "::1");
    }

    #[test]
    #[serial]
    fn test_udp_config_from_env() {
        env::remove_var(LOCAL_INTERFACE_ENV);
        assert_eq!(UdpConfig::from_env(), UdpConfig::default());

        env::set_var(LOCAL_INTERFACE_ENV, " 0.0.0.0 ");
        assert_eq!(UdpConfig::from_env().local_interface, "0.0.0.0");

        env::set_var(LOCAL_INTERFACE_ENV, "");
        assert_eq!(UdpConfig::from_env(), UdpConfig::default());

        env::remove_var(LOCAL_INTERFACE_ENV);
    }
}
