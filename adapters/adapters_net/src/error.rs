//! Error Module
//!
//! Structured errors for every socket operation. Each OS-call failure is
//! converted into a [`NativeError`] at the point it happens, carrying the raw
//! OS code and a classification, and then wrapped in the error type of the
//! operation that failed.

use std::fmt;
use std::io;
use std::net::{AddrParseError, SocketAddr};

use dns_lookup::LookupError;

/// Classification of a native socket failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeErrorKind {
    /// Address already in use
    AddressInUse,
    /// Address not available on this host
    AddressNotAvailable,
    /// Connection refused
    ConnectionRefused,
    /// Connection reset
    ConnectionReset,
    /// Connection aborted
    ConnectionAborted,
    /// Socket is not connected
    NotConnected,
    /// Writing to a stream whose send side is shut down
    BrokenPipe,
    /// Network unreachable
    NetworkUnreachable,
    /// Host unreachable
    HostUnreachable,
    /// Timeout
    TimedOut,
    /// Would block (non-blocking operation)
    WouldBlock,
    /// Interrupted by a signal
    Interrupted,
    /// Invalid argument
    InvalidInput,
    /// Permission denied
    PermissionDenied,
    /// The resolver could not map a host name to addresses
    NameResolution,
    /// Other error
    Other,
}

impl NativeErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            NativeErrorKind::AddressInUse => "address in use",
            NativeErrorKind::AddressNotAvailable => "address not available",
            NativeErrorKind::ConnectionRefused => "connection refused",
            NativeErrorKind::ConnectionReset => "connection reset",
            NativeErrorKind::ConnectionAborted => "connection aborted",
            NativeErrorKind::NotConnected => "not connected",
            NativeErrorKind::BrokenPipe => "broken pipe",
            NativeErrorKind::NetworkUnreachable => "network unreachable",
            NativeErrorKind::HostUnreachable => "host unreachable",
            NativeErrorKind::TimedOut => "timed out",
            NativeErrorKind::WouldBlock => "operation would block",
            NativeErrorKind::Interrupted => "interrupted",
            NativeErrorKind::InvalidInput => "invalid input",
            NativeErrorKind::PermissionDenied => "permission denied",
            NativeErrorKind::NameResolution => "name resolution failed",
            NativeErrorKind::Other => "other error",
        }
    }
}

impl fmt::Display for NativeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<io::ErrorKind> for NativeErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        use std::io::ErrorKind;
        match kind {
            ErrorKind::AddrInUse => NativeErrorKind::AddressInUse,
            ErrorKind::AddrNotAvailable => NativeErrorKind::AddressNotAvailable,
            ErrorKind::ConnectionRefused => NativeErrorKind::ConnectionRefused,
            ErrorKind::ConnectionReset => NativeErrorKind::ConnectionReset,
            ErrorKind::ConnectionAborted => NativeErrorKind::ConnectionAborted,
            ErrorKind::NotConnected => NativeErrorKind::NotConnected,
            ErrorKind::BrokenPipe => NativeErrorKind::BrokenPipe,
            ErrorKind::NetworkUnreachable => NativeErrorKind::NetworkUnreachable,
            ErrorKind::HostUnreachable => NativeErrorKind::HostUnreachable,
            ErrorKind::TimedOut => NativeErrorKind::TimedOut,
            ErrorKind::WouldBlock => NativeErrorKind::WouldBlock,
            ErrorKind::Interrupted => NativeErrorKind::Interrupted,
            ErrorKind::InvalidInput => NativeErrorKind::InvalidInput,
            ErrorKind::PermissionDenied => NativeErrorKind::PermissionDenied,
            _ => NativeErrorKind::Other,
        }
    }
}

/// A failed OS socket call
///
/// Keeps the raw OS code (`errno` on Unix, `WSAGetLastError` on Windows, the
/// `getaddrinfo` result for lookups) when the OS supplied one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct NativeError {
    kind: NativeErrorKind,
    code: Option<i32>,
    message: String,
}

impl NativeError {
    /// Classification of the failure
    pub fn kind(&self) -> NativeErrorKind {
        self.kind
    }

    /// Raw OS error code, if the failure came from the OS
    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<io::Error> for NativeError {
    fn from(err: io::Error) -> Self {
        Self {
            kind: err.kind().into(),
            code: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

impl From<LookupError> for NativeError {
    fn from(err: LookupError) -> Self {
        // Zero means the failure did not come from getaddrinfo itself
        let code = match err.error_num() {
            0 => None,
            code => Some(code),
        };
        Self {
            kind: NativeErrorKind::NameResolution,
            code,
            message: io::Error::from(err).to_string(),
        }
    }
}

/// Errors starting the network subsystem
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// The platform networking layer refused to start
    #[error("network subsystem failed to start (os error {code})")]
    Startup {
        /// Code returned by the platform startup call
        code: i32,
    },
    /// `init` was called while an explicit initialization is still active
    #[error("network subsystem is already initialized")]
    AlreadyInitialized,
    /// The subsystem was explicitly torn down and cannot be used again
    #[error("network subsystem has been torn down")]
    TornDown,
}

/// Errors tearing down the network subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TeardownError {
    /// `teardown` was called without a matching `init`
    #[error("network subsystem is not initialized")]
    NotInitialized,
}

/// Errors resolving a host/port pair into candidate addresses
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// The resolver rejected the lookup
    #[error("failed to resolve {host}:{port}: {source}")]
    Lookup {
        /// Host name as given by the caller
        host: String,
        /// Port as given by the caller
        port: u16,
        /// Resolver failure, with the `getaddrinfo` code when there is one
        source: NativeError,
    },
    /// The resolver succeeded but returned nothing to connect to
    #[error("{host}:{port} resolved to no addresses")]
    NoAddresses {
        /// Host name as given by the caller
        host: String,
        /// Port as given by the caller
        port: u16,
    },
}

/// Errors establishing a TCP connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// The network subsystem could not be acquired
    #[error(transparent)]
    Subsystem(#[from] InitError),
    /// The host/port pair did not resolve
    #[error(transparent)]
    Resolution(#[from] ResolutionError),
    /// Every candidate address failed
    #[error("no address for {host}:{port} accepted a connection after {attempts} attempt(s): {last}")]
    Unreachable {
        /// Host name as given by the caller
        host: String,
        /// Port as given by the caller
        port: u16,
        /// Number of candidates tried
        attempts: usize,
        /// Failure observed on the last candidate
        #[source]
        last: NativeError,
    },
}

impl ConnectError {
    /// Native OS code of the failure, if any
    pub fn code(&self) -> Option<i32> {
        match self {
            ConnectError::Subsystem(InitError::Startup { code }) => Some(*code),
            ConnectError::Subsystem(_) => None,
            ConnectError::Resolution(ResolutionError::Lookup { source, .. }) => source.code(),
            ConnectError::Resolution(ResolutionError::NoAddresses { .. }) => None,
            ConnectError::Unreachable { last, .. } => last.code(),
        }
    }
}

/// The step of opening a connected UDP socket that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UdpOpenStep {
    /// Acquiring the network subsystem, before any socket exists
    Subsystem,
    /// Parsing the configured local interface address
    ParseLocal,
    /// Creating the datagram socket
    Create,
    /// Binding to the local address
    Bind,
    /// Parsing the remote peer address
    ParseRemote,
    /// Fixing the remote peer with `connect`
    ConnectPeer,
}

/// Errors opening a connected UDP socket
///
/// Each variant identifies the step that failed; see [`UdpOpenError::step`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UdpOpenError {
    /// The network subsystem could not be acquired
    #[error(transparent)]
    Subsystem(#[from] InitError),
    /// The configured local interface is not a literal address
    #[error("invalid local interface address {address:?}: {source}")]
    ParseLocal {
        /// Configured interface text
        address: String,
        /// Parser failure
        source: AddrParseError,
    },
    /// The OS refused to create the socket
    #[error("failed to create datagram socket: {0}")]
    Create(#[source] NativeError),
    /// The local address could not be bound
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Local address and port
        address: SocketAddr,
        /// OS failure
        source: NativeError,
    },
    /// The remote host is not a literal address
    #[error("invalid remote address {address:?}: {source}")]
    ParseRemote {
        /// Remote host text as given by the caller
        address: String,
        /// Parser failure
        source: AddrParseError,
    },
    /// The OS refused to fix the peer
    #[error("failed to connect to peer {address}: {source}")]
    ConnectPeer {
        /// Peer address and port
        address: SocketAddr,
        /// OS failure
        source: NativeError,
    },
}

impl UdpOpenError {
    /// The step that failed
    pub fn step(&self) -> UdpOpenStep {
        match self {
            UdpOpenError::Subsystem(_) => UdpOpenStep::Subsystem,
            UdpOpenError::ParseLocal { .. } => UdpOpenStep::ParseLocal,
            UdpOpenError::Create(_) => UdpOpenStep::Create,
            UdpOpenError::Bind { .. } => UdpOpenStep::Bind,
            UdpOpenError::ParseRemote { .. } => UdpOpenStep::ParseRemote,
            UdpOpenError::ConnectPeer { .. } => UdpOpenStep::ConnectPeer,
        }
    }

    /// Native OS code of the failure, if the failing step was an OS call
    pub fn code(&self) -> Option<i32> {
        match self {
            UdpOpenError::Subsystem(InitError::Startup { code }) => Some(*code),
            UdpOpenError::Create(source)
            | UdpOpenError::Bind { source, .. }
            | UdpOpenError::ConnectPeer { source, .. } => source.code(),
            _ => None,
        }
    }
}

/// A failed send
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("send failed: {0}")]
pub struct SendError(#[from] pub NativeError);

impl SendError {
    /// Classification of the underlying OS failure
    pub fn kind(&self) -> NativeErrorKind {
        self.0.kind()
    }

    /// Raw OS error code, if any
    pub fn code(&self) -> Option<i32> {
        self.0.code()
    }
}

/// A failed receive
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("receive failed: {0}")]
pub struct RecvError(#[from] pub NativeError);

impl RecvError {
    /// Classification of the underlying OS failure
    pub fn kind(&self) -> NativeErrorKind {
        self.0.kind()
    }

    /// Raw OS error code, if any
    pub fn code(&self) -> Option<i32> {
        self.0.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_from_io_error() {
        let cases = [
            (io::ErrorKind::AddrInUse, NativeErrorKind::AddressInUse),
            (io::ErrorKind::ConnectionRefused, NativeErrorKind::ConnectionRefused),
            (io::ErrorKind::ConnectionReset, NativeErrorKind::ConnectionReset),
            (io::ErrorKind::ConnectionAborted, NativeErrorKind::ConnectionAborted),
            (io::ErrorKind::BrokenPipe, NativeErrorKind::BrokenPipe),
            (io::ErrorKind::TimedOut, NativeErrorKind::TimedOut),
            (io::ErrorKind::WouldBlock, NativeErrorKind::WouldBlock),
            (io::ErrorKind::Other, NativeErrorKind::Other),
            (io::ErrorKind::UnexpectedEof, NativeErrorKind::Other),
        ];

        for (io_kind, expected) in cases {
            let native = NativeError::from(io::Error::from(io_kind));
            assert_eq!(native.kind(), expected, "mapping of {:?}", io_kind);
            assert_eq!(native.code(), None);
        }
    }

    #[test]
    fn test_native_error_keeps_os_code() {
        #[cfg(unix)]
        let code = libc::ECONNREFUSED;
        #[cfg(windows)]
        let code = windows_sys::Win32::Networking::WinSock::WSAECONNREFUSED;

        let native = NativeError::from(io::Error::from_raw_os_error(code));
        assert_eq!(native.code(), Some(code));
        assert_eq!(native.kind(), NativeErrorKind::ConnectionRefused);
    }

    #[test]
    fn test_udp_open_error_steps() {
        let parse_err = "not an address".parse::<std::net::IpAddr>().unwrap_err();
        let native = NativeError::from(io::Error::from(io::ErrorKind::AddrInUse));
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();

        assert_eq!(
            UdpOpenError::Subsystem(InitError::TornDown).step(),
            UdpOpenStep::Subsystem
        );
        assert_eq!(
            UdpOpenError::ParseLocal { address: "x".into(), source: parse_err.clone() }.step(),
            UdpOpenStep::ParseLocal
        );
        assert_eq!(UdpOpenError::Create(native.clone()).step(), UdpOpenStep::Create);
        assert_eq!(
            UdpOpenError::Bind { address: addr, source: native.clone() }.step(),
            UdpOpenStep::Bind
        );
        assert_eq!(
            UdpOpenError::ParseRemote { address: "x".into(), source: parse_err }.step(),
            UdpOpenStep::ParseRemote
        );
        assert_eq!(
            UdpOpenError::ConnectPeer { address: addr, source: native }.step(),
            UdpOpenStep::ConnectPeer
        );
    }

    #[test]
    fn test_connect_error_code() {
        let startup = ConnectError::from(InitError::Startup { code: 10091 });
        assert_eq!(startup.code(), Some(10091));

        let no_addrs = ConnectError::from(ResolutionError::NoAddresses {
            host: "example".into(),
            port: 80,
        });
        assert_eq!(no_addrs.code(), None);
    }

    #[test]
    fn test_error_messages() {
        let err = ResolutionError::NoAddresses { host: "example".into(), port: 7 };
        assert_eq!(err.to_string(), "example:7 resolved to no addresses");

        let err = InitError::Startup { code: 10092 };
        assert!(err.to_string().contains("10092"));

        let err = SendError(NativeError::from(io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(err.to_string().starts_with("send failed"));
        assert_eq!(err.kind(), NativeErrorKind::BrokenPipe);
    }
}
