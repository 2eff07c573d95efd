//! Process-wide subsystem lifecycle
//!
//! Teardown is terminal for the process, so this binary holds a single test
//! that walks the whole lifecycle in order.

use adapters_net::*;
use std::net::{Ipv4Addr, TcpListener};

#[test]
fn test_global_lifecycle() {
    let _ = env_logger::builder().is_test(true).try_init();

    assert_eq!(subsystem::teardown(), Err(TeardownError::NotInitialized));

    subsystem::init().unwrap();
    assert!(subsystem::is_active());
    assert_eq!(subsystem::init(), Err(InitError::AlreadyInitialized));

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    let conn = TcpConnection::connect("127.0.0.1", port).unwrap();
    let (peer, _) = listener.accept().unwrap();

    subsystem::teardown().unwrap();
    assert_eq!(subsystem::teardown(), Err(TeardownError::NotInitialized));

    // Connections opened before teardown stay usable
    assert!(subsystem::is_active());
    assert_eq!(conn.send(b"still here").unwrap(), 10);

    // New sockets and re-initialization are refused
    assert_eq!(subsystem::init(), Err(InitError::TornDown));
    assert_eq!(
        TcpConnection::connect("127.0.0.1", port).unwrap_err(),
        ConnectError::Subsystem(InitError::TornDown)
    );
    assert_eq!(
        UdpConnectedSocket::open(0, "127.0.0.1", 9001).unwrap_err().step(),
        UdpOpenStep::Subsystem
    );

    conn.close();
    drop(peer);
    assert!(!subsystem::is_active());
}
