//! Subsystem lifecycle through the C exports
//!
//! Teardown is terminal for the process, so the whole sequence runs as one
//! test in its own binary.

use std::ffi::CString;
use std::net::{Ipv4Addr, TcpListener};

use api_facades::*;

#[test]
fn test_init_deinit_sequence() {
    let _ = env_logger::builder().is_test(true).try_init();

    net_deinit();
    assert_eq!(net_last_status(), NetStatus::NotInitialized.code());

    assert_eq!(net_init(), 0);
    assert_eq!(net_init(), NetStatus::AlreadyInitialized.code());

    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    let host = CString::new("127.0.0.1").unwrap();
    let mut handle = 0usize;
    assert_eq!(unsafe { connect_tcp(host.as_ptr(), port, &mut handle) }, 0);

    net_deinit();
    assert_eq!(net_last_status(), 0);
    net_deinit();
    assert_eq!(net_last_status(), NetStatus::NotInitialized.code());

    // The open handle survives teardown
    assert_eq!(unsafe { send_tcp(handle, b"late".as_ptr().cast(), 4) }, 4);

    assert_eq!(net_init(), NetStatus::TornDown.code());
    let mut refused = 0usize;
    assert_eq!(
        unsafe { connect_tcp(host.as_ptr(), port, &mut refused) },
        NetStatus::TornDown.code()
    );
    let mut udp = 0usize;
    assert_eq!(
        unsafe { create_udp_client_socket(host.as_ptr(), port, 0, &mut udp) },
        NetStatus::TornDown.code()
    );

    close_tcp_connection(handle);
    assert_eq!(net_last_status(), 0);
}
