/*
 * %CopyrightBegin%
 *
 * SPDX-License-Identifier: Apache-2.0
 *
 * Copyright WinNet Rust Conversion contributors 2026. All Rights Reserved.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 * %CopyrightEnd%
 */

//! TCP Facades
//!
//! C entry points over [`adapters_net::TcpConnection`]. Connections are named
//! by registry handles; `socket_out` receives the handle on success.
//!
//! ```c
//! size_t sock;
//! if (connect_tcp("localhost", 8080, &sock) == 0) {
//!     send_tcp(sock, "hello", 5);
//!     disable_tcp_send(sock);
//!     while (recv_tcp(sock, buf, sizeof buf) > 0) { }
//!     close_tcp_connection(sock);
//! }
//! ```

use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use adapters_net::TcpConnection;
use log::debug;

use crate::args;
use crate::registry;
use crate::status::{self, NetStatus};

/// Resolve `address` and connect to the first candidate that accepts
///
/// # Arguments
///
/// * `address` - NUL-terminated host name or literal address
/// * `port` - Destination port
/// * `socket_out` - Receives the connection handle on success
///
/// # Returns
///
/// `0` on success, otherwise a status code (`2` invalid argument, `5` torn
/// down, `7` resolution failed, `8` no candidate accepted).
///
/// # Safety
///
/// `address` must be null or a valid NUL-terminated string; `socket_out`
/// must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn connect_tcp(
    address: *const c_char,
    port: u16,
    socket_out: *mut usize,
) -> i32 {
    if socket_out.is_null() {
        return status::record(NetStatus::InvalidArgument, None);
    }
    let Some(host) = args::c_str(address) else {
        return status::record(NetStatus::InvalidArgument, None);
    };

    match TcpConnection::connect(host, port) {
        Ok(connection) => {
            *socket_out = registry::insert_tcp(connection);
            status::succeed()
        }
        Err(err) => {
            debug!("connect_tcp: {err}");
            status::record(NetStatus::from(&err), err.code())
        }
    }
}

/// Send bytes on a connection
///
/// # Returns
///
/// Number of bytes accepted (possibly fewer than `len`), or `-1` on error.
///
/// # Safety
///
/// `buffer` must point to `len` readable bytes when `len > 0`.
#[no_mangle]
pub unsafe extern "C" fn send_tcp(socket: usize, buffer: *const c_char, len: c_int) -> c_int {
    let Some(connection) = registry::tcp(socket) else {
        status::record(NetStatus::InvalidHandle, None);
        return -1;
    };
    let Some(data) = args::buffer(buffer, len) else {
        status::record(NetStatus::InvalidArgument, None);
        return -1;
    };

    match connection.send(data) {
        Ok(sent) => {
            status::succeed();
            sent as c_int
        }
        Err(err) => {
            status::record(NetStatus::from(&err), err.code());
            -1
        }
    }
}

/// Receive bytes from a connection, blocking until some arrive
///
/// # Returns
///
/// Number of bytes received, `0` at end of stream, or `-1` on error.
///
/// # Safety
///
/// `buffer` must point to `len` writable bytes when `len > 0`.
#[no_mangle]
pub unsafe extern "C" fn recv_tcp(socket: usize, buffer: *mut c_char, len: c_int) -> c_int {
    let Some(connection) = registry::tcp(socket) else {
        status::record(NetStatus::InvalidHandle, None);
        return -1;
    };
    let Some(data) = args::buffer_mut(buffer, len) else {
        status::record(NetStatus::InvalidArgument, None);
        return -1;
    };

    match connection.receive(data) {
        Ok(read) => {
            status::succeed();
            read as c_int
        }
        Err(err) => {
            status::record(NetStatus::from(&err), err.code());
            -1
        }
    }
}

fn with_connection(socket: usize, action: impl FnOnce(&TcpConnection)) {
    match registry::tcp(socket) {
        Some(connection) => {
            action(&connection);
            status::succeed();
        }
        None => {
            status::record(NetStatus::InvalidHandle, None);
        }
    }
}

/// Stop sending; the peer sees end of stream
#[no_mangle]
pub extern "C" fn disable_tcp_send(socket: usize) {
    with_connection(socket, TcpConnection::half_close_send);
}

/// Stop receiving
#[no_mangle]
pub extern "C" fn disable_tcp_receive(socket: usize) {
    with_connection(socket, TcpConnection::half_close_receive);
}

/// Stop both directions
#[no_mangle]
pub extern "C" fn disable_tcp_send_and_receive(socket: usize) {
    with_connection(socket, TcpConnection::half_close_both);
}

/// Close a connection and invalidate its handle
///
/// A call blocked on the same handle in another thread is woken by shutting
/// both directions down; the socket itself is released when that call
/// returns.
#[no_mangle]
pub extern "C" fn close_tcp_connection(socket: usize) {
    let Some(connection) = registry::remove_tcp(socket) else {
        status::record(NetStatus::InvalidHandle, None);
        return;
    };
    match Arc::try_unwrap(connection) {
        Ok(connection) => connection.close(),
        Err(shared) => shared.half_close_both(),
    }
    status::succeed();
}
