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

//! UDP Facades
//!
//! C entry points over [`adapters_net::UdpConnectedSocket`]. The local
//! interface comes from `NET_UDP_LOCAL_INTERFACE`, defaulting to `127.0.0.1`.

use std::os::raw::{c_char, c_int};
use std::sync::Arc;

use adapters_net::{UdpConfig, UdpConnectedSocket};
use log::debug;

use crate::args;
use crate::registry;
use crate::status::{self, NetStatus};

/// Open a UDP socket connected to `server_ip:destination_port`
///
/// # Arguments
///
/// * `server_ip` - NUL-terminated literal IPv4/IPv6 address; host names are
///   not resolved
/// * `destination_port` - Peer port
/// * `local_port` - Local port to bind, `0` for any
/// * `socket_out` - Receives the socket handle on success
///
/// # Returns
///
/// `0` on success, otherwise the status code of the failing step: `11`
/// local address, `10` socket creation, `12` bind, `13` peer address, `14`
/// connect.
///
/// # Safety
///
/// `server_ip` must be null or a valid NUL-terminated string; `socket_out`
/// must be null or valid for a write.
#[no_mangle]
pub unsafe extern "C" fn create_udp_client_socket(
    server_ip: *const c_char,
    destination_port: u16,
    local_port: u16,
    socket_out: *mut usize,
) -> i32 {
    if socket_out.is_null() {
        return status::record(NetStatus::InvalidArgument, None);
    }
    let Some(remote) = args::c_str(server_ip) else {
        return status::record(NetStatus::InvalidArgument, None);
    };

    let config = UdpConfig::from_env();
    match UdpConnectedSocket::open_with(&config, local_port, remote, destination_port) {
        Ok(socket) => {
            *socket_out = registry::insert_udp(socket);
            status::succeed()
        }
        Err(err) => {
            debug!("create_udp_client_socket: {err}");
            status::record(NetStatus::from(&err), err.code())
        }
    }
}

/// Send one datagram to the peer
///
/// # Returns
///
/// Number of bytes sent, or `-1` on error.
///
/// # Safety
///
/// `buffer` must point to `len` readable bytes when `len > 0`.
#[no_mangle]
pub unsafe extern "C" fn udp_client_send(socket: usize, buffer: *const c_char, len: c_int) -> c_int {
    let Some(udp) = registry::udp(socket) else {
        status::record(NetStatus::InvalidHandle, None);
        return -1;
    };
    let Some(data) = args::buffer(buffer, len) else {
        status::record(NetStatus::InvalidArgument, None);
        return -1;
    };

    match udp.send(data) {
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

/// Receive one datagram from the peer, blocking until it arrives
///
/// # Returns
///
/// Number of bytes placed in `buffer`, or `-1` on error.
///
/// # Safety
///
/// `buffer` must point to `len` writable bytes when `len > 0`.
#[no_mangle]
pub unsafe extern "C" fn udp_client_recv(socket: usize, buffer: *mut c_char, len: c_int) -> c_int {
    let Some(udp) = registry::udp(socket) else {
        status::record(NetStatus::InvalidHandle, None);
        return -1;
    };
    let Some(data) = args::buffer_mut(buffer, len) else {
        status::record(NetStatus::InvalidArgument, None);
        return -1;
    };

    match udp.receive(data) {
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

/// Close a UDP socket and invalidate its handle
///
/// A receive blocked on the same handle in another thread is woken by
/// shutting the socket down; the socket itself is released when that call
/// returns.
#[no_mangle]
pub extern "C" fn close_udp_client_socket(socket: usize) {
    let Some(udp) = registry::remove_udp(socket) else {
        status::record(NetStatus::InvalidHandle, None);
        return;
    };
    match Arc::try_unwrap(udp) {
        Ok(udp) => udp.close(),
        Err(shared) => shared.shutdown(),
    }
    status::succeed();
}
