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

//! Handle Registry
//!
//! Maps the opaque integer handles given to C callers onto open sockets.
//! Ids start at 1 and are never reused, so a stale handle can never reach a
//! socket opened later. Entries are shared: a call in flight keeps its socket
//! alive even if another thread closes the handle meanwhile.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use adapters_net::{TcpConnection, UdpConnectedSocket};

/// Socket behind a handle
#[derive(Debug, Clone)]
pub(crate) enum Entry {
    Tcp(Arc<TcpConnection>),
    Udp(Arc<UdpConnectedSocket>),
}

#[derive(Debug)]
struct HandleRegistry {
    entries: HashMap<usize, Entry>,
    next_id: usize,
}

impl HandleRegistry {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_id: 1,
        }
    }

    fn insert(&mut self, entry: Entry) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(id, entry);
        id
    }
}

lazy_static::lazy_static! {
    static ref HANDLE_REGISTRY: Mutex<HandleRegistry> = Mutex::new(HandleRegistry::new());
}

fn registry() -> MutexGuard<'static, HandleRegistry> {
    HANDLE_REGISTRY.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Register a TCP connection, returning its handle
pub(crate) fn insert_tcp(connection: TcpConnection) -> usize {
    registry().insert(Entry::Tcp(Arc::new(connection)))
}

/// Register a UDP socket, returning its handle
pub(crate) fn insert_udp(socket: UdpConnectedSocket) -> usize {
    registry().insert(Entry::Udp(Arc::new(socket)))
}

/// TCP connection behind `handle`, if it is an open TCP handle
pub(crate) fn tcp(handle: usize) -> Option<Arc<TcpConnection>> {
    match registry().entries.get(&handle) {
        Some(Entry::Tcp(connection)) => Some(Arc::clone(connection)),
        _ => None,
    }
}

/// UDP socket behind `handle`, if it is an open UDP handle
pub(crate) fn udp(handle: usize) -> Option<Arc<UdpConnectedSocket>> {
    match registry().entries.get(&handle) {
        Some(Entry::Udp(socket)) => Some(Arc::clone(socket)),
        _ => None,
    }
}

/// Unregister a TCP handle; handles of the other kind are left alone
pub(crate) fn remove_tcp(handle: usize) -> Option<Arc<TcpConnection>> {
    let mut registry = registry();
    match registry.entries.get(&handle) {
        Some(Entry::Tcp(_)) => match registry.entries.remove(&handle) {
            Some(Entry::Tcp(connection)) => Some(connection),
            _ => None,
        },
        _ => None,
    }
}

/// Unregister a UDP handle; handles of the other kind are left alone
pub(crate) fn remove_udp(handle: usize) -> Option<Arc<UdpConnectedSocket>> {
    let mut registry = registry();
    match registry.entries.get(&handle) {
        Some(Entry::Udp(_)) => match registry.entries.remove(&handle) {
            Some(Entry::Udp(socket)) => Some(socket),
            _ => None,
        },
        _ => None,
    }
}
