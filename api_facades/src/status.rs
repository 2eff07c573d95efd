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

//! Status Codes
//!
//! Integer status codes returned across the C boundary, and the per-thread
//! record of the last status and native error code. C callers read the record
//! through `net_last_status` / `net_last_os_error` after a call that returned
//! `-1` or had no return value.

use std::cell::Cell;

use adapters_net::{
    ConnectError, InitError, RecvError, SendError, TeardownError, UdpOpenError, UdpOpenStep,
};

/// Status of the last boundary call
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetStatus {
    Ok = 0,
    Failure = 1,
    InvalidArgument = 2,
    InvalidHandle = 3,
    AlreadyInitialized = 4,
    TornDown = 5,
    NotInitialized = 6,
    ResolutionFailed = 7,
    Unreachable = 8,
    StartupFailed = 9,
    UdpCreate = 10,
    UdpParseLocal = 11,
    UdpBind = 12,
    UdpParseRemote = 13,
    UdpConnectPeer = 14,
    SendFailed = 15,
    RecvFailed = 16,
}

impl NetStatus {
    /// Integer code as seen by C callers
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<&InitError> for NetStatus {
    fn from(err: &InitError) -> Self {
        match err {
            InitError::Startup { .. } => NetStatus::StartupFailed,
            InitError::AlreadyInitialized => NetStatus::AlreadyInitialized,
            InitError::TornDown => NetStatus::TornDown,
        }
    }
}

impl From<&TeardownError> for NetStatus {
    fn from(err: &TeardownError) -> Self {
        match err {
            TeardownError::NotInitialized => NetStatus::NotInitialized,
        }
    }
}

impl From<&ConnectError> for NetStatus {
    fn from(err: &ConnectError) -> Self {
        match err {
            ConnectError::Subsystem(init) => init.into(),
            ConnectError::Resolution(_) => NetStatus::ResolutionFailed,
            ConnectError::Unreachable { .. } => NetStatus::Unreachable,
        }
    }
}

impl From<&UdpOpenError> for NetStatus {
    fn from(err: &UdpOpenError) -> Self {
        if let UdpOpenError::Subsystem(init) = err {
            return init.into();
        }
        match err.step() {
            UdpOpenStep::ParseLocal => NetStatus::UdpParseLocal,
            UdpOpenStep::Create => NetStatus::UdpCreate,
            UdpOpenStep::Bind => NetStatus::UdpBind,
            UdpOpenStep::ParseRemote => NetStatus::UdpParseRemote,
            UdpOpenStep::ConnectPeer => NetStatus::UdpConnectPeer,
            UdpOpenStep::Subsystem => NetStatus::Failure,
        }
    }
}

impl From<&SendError> for NetStatus {
    fn from(_: &SendError) -> Self {
        NetStatus::SendFailed
    }
}

impl From<&RecvError> for NetStatus {
    fn from(_: &RecvError) -> Self {
        NetStatus::RecvFailed
    }
}

thread_local! {
    static LAST: Cell<(NetStatus, Option<i32>)> = const { Cell::new((NetStatus::Ok, None)) };
}

/// Record a successful call
pub(crate) fn succeed() -> i32 {
    record(NetStatus::Ok, None)
}

/// Record the outcome of a call, returning its status code
pub(crate) fn record(status: NetStatus, os_error: Option<i32>) -> i32 {
    LAST.with(|last| last.set((status, os_error)));
    status.code()
}

/// Status recorded by the last boundary call on this thread
pub fn last_status() -> NetStatus {
    LAST.with(|last| last.get().0)
}

/// Native error code recorded by the last boundary call on this thread
pub fn last_os_error() -> Option<i32> {
    LAST.with(|last| last.get().1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters_net::NativeError;
    use std::io;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(NetStatus::Ok.code(), 0);
        assert_eq!(NetStatus::InvalidHandle.code(), 3);
        assert_eq!(NetStatus::StartupFailed.code(), 9);
        assert_eq!(NetStatus::UdpConnectPeer.code(), 14);
        assert_eq!(NetStatus::RecvFailed.code(), 16);
    }

    #[test]
    fn test_record_is_per_thread() {
        record(NetStatus::Unreachable, Some(111));
        assert_eq!(last_status(), NetStatus::Unreachable);
        assert_eq!(last_os_error(), Some(111));

        std::thread::spawn(|| {
            assert_eq!(last_status(), NetStatus::Ok);
            assert_eq!(last_os_error(), None);
        })
        .join()
        .unwrap();

        assert_eq!(succeed(), 0);
        assert_eq!(last_os_error(), None);
    }

    #[test]
    fn test_error_mapping() {
        assert_eq!(
            NetStatus::from(&ConnectError::Subsystem(InitError::TornDown)),
            NetStatus::TornDown
        );
        assert_eq!(
            NetStatus::from(&InitError::Startup { code: 10091 }),
            NetStatus::StartupFailed
        );
        assert_eq!(
            NetStatus::from(&TeardownError::NotInitialized),
            NetStatus::NotInitialized
        );

        let native = NativeError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(NetStatus::from(&SendError(native.clone())), NetStatus::SendFailed);
        assert_eq!(NetStatus::from(&RecvError(native.clone())), NetStatus::RecvFailed);
        assert_eq!(
            NetStatus::from(&UdpOpenError::Create(native)),
            NetStatus::UdpCreate
        );

        let parse = "x".parse::<std::net::IpAddr>().unwrap_err();
        let err = UdpOpenError::ParseRemote {
            address: "x".into(),
            source: parse,
        };
        assert_eq!(NetStatus::from(&err), NetStatus::UdpParseRemote);
    }
}
