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

//! Network Subsystem Facades
//!
//! C entry points for the process-wide network subsystem and for reading the
//! per-thread status record.
//!
//! ```c
//! if (net_init() != 0) { /* inspect net_last_os_error() */ }
//! /* ... sockets ... */
//! net_deinit();
//! ```
//!
//! Calling `net_init` is optional: every socket holds the subsystem while it
//! is open. Once `net_deinit` has run, the subsystem cannot be started again
//! in this process.

use adapters_net::{subsystem, InitError};
use log::debug;

use crate::status::{self, NetStatus};

/// Initialize the network subsystem
///
/// # Returns
///
/// `0` on success, otherwise a status code: `4` if already initialized, `5`
/// after `net_deinit`, `9` if the platform refused to start (the platform
/// code is available from `net_last_os_error`).
#[no_mangle]
pub extern "C" fn net_init() -> i32 {
    match subsystem::init() {
        Ok(()) => status::succeed(),
        Err(err) => {
            debug!("net_init: {err}");
            let code = match err {
                InitError::Startup { code } => Some(code),
                _ => None,
            };
            status::record(NetStatus::from(&err), code)
        }
    }
}

/// Tear down the network subsystem
///
/// Records `6` (not initialized) when there is no matching `net_init`.
/// Sockets opened earlier stay usable until closed.
#[no_mangle]
pub extern "C" fn net_deinit() {
    match subsystem::teardown() {
        Ok(()) => {
            status::succeed();
        }
        Err(err) => {
            debug!("net_deinit: {err}");
            status::record(NetStatus::from(&err), None);
        }
    }
}

/// Status code recorded by the last boundary call on the calling thread
#[no_mangle]
pub extern "C" fn net_last_status() -> i32 {
    status::last_status().code()
}

/// Native OS error code recorded by the last boundary call on the calling
/// thread, or `0` when the failure carried none
#[no_mangle]
pub extern "C" fn net_last_os_error() -> i32 {
    status::last_os_error().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_status_accessors() {
        status::record(NetStatus::UdpBind, Some(98));
        assert_eq!(net_last_status(), 12);
        assert_eq!(net_last_os_error(), 98);

        status::record(NetStatus::InvalidHandle, None);
        assert_eq!(net_last_status(), 3);
        assert_eq!(net_last_os_error(), 0);
    }
}
