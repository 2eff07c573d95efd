//! Network Subsystem Module
//!
//! Reference-counted lifecycle of the platform networking layer. On Windows
//! this is `WSAStartup`/`WSACleanup`; on other platforms the layer needs no
//! setup and the lifecycle only tracks state.
//!
//! ## Overview
//!
//! Every socket holds a [`SubsystemGuard`]. The first acquisition starts the
//! platform layer and dropping the last guard cleans it up, so callers never
//! have to pair init and teardown by hand. The explicit [`init`]/[`teardown`]
//! pair is still available for hosts that want to pin the layer for the
//! lifetime of the process:
//!
//! - `init` twice fails with [`InitError::AlreadyInitialized`]
//! - `teardown` without `init` fails with [`TeardownError::NotInitialized`]
//! - after `teardown`, `init` and every new socket fail with
//!   [`InitError::TornDown`]; sockets opened earlier stay usable until dropped
//!
//! ## Examples
//!
//! ```rust
//! use adapters_net::subsystem;
//!
//! let guard = subsystem::acquire().unwrap();
//! assert!(subsystem::is_active());
//! drop(guard);
//! ```

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::error::{InitError, TeardownError};

/// Seam to the OS networking layer
#[cfg_attr(test, mockall::automock)]
pub trait Platform {
    /// Start the networking layer, returning the platform error code on failure
    fn startup(&self) -> Result<(), i32>;

    /// Release the networking layer
    fn cleanup(&self);
}

/// The networking layer of the running OS
#[derive(Debug, Default, Clone, Copy)]
pub struct NativePlatform;

#[cfg(windows)]
impl Platform for NativePlatform {
    fn startup(&self) -> Result<(), i32> {
        use windows_sys::Win32::Networking::WinSock::{WSAStartup, WSADATA};

        // MAKEWORD(2, 2)
        const VERSION: u16 = 0x0202;

        let mut data = std::mem::MaybeUninit::<WSADATA>::zeroed();
        // SAFETY: `data` is a writable WSADATA the call fills in.
        let code = unsafe { WSAStartup(VERSION, data.as_mut_ptr()) };
        if code == 0 {
            Ok(())
        } else {
            Err(code)
        }
    }

    fn cleanup(&self) {
        // SAFETY: only called to balance a successful WSAStartup.
        unsafe {
            windows_sys::Win32::Networking::WinSock::WSACleanup();
        }
    }
}

#[cfg(not(windows))]
impl Platform for NativePlatform {
    fn startup(&self) -> Result<(), i32> {
        Ok(())
    }

    fn cleanup(&self) {}
}

#[derive(Debug)]
struct State {
    refs: usize,
    explicit: bool,
    torn_down: bool,
}

/// Reference-counted networking layer
pub struct Subsystem<P: Platform = NativePlatform> {
    state: Mutex<State>,
    platform: P,
}

impl<P: Platform> Subsystem<P> {
    /// Create an idle subsystem over `platform`
    pub const fn new(platform: P) -> Self {
        Self {
            state: Mutex::new(State {
                refs: 0,
                explicit: false,
                torn_down: false,
            }),
            platform,
        }
    }

    /// Acquire a reference, starting the platform layer if this is the first one
    ///
    /// # Returns
    ///
    /// * `Ok(SubsystemGuard)` - Reference released when the guard drops
    /// * `Err(InitError)` - Platform startup failed or the subsystem was torn down
    pub fn acquire(&self) -> Result<SubsystemGuard<'_, P>, InitError> {
        let mut state = self.lock();
        if state.torn_down {
            return Err(InitError::TornDown);
        }
        self.retain(&mut state)?;
        Ok(SubsystemGuard { subsystem: self })
    }

    /// Explicitly initialize, holding a reference until [`Subsystem::teardown`]
    pub fn init(&self) -> Result<(), InitError> {
        let mut state = self.lock();
        if state.torn_down {
            return Err(InitError::TornDown);
        }
        if state.explicit {
            return Err(InitError::AlreadyInitialized);
        }
        self.retain(&mut state)?;
        state.explicit = true;
        Ok(())
    }

    /// Drop the reference taken by [`Subsystem::init`] and refuse further use
    ///
    /// The platform layer is released once every socket opened earlier has
    /// been dropped.
    pub fn teardown(&self) -> Result<(), TeardownError> {
        let mut state = self.lock();
        if !state.explicit {
            return Err(TeardownError::NotInitialized);
        }
        state.explicit = false;
        state.torn_down = true;
        debug!("network subsystem torn down ({} socket reference(s) outstanding)", state.refs - 1);
        self.release_locked(&mut state);
        Ok(())
    }

    /// Whether the platform layer is currently started
    pub fn is_active(&self) -> bool {
        self.lock().refs > 0
    }

    /// Number of live references, explicit init included
    pub fn references(&self) -> usize {
        self.lock().refs
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // State is updated with single assignments; a panic elsewhere cannot
        // leave it half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn retain(&self, state: &mut State) -> Result<(), InitError> {
        if state.refs == 0 {
            if let Err(code) = self.platform.startup() {
                warn!("network subsystem failed to start: os error {code}");
                return Err(InitError::Startup { code });
            }
            debug!("network subsystem started");
        }
        state.refs += 1;
        Ok(())
    }

    fn release(&self) {
        let mut state = self.lock();
        self.release_locked(&mut state);
    }

    fn release_locked(&self, state: &mut State) {
        state.refs = state.refs.saturating_sub(1);
        if state.refs == 0 {
            self.platform.cleanup();
            debug!("network subsystem cleaned up");
        }
    }
}

impl<P: Platform> fmt::Debug for Subsystem<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subsystem").field("state", &*self.lock()).finish()
    }
}

/// One reference to a started [`Subsystem`]
pub struct SubsystemGuard<'a, P: Platform = NativePlatform> {
    subsystem: &'a Subsystem<P>,
}

impl<P: Platform> Drop for SubsystemGuard<'_, P> {
    fn drop(&mut self) {
        self.subsystem.release();
    }
}

impl<P: Platform> fmt::Debug for SubsystemGuard<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubsystemGuard").finish_non_exhaustive()
    }
}

static SUBSYSTEM: Subsystem<NativePlatform> = Subsystem::new(NativePlatform);

/// The process-wide subsystem
pub fn global() -> &'static Subsystem<NativePlatform> {
    &SUBSYSTEM
}

/// Acquire a reference to the process-wide subsystem
pub fn acquire() -> Result<SubsystemGuard<'static>, InitError> {
    SUBSYSTEM.acquire()
}

/// Explicitly initialize the process-wide subsystem
pub fn init() -> Result<(), InitError> {
    SUBSYSTEM.init()
}

/// Tear down the process-wide subsystem; terminal for the process
pub fn teardown() -> Result<(), TeardownError> {
    SUBSYSTEM.teardown()
}

/// Whether the process-wide subsystem is started
pub fn is_active() -> bool {
    SUBSYSTEM.is_active()
}
