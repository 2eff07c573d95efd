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

//! Argument conversion for the C boundary

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::slice;

/// Borrow a NUL-terminated UTF-8 string
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for `'a`.
pub(crate) unsafe fn c_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Borrow a caller buffer for reading
///
/// A zero length yields an empty slice whatever `ptr` is.
///
/// # Safety
///
/// When `len > 0`, `ptr` must point to `len` readable bytes valid for `'a`.
pub(crate) unsafe fn buffer<'a>(ptr: *const c_char, len: c_int) -> Option<&'a [u8]> {
    match len {
        0 => Some(&[]),
        n if n < 0 || ptr.is_null() => None,
        n => Some(slice::from_raw_parts(ptr.cast::<u8>(), n as usize)),
    }
}

/// Borrow a caller buffer for writing
///
/// # Safety
///
/// When `len > 0`, `ptr` must point to `len` writable bytes valid for `'a`
/// and not aliased elsewhere.
pub(crate) unsafe fn buffer_mut<'a>(ptr: *mut c_char, len: c_int) -> Option<&'a mut [u8]> {
    match len {
        0 => Some(&mut []),
        n if n < 0 || ptr.is_null() => None,
        n => Some(slice::from_raw_parts_mut(ptr.cast::<u8>(), n as usize)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn test_c_str() {
        let owned = CString::new("127.0.0.1").unwrap();
        assert_eq!(unsafe { c_str(owned.as_ptr()) }, Some("127.0.0.1"));
        assert_eq!(unsafe { c_str(std::ptr::null()) }, None);

        let invalid = [0xffu8 as c_char, 0];
        assert_eq!(unsafe { c_str(invalid.as_ptr()) }, None);
    }

    #[test]
    fn test_buffers() {
        let data = *b"abc";
        let read = unsafe { buffer(data.as_ptr().cast(), 3) }.unwrap();
        assert_eq!(read, b"abc");

        assert_eq!(unsafe { buffer(std::ptr::null(), 0) }, Some(&[][..]));
        assert_eq!(unsafe { buffer(std::ptr::null(), 4) }, None);
        assert_eq!(unsafe { buffer(data.as_ptr().cast(), -1) }, None);

        let mut out = [0u8; 2];
        let write = unsafe { buffer_mut(out.as_mut_ptr().cast(), 2) }.unwrap();
        write.copy_from_slice(b"hi");
        assert_eq!(&out, b"hi");
        assert!(unsafe { buffer_mut(std::ptr::null_mut(), 2) }.is_none());
    }
}
