//! Raw-pointer helpers shared by the extern functions.
//!
//! Every writer validates fully before touching caller memory, so a
//! failed call leaves its out-parameters as they were.

#![allow(unsafe_code)]

use std::ffi::{c_char, CStr};

use crate::status::BmiStatus;

pub(crate) type FfiResult = Result<(), BmiStatus>;

/// Collapse a helper result into a status code.
pub(crate) fn code(result: FfiResult) -> i32 {
    match result {
        Ok(()) => BmiStatus::Success as i32,
        Err(status) => status as i32,
    }
}

/// A size or count as a C `int`.
pub(crate) fn c_int(n: usize) -> Result<i32, BmiStatus> {
    i32::try_from(n).map_err(|_| BmiStatus::InternalError)
}

/// Borrow a NUL-terminated UTF-8 string.
///
/// # Safety
///
/// `ptr` is null or points to a NUL-terminated string valid for `'a`.
pub(crate) unsafe fn c_str<'a>(ptr: *const c_char) -> Result<&'a str, BmiStatus> {
    if ptr.is_null() {
        return Err(BmiStatus::InvalidArgument);
    }
    // SAFETY: non-null and NUL-terminated per caller contract.
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|_| BmiStatus::InvalidArgument)
}

/// Copy `s` plus a terminating NUL into `buf`, which holds `len` bytes.
///
/// # Safety
///
/// `buf` is null or valid for `len` byte writes.
pub(crate) unsafe fn write_c_str(buf: *mut c_char, len: usize, s: &str) -> FfiResult {
    if buf.is_null() {
        return Err(BmiStatus::InvalidArgument);
    }
    if s.len() >= len {
        return Err(BmiStatus::BufferTooSmall);
    }
    // SAFETY: buf holds len > s.len() bytes.
    unsafe {
        std::ptr::copy_nonoverlapping(s.as_ptr(), buf as *mut u8, s.len());
        *buf.add(s.len()) = 0;
    }
    Ok(())
}

/// Store one value through `out`.
///
/// # Safety
///
/// `out` is null or valid for one write.
pub(crate) unsafe fn write_out<T>(out: *mut T, value: T) -> FfiResult {
    if out.is_null() {
        return Err(BmiStatus::InvalidArgument);
    }
    // SAFETY: non-null per check, valid per caller contract.
    unsafe { out.write(value) };
    Ok(())
}

/// Copy `src` into the first `src.len()` of `len` elements at `out`.
///
/// # Safety
///
/// `out` is null or valid for `len` element writes.
pub(crate) unsafe fn write_slice<T: Copy>(out: *mut T, len: usize, src: &[T]) -> FfiResult {
    if out.is_null() {
        return Err(BmiStatus::InvalidArgument);
    }
    if len < src.len() {
        return Err(BmiStatus::BufferTooSmall);
    }
    // SAFETY: out holds at least src.len() elements.
    unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), out, src.len()) };
    Ok(())
}

/// Write `names` as rows of `name_len` bytes, each NUL-terminated.
///
/// # Safety
///
/// `buf` is null or valid for `count * name_len` byte writes.
pub(crate) unsafe fn write_name_table(
    buf: *mut c_char,
    count: usize,
    name_len: usize,
    names: &[&str],
) -> FfiResult {
    if buf.is_null() || count.checked_mul(name_len).is_none() {
        return Err(BmiStatus::InvalidArgument);
    }
    if count < names.len() || names.iter().any(|n| n.len() >= name_len) {
        return Err(BmiStatus::BufferTooSmall);
    }
    for (row, name) in names.iter().enumerate() {
        // SAFETY: row < count, so the row lies inside the buffer.
        unsafe { write_c_str(buf.add(row * name_len), name_len, name)? };
    }
    Ok(())
}

/// Borrow a caller source buffer. A null pointer is only valid for `len == 0`.
///
/// # Safety
///
/// `ptr` is null or valid for `len` element reads for `'a`.
pub(crate) unsafe fn slice<'a, T>(ptr: *const T, len: usize) -> Result<&'a [T], BmiStatus> {
    if ptr.is_null() {
        return if len == 0 {
            Ok(Default::default())
        } else {
            Err(BmiStatus::InvalidArgument)
        };
    }
    // SAFETY: non-null and valid for len reads per caller contract.
    Ok(unsafe { std::slice::from_raw_parts(ptr, len) })
}

/// Borrow a caller destination buffer. A null pointer is only valid for
/// `len == 0`.
///
/// # Safety
///
/// `ptr` is null or valid for `len` element writes for `'a`, and not
/// aliased during that time.
pub(crate) unsafe fn slice_mut<'a, T>(ptr: *mut T, len: usize) -> Result<&'a mut [T], BmiStatus> {
    if ptr.is_null() {
        return if len == 0 {
            Ok(Default::default())
        } else {
            Err(BmiStatus::InvalidArgument)
        };
    }
    // SAFETY: non-null, valid and unaliased per caller contract.
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, len) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_needs_room_for_terminator() {
        let mut buf = [1 as c_char; 4];
        assert_eq!(
            unsafe { write_c_str(buf.as_mut_ptr(), 4, "abcd") },
            Err(BmiStatus::BufferTooSmall)
        );
        assert_eq!(buf, [1; 4]);
        assert_eq!(unsafe { write_c_str(buf.as_mut_ptr(), 4, "abc") }, Ok(()));
        assert_eq!(unsafe { CStr::from_ptr(buf.as_ptr()) }.to_str(), Ok("abc"));
    }

    #[test]
    fn name_table_rejects_before_writing() {
        let mut buf = [7 as c_char; 8];
        let names = ["ab", "toolong"];
        assert_eq!(
            unsafe { write_name_table(buf.as_mut_ptr(), 2, 4, &names) },
            Err(BmiStatus::BufferTooSmall)
        );
        assert_eq!(buf, [7; 8]);
        assert_eq!(
            unsafe { write_name_table(buf.as_mut_ptr(), 1, 8, &["a", "b"]) },
            Err(BmiStatus::BufferTooSmall)
        );
        assert_eq!(
            unsafe { write_name_table(buf.as_mut_ptr(), 2, 4, &["ab", "xyz"]) },
            Ok(())
        );
        assert_eq!(unsafe { CStr::from_ptr(buf.as_ptr().add(4)) }.to_str(), Ok("xyz"));
    }

    #[test]
    fn null_pointers_are_invalid_arguments() {
        assert_eq!(unsafe { c_str(std::ptr::null()) }, Err(BmiStatus::InvalidArgument));
        assert_eq!(
            unsafe { write_out::<f64>(std::ptr::null_mut(), 1.0) },
            Err(BmiStatus::InvalidArgument)
        );
        assert_eq!(
            unsafe { slice::<f64>(std::ptr::null(), 1) },
            Err(BmiStatus::InvalidArgument)
        );
        assert_eq!(unsafe { slice::<f64>(std::ptr::null(), 0) }, Ok(&[][..]));
    }

    #[test]
    fn short_array_is_too_small() {
        let mut out = [0i32; 1];
        assert_eq!(
            unsafe { write_slice(out.as_mut_ptr(), 1, &[1, 2]) },
            Err(BmiStatus::BufferTooSmall)
        );
        assert_eq!(out, [0]);
    }
}
