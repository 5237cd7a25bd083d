//! Value exchange: get/set whole variables or selected elements.
//!
//! The element type of the function must match the variable's type and
//! `len` must match its size (or the index count); there is no implicit
//! conversion at the C boundary.

#![allow(unsafe_code)]

use std::ffi::c_char;

use bmi_core::Element;

use crate::buffer;
use crate::instance::with_adapter;

/// C indices are `int`; negative ones can never be in range.
fn flat_indices(indices: &[i32]) -> Vec<usize> {
    indices
        .iter()
        .map(|&i| usize::try_from(i).unwrap_or(usize::MAX))
        .collect()
}

fn get_value<T: Element>(name: *const c_char, dest: *mut T, len: usize) -> i32 {
    with_adapter(|a| {
        // SAFETY: name is NUL-terminated, dest valid for len writes.
        let (name, dest) = unsafe { (buffer::c_str(name)?, buffer::slice_mut(dest, len)?) };
        Ok(a.get_value(name, T::slice_mut(dest))?)
    })
}

fn set_value<T: Element>(name: *const c_char, src: *const T, len: usize) -> i32 {
    with_adapter(|a| {
        // SAFETY: name is NUL-terminated, src valid for len reads.
        let (name, src) = unsafe { (buffer::c_str(name)?, buffer::slice(src, len)?) };
        Ok(a.set_value(name, T::slice(src))?)
    })
}

fn get_value_at_indices<T: Element>(
    name: *const c_char,
    dest: *mut T,
    indices: *const i32,
    count: usize,
) -> i32 {
    with_adapter(|a| {
        // SAFETY: name is NUL-terminated; dest and indices valid for count elements.
        let (name, dest, indices) = unsafe {
            (
                buffer::c_str(name)?,
                buffer::slice_mut(dest, count)?,
                buffer::slice(indices, count)?,
            )
        };
        Ok(a.get_value_at_indices(name, T::slice_mut(dest), &flat_indices(indices))?)
    })
}

fn set_value_at_indices<T: Element>(
    name: *const c_char,
    indices: *const i32,
    count: usize,
    src: *const T,
) -> i32 {
    with_adapter(|a| {
        // SAFETY: name is NUL-terminated; src and indices valid for count elements.
        let (name, indices, src) = unsafe {
            (
                buffer::c_str(name)?,
                buffer::slice(indices, count)?,
                buffer::slice(src, count)?,
            )
        };
        Ok(a.set_value_at_indices(name, &flat_indices(indices), T::slice(src))?)
    })
}

/// Copy an `int` variable into `dest` (`len` elements).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_value_int(name: *const c_char, dest: *mut i32, len: usize) -> i32 {
    ffi_guard!({ get_value(name, dest, len) })
}

/// Copy a `float` variable into `dest` (`len` elements).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_value_float(name: *const c_char, dest: *mut f32, len: usize) -> i32 {
    ffi_guard!({ get_value(name, dest, len) })
}

/// Copy a `double` variable into `dest` (`len` elements).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_value_double(name: *const c_char, dest: *mut f64, len: usize) -> i32 {
    ffi_guard!({ get_value(name, dest, len) })
}

/// Write `src` (`len` elements) to an `int` input.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_set_value_int(name: *const c_char, src: *const i32, len: usize) -> i32 {
    ffi_guard!({ set_value(name, src, len) })
}

/// Write `src` (`len` elements) to a `float` input.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_set_value_float(name: *const c_char, src: *const f32, len: usize) -> i32 {
    ffi_guard!({ set_value(name, src, len) })
}

/// Write `src` (`len` elements) to a `double` input.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_set_value_double(name: *const c_char, src: *const f64, len: usize) -> i32 {
    ffi_guard!({ set_value(name, src, len) })
}

/// Copy the `int` elements at `indices` (`count` of them) into `dest`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_value_at_indices_int(
    name: *const c_char,
    dest: *mut i32,
    indices: *const i32,
    count: usize,
) -> i32 {
    ffi_guard!({ get_value_at_indices(name, dest, indices, count) })
}

/// Copy the `float` elements at `indices` (`count` of them) into `dest`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_value_at_indices_float(
    name: *const c_char,
    dest: *mut f32,
    indices: *const i32,
    count: usize,
) -> i32 {
    ffi_guard!({ get_value_at_indices(name, dest, indices, count) })
}

/// Copy the `double` elements at `indices` (`count` of them) into `dest`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_value_at_indices_double(
    name: *const c_char,
    dest: *mut f64,
    indices: *const i32,
    count: usize,
) -> i32 {
    ffi_guard!({ get_value_at_indices(name, dest, indices, count) })
}

/// Write `src` to the `int` elements at `indices` (`count` of them).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_set_value_at_indices_int(
    name: *const c_char,
    indices: *const i32,
    count: usize,
    src: *const i32,
) -> i32 {
    ffi_guard!({ set_value_at_indices(name, indices, count, src) })
}

/// Write `src` to the `float` elements at `indices` (`count` of them).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_set_value_at_indices_float(
    name: *const c_char,
    indices: *const i32,
    count: usize,
    src: *const f32,
) -> i32 {
    ffi_guard!({ set_value_at_indices(name, indices, count, src) })
}

/// Write `src` to the `double` elements at `indices` (`count` of them).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_set_value_at_indices_double(
    name: *const c_char,
    indices: *const i32,
    count: usize,
    src: *const f64,
) -> i32 {
    ffi_guard!({ set_value_at_indices(name, indices, count, src) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_indices_map_out_of_range() {
        assert_eq!(flat_indices(&[0, 7, -1]), vec![0, 7, usize::MAX]);
    }
}
