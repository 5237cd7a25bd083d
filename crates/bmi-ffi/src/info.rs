//! Variable metadata: item counts, names, type, units, grid, sizes.
//!
//! Unknown names fail with `UnknownVariable` before any out-parameter is
//! written.

#![allow(unsafe_code)]

use std::ffi::c_char;

use bmi_adapter::Adapter;
use bmi_catalog::CatalogError;
use bmi_core::VarRole;

use crate::buffer::{self, c_int, FfiResult};
use crate::instance::with_adapter;

fn item_count(role: VarRole, out: *mut i32) -> i32 {
    with_adapter(|a| {
        let n = c_int(a.catalog().variable_count(role))?;
        // SAFETY: out is valid for one write per caller contract.
        unsafe { buffer::write_out(out, n) }
    })
}

fn var_names(role: VarRole, names: *mut c_char, count: usize, name_len: usize) -> i32 {
    with_adapter(|a| {
        let list = a.catalog().variable_names(role);
        // SAFETY: names is valid for count * name_len bytes per caller contract.
        unsafe { buffer::write_name_table(names, count, name_len, &list) }
    })
}

/// Look up a string property of the variable named by `name`.
fn var_str(
    name: *const c_char,
    buf: *mut c_char,
    len: usize,
    query: fn(&Adapter, &str) -> Result<String, CatalogError>,
) -> i32 {
    with_adapter(|a| {
        // SAFETY: name is NUL-terminated per caller contract.
        let name = unsafe { buffer::c_str(name) }?;
        let value = query(a, name)?;
        // SAFETY: buf is valid for len bytes per caller contract.
        unsafe { buffer::write_c_str(buf, len, &value) }
    })
}

/// Look up an integer property of the variable named by `name`.
fn var_int(
    name: *const c_char,
    out: *mut i32,
    query: fn(&Adapter, &str) -> Result<usize, CatalogError>,
) -> i32 {
    with_adapter(|a| -> FfiResult {
        // SAFETY: name is NUL-terminated per caller contract.
        let name = unsafe { buffer::c_str(name) }?;
        let value = c_int(query(a, name)?)?;
        // SAFETY: out is valid for one write per caller contract.
        unsafe { buffer::write_out(out, value) }
    })
}

/// Number of input variables.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_input_item_count(out: *mut i32) -> i32 {
    ffi_guard!({ item_count(VarRole::Input, out) })
}

/// Number of output variables.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_output_item_count(out: *mut i32) -> i32 {
    ffi_guard!({ item_count(VarRole::Output, out) })
}

/// Input names as `count` rows of `name_len` bytes, each NUL-terminated.
///
/// `BufferTooSmall` if `count` is below the item count or any name
/// does not fit its row.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_input_var_names(
    names: *mut c_char,
    count: usize,
    name_len: usize,
) -> i32 {
    ffi_guard!({ var_names(VarRole::Input, names, count, name_len) })
}

/// Output names, laid out as for [`bmi_get_input_var_names`].
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_output_var_names(
    names: *mut c_char,
    count: usize,
    name_len: usize,
) -> i32 {
    ffi_guard!({ var_names(VarRole::Output, names, count, name_len) })
}

/// Element type name: `"int"`, `"float"` or `"double"`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_var_type(name: *const c_char, buf: *mut c_char, len: usize) -> i32 {
    ffi_guard!({
        var_str(name, buf, len, |a, n| {
            a.catalog().var_type(n).map(|t| t.bmi_name().to_string())
        })
    })
}

/// Unit string.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_var_units(name: *const c_char, buf: *mut c_char, len: usize) -> i32 {
    ffi_guard!({ var_str(name, buf, len, |a, n| a.catalog().var_units(n).map(str::to_string)) })
}

/// Grid location: `"node"`, `"face"` or `"none"`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_var_location(name: *const c_char, buf: *mut c_char, len: usize) -> i32 {
    ffi_guard!({
        var_str(name, buf, len, |a, n| {
            a.catalog().var_location(n).map(|l| l.bmi_name().to_string())
        })
    })
}

/// Grid id.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_var_grid(name: *const c_char, out: *mut i32) -> i32 {
    ffi_guard!({
        with_adapter(|a| {
            // SAFETY: name is NUL-terminated per caller contract.
            let name = unsafe { buffer::c_str(name) }?;
            let grid = a.catalog().var_grid(name)?;
            // SAFETY: out is valid for one write per caller contract.
            unsafe { buffer::write_out(out, grid.0) }
        })
    })
}

/// Bytes per element.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_var_itemsize(name: *const c_char, out: *mut i32) -> i32 {
    ffi_guard!({ var_int(name, out, |a, n| a.catalog().var_itemsize(n)) })
}

/// Bytes in the whole variable. Needs an initialized instance.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_var_nbytes(name: *const c_char, out: *mut i32) -> i32 {
    ffi_guard!({ var_int(name, out, |a, n| a.catalog().var_nbytes(n)) })
}
