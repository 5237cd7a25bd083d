//! Time queries.

use std::ffi::c_char;

use bmi_adapter::{Adapter, AdapterError};

use crate::buffer;
use crate::instance::with_adapter;
use crate::status::BmiStatus;

#[allow(unsafe_code)]
fn time_query(out: *mut f64, query: fn(&Adapter) -> Result<f64, AdapterError>) -> i32 {
    with_adapter(|a| {
        let value = query(a)?;
        // SAFETY: out is valid for one write per caller contract.
        unsafe { buffer::write_out(out, value) }
    })
}

/// Model time at initialization.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_start_time(out: *mut f64) -> i32 {
    ffi_guard!({ time_query(out, Adapter::start_time) })
}

/// Last reachable model time.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_end_time(out: *mut f64) -> i32 {
    ffi_guard!({ time_query(out, Adapter::end_time) })
}

/// Current model time.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_current_time(out: *mut f64) -> i32 {
    ffi_guard!({ time_query(out, Adapter::current_time) })
}

/// Length of one `bmi_update`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_time_step(out: *mut f64) -> i32 {
    ffi_guard!({ time_query(out, Adapter::time_step) })
}

/// Copy the time unit string into `buf` (`len` bytes, NUL included).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_time_units(buf: *mut c_char, len: usize) -> i32 {
    ffi_guard!({
        with_adapter(|a| {
            let units = a.time_units().map_err(BmiStatus::from)?;
            // SAFETY: buf is valid for len bytes per caller contract.
            unsafe { buffer::write_c_str(buf, len, units) }
        })
    })
}
