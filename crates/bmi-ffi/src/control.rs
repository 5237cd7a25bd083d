//! Control functions: register, initialize, update, finalize.

use std::ffi::c_char;

use bmi_core::Communicator;

use crate::buffer;
use crate::instance::{with_adapter, with_new_or_live};
use crate::status::BmiStatus;

/// Claim the engine for this process.
///
/// Creates the instance if there is none, or if the previous one was
/// finalized. Calling it again on a live instance returns
/// `SingletonViolation` and leaves that instance untouched.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_register() -> i32 {
    ffi_guard!({ with_new_or_live(|a| a.register().map_err(BmiStatus::from)) })
}

/// Initialize from a descriptor: a file path, or inline configuration text.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_initialize(config: *const c_char) -> i32 {
    ffi_guard!({
        // SAFETY: config is null or NUL-terminated per caller contract.
        let descriptor = match unsafe { buffer::c_str(config) } {
            Ok(d) => d,
            Err(status) => return status as i32,
        };
        with_adapter(|a| a.initialize(descriptor).map_err(BmiStatus::from))
    })
}

/// Advance the model by one time step.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_update() -> i32 {
    ffi_guard!({ with_adapter(|a| a.update().map_err(BmiStatus::from)) })
}

/// Advance the model to the first step boundary at or after `time`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_update_until(time: f64) -> i32 {
    ffi_guard!({ with_adapter(|a| a.update_until(time).map_err(BmiStatus::from)) })
}

/// Tear down the engine and the parallel runtime.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_finalize() -> i32 {
    ffi_guard!({ with_adapter(|a| a.finalize().map_err(BmiStatus::from)) })
}

/// Hand the engine a communicator before `bmi_initialize`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_set_communicator(comm: i32) -> i32 {
    ffi_guard!({
        with_new_or_live(|a| {
            a.set_communicator(Communicator(comm))
                .map_err(BmiStatus::from)
        })
    })
}

/// Copy the component name into `buf` (`len` bytes, NUL included).
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_get_component_name(buf: *mut c_char, len: usize) -> i32 {
    ffi_guard!({
        // SAFETY: buf is valid for len bytes per caller contract.
        with_adapter(|a| unsafe { buffer::write_c_str(buf, len, a.component_name()) })
    })
}

/// Copy the symbolic name of `status` into `buf` (`len` bytes, NUL
/// included). Unknown codes are `InvalidArgument`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn bmi_status_name(status: i32, buf: *mut c_char, len: usize) -> i32 {
    ffi_guard!({
        let Some(status) = BmiStatus::from_code(status) else {
            return BmiStatus::InvalidArgument as i32;
        };
        // SAFETY: buf is valid for len bytes per caller contract.
        buffer::code(unsafe { buffer::write_c_str(buf, len, status.name()) })
    })
}
