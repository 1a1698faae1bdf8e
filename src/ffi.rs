//! C entry points for the native library build.
//!
//! Every function returns a non-negative value on success and one of the negative codes
//! below on failure. Handles are the raw integers returned by `bz2d_init`.
use std::os::raw::{c_int, c_long};
use std::slice;

use crate::error::BzError;
use crate::session::{native, SessionHandle};
use crate::tools::options::{InputFormat, SessionOptions};

pub const BZ2D_ERR_INVALID_STATE: c_int = -1;
pub const BZ2D_ERR_TRUNCATED: c_int = -2;
pub const BZ2D_ERR_CORRUPT: c_int = -3;
pub const BZ2D_ERR_PARAM: c_int = -4;

fn error_code(err: &BzError) -> c_int {
    match err {
        BzError::InvalidState(_) => BZ2D_ERR_INVALID_STATE,
        BzError::TruncatedInput { .. } => BZ2D_ERR_TRUNCATED,
        BzError::CorruptBlock(_) => BZ2D_ERR_CORRUPT,
    }
}

fn to_code<T: TryInto<c_long>>(result: crate::error::Result<T>) -> c_long {
    match result {
        Ok(value) => value.try_into().unwrap_or(c_long::MAX),
        Err(e) => error_code(&e) as c_long,
    }
}

#[no_mangle]
pub extern "C" fn bz2d_init_ids() {
    native::init_ids();
}

/// Start a session. `framed` selects the chunked input layout. Returns the new handle, or
/// an error code once no handles are left.
#[no_mangle]
pub extern "C" fn bz2d_init(block_size_hint: c_int, framed: c_int) -> c_int {
    if block_size_hint < 0 {
        return BZ2D_ERR_PARAM;
    }
    let format = if framed != 0 {
        InputFormat::Framed
    } else {
        InputFormat::Raw
    };
    let options = SessionOptions::new().with_format(format);
    match native::init_with_options(block_size_hint as usize, options) {
        Ok(handle) => handle.as_raw(),
        Err(e) => error_code(&e),
    }
}

/// Append `len` compressed bytes to a session's input. Returns 0.
///
/// # Safety
/// `data` must point to `len` readable bytes, or be null when `len` is 0.
#[no_mangle]
pub unsafe extern "C" fn bz2d_supply_input(handle: c_int, data: *const u8, len: usize) -> c_int {
    if data.is_null() && len > 0 {
        return BZ2D_ERR_PARAM;
    }
    let input: &[u8] = if len == 0 {
        &[]
    } else {
        slice::from_raw_parts(data, len)
    };
    match native::supply_input(SessionHandle::from_raw(handle), input) {
        Ok(()) => 0,
        Err(e) => error_code(&e),
    }
}

/// Decompress into `out`. Returns the number of bytes written.
///
/// # Safety
/// `out` must point to `capacity` writable bytes, or be null when `capacity` is 0.
#[no_mangle]
pub unsafe extern "C" fn bz2d_decompress_bytes_direct(
    handle: c_int,
    out: *mut u8,
    capacity: usize,
) -> c_long {
    if out.is_null() && capacity > 0 {
        return BZ2D_ERR_PARAM as c_long;
    }
    let output: &mut [u8] = if capacity == 0 {
        &mut []
    } else {
        slice::from_raw_parts_mut(out, capacity)
    };
    to_code(native::decompress_bytes_direct(
        SessionHandle::from_raw(handle),
        output,
    ))
}

#[no_mangle]
pub extern "C" fn bz2d_consumed_input(handle: c_int) -> c_long {
    to_code(native::get_amount_of_consumed_input(SessionHandle::from_raw(handle)))
}

#[no_mangle]
pub extern "C" fn bz2d_consumed_output(handle: c_int) -> c_long {
    to_code(native::get_amount_of_consumed_output(SessionHandle::from_raw(handle)))
}

#[no_mangle]
pub extern "C" fn bz2d_finish(handle: c_int) -> c_int {
    match native::finish(SessionHandle::from_raw(handle)) {
        Ok(()) => 0,
        Err(e) => error_code(&e),
    }
}

#[no_mangle]
pub extern "C" fn bz2d_finish_all() {
    native::finish_all();
}
