/// C ABI exports for shared library consumers.
use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::Path;

use crate::codec::OutputFormat;
use crate::error::OrientError;
use crate::pipeline::{orient_with, process_file, OrientParams};

// Error codes returned to C callers.
pub const UPRIGHTIFY_OK: i32 = 0;
pub const UPRIGHTIFY_ERROR_INVALID_INPUT_PATH: i32 = -1;
pub const UPRIGHTIFY_ERROR_INVALID_OUTPUT_PATH: i32 = -2;
pub const UPRIGHTIFY_ERROR_DECODE: i32 = -3;
pub const UPRIGHTIFY_ERROR_ENCODE: i32 = -4;
pub const UPRIGHTIFY_ERROR_IO: i32 = -5;
pub const UPRIGHTIFY_ERROR_BUFFER_TOO_SMALL: i32 = -6;
pub const UPRIGHTIFY_ERROR_INTERNAL: i32 = -7;

fn error_code(err: &OrientError) -> i32 {
    match err {
        OrientError::Decode(_) => UPRIGHTIFY_ERROR_DECODE,
        OrientError::Encode(_) => UPRIGHTIFY_ERROR_ENCODE,
        OrientError::Io(_) => UPRIGHTIFY_ERROR_IO,
        OrientError::OutOfBounds { .. } | OrientError::InvalidBuffer(_) => {
            UPRIGHTIFY_ERROR_INTERNAL
        }
    }
}

/// Orient an image file and write the result. `png` selects PNG output, otherwise JPEG.
/// Returns 0 on success, negative error codes on failure.
///
/// # Safety
/// `input_path` and `output_path` must be valid null-terminated UTF-8 strings.
#[no_mangle]
pub unsafe extern "C" fn uprightify_orient_file(
    input_path: *const c_char,
    output_path: *const c_char,
    max_dimension: u32,
    png: bool,
) -> i32 {
    let input = match unsafe { CStr::from_ptr(input_path) }.to_str() {
        Ok(s) => s,
        Err(_) => return UPRIGHTIFY_ERROR_INVALID_INPUT_PATH,
    };
    let output = match unsafe { CStr::from_ptr(output_path) }.to_str() {
        Ok(s) => s,
        Err(_) => return UPRIGHTIFY_ERROR_INVALID_OUTPUT_PATH,
    };

    let params = params_for(max_dimension, png);
    match process_file(Path::new(input), Path::new(output), &params) {
        Ok(_) => UPRIGHTIFY_OK,
        Err(e) => error_code(&e),
    }
}

/// Orient an encoded image held in memory.
///
/// On success the encoded result is copied into `output_data` and its length
/// is written to `output_len`. If `output_capacity` is too small, the required
/// length is still written to `output_len` and
/// `UPRIGHTIFY_ERROR_BUFFER_TOO_SMALL` is returned.
///
/// # Safety
/// - `input_data` must be valid for `input_len` bytes (or null when `input_len` is 0).
/// - `output_data` must be valid for `output_capacity` bytes.
/// - `output_len` must be a valid pointer.
#[no_mangle]
pub unsafe extern "C" fn uprightify_orient_bytes(
    input_data: *const u8,
    input_len: usize,
    output_data: *mut u8,
    output_capacity: usize,
    output_len: *mut usize,
    max_dimension: u32,
    png: bool,
) -> i32 {
    let input: &[u8] = if input_len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(input_data, input_len) }
    };

    let params = params_for(max_dimension, png);
    let outcome = match orient_with(input, &params) {
        Ok(o) => o,
        Err(e) => return error_code(&e),
    };

    unsafe { *output_len = outcome.image.len() };
    if outcome.image.len() > output_capacity {
        return UPRIGHTIFY_ERROR_BUFFER_TOO_SMALL;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(outcome.image.as_ptr(), output_data, outcome.image.len());
    }
    UPRIGHTIFY_OK
}

/// `max_dimension == 0` keeps the default bound.
fn params_for(max_dimension: u32, png: bool) -> OrientParams {
    let mut params = OrientParams::standard();
    if max_dimension > 0 {
        params.max_dimension = max_dimension;
    }
    if png {
        params.output = OutputFormat::Png;
    }
    params
}
