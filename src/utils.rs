use std::ffi::{c_char, c_void, CStr, CString};
use std::path::Path;

use gdal_sys::CPLErr;

use crate::errors::*;

/// Copies a GDAL-owned C string into a Rust `String`.
///
/// Returns `None` for a null pointer.
pub fn _string(raw_ptr: *const c_char) -> Option<String> {
    if raw_ptr.is_null() {
        None
    } else {
        let c_str = unsafe { CStr::from_ptr(raw_ptr) };
        Some(c_str.to_string_lossy().into_owned())
    }
}

/// Copies a C string that was allocated by GDAL for the caller, then frees it.
pub fn _owned_string(raw_ptr: *mut c_char) -> Option<String> {
    let value = _string(raw_ptr);
    if !raw_ptr.is_null() {
        unsafe { gdal_sys::VSIFree(raw_ptr as *mut c_void) };
    }
    value
}

pub fn _string_array(raw_ptr: *mut *mut c_char) -> Vec<String> {
    let mut ret_val: Vec<String> = vec![];
    if raw_ptr.is_null() {
        return ret_val;
    }
    let mut i = 0;
    unsafe {
        loop {
            let next = raw_ptr.add(i).read();
            if next.is_null() {
                break;
            }
            if let Some(value) = _string(next) {
                ret_val.push(value);
            }
            i += 1;
        }
    }
    ret_val
}

pub fn _last_error_msg() -> String {
    _string(unsafe { gdal_sys::CPLGetLastErrorMsg() }).unwrap_or_default()
}

pub fn _last_cpl_err(cpl_err_class: CPLErr::Type) -> OgrioError {
    let last_err_no = unsafe { gdal_sys::CPLGetLastErrorNo() };
    let last_err_msg = _last_error_msg();
    unsafe { gdal_sys::CPLErrorReset() };
    OgrioError::CplError {
        class: cpl_err_class.into(),
        number: last_err_no,
        msg: last_err_msg,
    }
}

pub fn _last_null_pointer_err(method_name: &'static str) -> OgrioError {
    let last_err_msg = _last_error_msg();
    unsafe { gdal_sys::CPLErrorReset() };
    OgrioError::NullPointer {
        method_name,
        msg: last_err_msg,
    }
}

pub fn _path_to_c_string(path: &Path) -> Result<CString> {
    let path_str = path.to_string_lossy();
    CString::new(path_str.as_ref()).map_err(Into::into)
}
