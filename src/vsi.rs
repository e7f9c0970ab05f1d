//! GDAL virtual file systems
//!
//! Maps user-facing paths (zip archives, URLs) onto GDAL's `/vsi*/` prefixes
//! and manages `/vsimem/` in-memory files.

use std::mem::ManuallyDrop;
use std::path::{Path, PathBuf};

use gdal_sys::{VSIFCloseL, VSIFileFromMemBuffer, VSIFree, VSIGetMemFileBuffer, VSIUnlink};

use crate::errors::{OgrioError, Result};
use crate::utils::{_last_null_pointer_err, _path_to_c_string, _string_array};

const SCHEMES: &[(&str, &str)] = &[
    ("zip", "vsizip"),
    ("tar", "vsitar"),
    ("gzip", "vsigzip"),
    ("s3", "vsis3"),
    ("gs", "vsigs"),
    ("az", "vsiaz"),
    ("adl", "vsiadls"),
    ("file", ""),
];

fn vsi_prefix(scheme: &str) -> Option<String> {
    let scheme = scheme.to_ascii_lowercase();
    if scheme == "http" || scheme == "https" {
        return Some("vsicurl".to_string());
    }
    SCHEMES
        .iter()
        .find(|(name, _)| *name == scheme)
        .map(|(_, prefix)| prefix.to_string())
}

/// Translates a user path into the path GDAL should open.
///
/// - paths already starting with `/vsi` are returned unchanged
/// - `zip://a.zip` → `/vsizip/a.zip`, `s3://bucket/key` → `/vsis3/bucket/key`
/// - `https://host/a.gpkg` → `/vsicurl/https://host/a.gpkg`
/// - chained schemes: `zip+s3://bucket/a.zip` → `/vsizip/vsis3/bucket/a.zip`
/// - a bare `*.zip` path → `/vsizip/<path>`
pub fn vsi_path(path: &str) -> String {
    if path.starts_with("/vsi") {
        return path.to_string();
    }

    if let Some((schemes, rest)) = path.split_once("://") {
        let mut prefixes = Vec::new();
        let mut keep_url = false;
        for scheme in schemes.split('+') {
            match vsi_prefix(scheme) {
                Some(prefix) if prefix == "vsicurl" => {
                    prefixes.push(prefix);
                    keep_url = true;
                }
                Some(prefix) if prefix.is_empty() => {}
                Some(prefix) => prefixes.push(prefix),
                // not a scheme we know, e.g. a Windows drive or a driver prefix
                None => return path.to_string(),
            }
        }

        let target = if keep_url {
            let url_scheme = schemes
                .split('+')
                .find(|s| s.eq_ignore_ascii_case("http") || s.eq_ignore_ascii_case("https"))
                .unwrap_or("https");
            format!("{url_scheme}://{rest}")
        } else {
            rest.to_string()
        };

        if prefixes.is_empty() {
            // plain file:// URL
            return target;
        }
        return format!("/{}/{}", prefixes.join("/"), target);
    }

    if path.to_ascii_lowercase().ends_with(".zip") {
        return format!("/vsizip/{path}");
    }

    path.to_string()
}

/// [`vsi_path`] for filesystem paths.
pub(crate) fn resolve_source(path: &Path) -> PathBuf {
    PathBuf::from(vsi_path(&path.to_string_lossy()))
}

/// Whether `path` exists, on disk or in a virtual file system.
pub fn path_exists<P: AsRef<Path>>(path: P) -> bool {
    let Ok(c_path) = _path_to_c_string(path.as_ref()) else {
        return false;
    };
    let mut stat: gdal_sys::VSIStatBufL = unsafe { std::mem::zeroed() };
    unsafe { gdal_sys::VSIStatL(c_path.as_ptr(), &mut stat) == 0 }
}

/// Read the file names from a virtual file system with optional recursion.
pub fn read_dir<P: AsRef<Path>>(path: P, recursive: bool) -> Result<Vec<PathBuf>> {
    let path = _path_to_c_string(path.as_ref())?;
    let data = if recursive {
        unsafe { gdal_sys::VSIReadDirRecursive(path.as_ptr()) }
    } else {
        unsafe { gdal_sys::VSIReadDir(path.as_ptr()) }
    };
    if data.is_null() {
        return Err(_last_null_pointer_err("VSIReadDir"));
    }

    let strings = _string_array(data);
    unsafe { gdal_sys::CSLDestroy(data) };
    Ok(strings.into_iter().map(PathBuf::from).collect())
}

/// Creates a new VSIMemFile from a given buffer.
pub fn create_mem_file<P: AsRef<Path>>(file_name: P, data: Vec<u8>) -> Result<()> {
    let file_name = _path_to_c_string(file_name.as_ref())?;

    // ownership will be given to GDAL, so it should not be automatically dropped
    let mut data = ManuallyDrop::new(data);

    let handle = unsafe {
        VSIFileFromMemBuffer(
            file_name.as_ptr(),
            data.as_mut_ptr(),
            data.len() as u64,
            true as i32,
        )
    };

    if handle.is_null() {
        // on error, allow dropping the data again
        ManuallyDrop::into_inner(data);
        return Err(_last_null_pointer_err("VSIFileFromMemBuffer"));
    }

    unsafe {
        VSIFCloseL(handle);
    }

    Ok(())
}

/// Unlink (delete) a virtual file.
pub fn unlink_mem_file<P: AsRef<Path>>(file_name: P) -> Result<()> {
    let file_name_c = _path_to_c_string(file_name.as_ref())?;

    let rv = unsafe { VSIUnlink(file_name_c.as_ptr()) };

    if rv != 0 {
        return Err(OgrioError::BadArgument(format!(
            "unable to unlink virtual file '{}'",
            file_name.as_ref().display()
        )));
    }

    Ok(())
}

/// Copies the bytes of the VSIMemFile with given `file_name`, leaving the
/// file in place.
pub fn get_vsi_mem_file_bytes_owned<P: AsRef<Path>>(file_name: P) -> Result<Vec<u8>> {
    let file_name = _path_to_c_string(file_name.as_ref())?;

    let mut length: u64 = 0;
    let bytes = unsafe {
        let buffer = VSIGetMemFileBuffer(file_name.as_ptr(), &mut length, false as i32);
        if buffer.is_null() {
            return Err(_last_null_pointer_err("VSIGetMemFileBuffer"));
        }
        std::slice::from_raw_parts(buffer, length as usize).to_vec()
    };

    Ok(bytes)
}

/// Takes ownership of the bytes of the VSIMemFile with given `file_name`
/// and removes the file.
pub fn take_vsi_mem_file_bytes<P: AsRef<Path>>(file_name: P) -> Result<Vec<u8>> {
    let file_name = _path_to_c_string(file_name.as_ref())?;

    let mut length: u64 = 0;
    let bytes = unsafe {
        let buffer = VSIGetMemFileBuffer(file_name.as_ptr(), &mut length, true as i32);
        if buffer.is_null() {
            return Err(_last_null_pointer_err("VSIGetMemFileBuffer"));
        }
        let bytes = std::slice::from_raw_parts(buffer, length as usize).to_vec();
        VSIFree(buffer.cast());
        bytes
    };

    Ok(bytes)
}
