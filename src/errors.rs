use std::ffi::NulError;
use std::path::PathBuf;

use gdal_sys::{CPLErr, OGRErr, OGRwkbGeometryType};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, OgrioError>;

#[derive(Clone, Debug, Error)]
pub enum OgrioError {
    #[error("FfiNulError")]
    FfiNulError(#[from] NulError),
    #[error("CPL error class: '{class:?}', error number: '{number}', error msg: '{msg}'")]
    CplError {
        class: CplErrType,
        number: i32,
        msg: String,
    },
    #[error("GDAL method '{method_name}' returned a NULL pointer. Error msg: '{msg}'")]
    NullPointer {
        method_name: &'static str,
        msg: String,
    },
    #[error("OGR method '{method_name}' returned error: '{err:?}'")]
    OgrError {
        err: OGRErr::Type,
        method_name: &'static str,
    },
    #[error("Unable to open data source '{}': {msg}", path.display())]
    DataSource { path: PathBuf, msg: String },
    #[error("Layer '{name}' could not be opened")]
    LayerNotFound { name: String },
    #[error("Layer index {index} out of range, data source has {count} layer(s)")]
    LayerIndexOutOfRange { index: usize, count: usize },
    #[error("Geometry type is not supported: '{name}' ({ogr_type})")]
    UnsupportedGeometryType {
        ogr_type: OGRwkbGeometryType::Type,
        name: String,
    },
    #[error("Invalid SQL query '{query}': {msg}")]
    InvalidQuery { query: String, msg: String },
    #[error("Could not infer driver from path '{}'", path.display())]
    DriverNotDetected { path: PathBuf },
    #[error("Driver '{driver}' does not support write functionality")]
    DriverCannotWrite { driver: String },
    #[error("Bad argument: {0}")]
    BadArgument(String),
}

/// A wrapper for [`CPLErr::Type`] that reflects it as an enum
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(C)]
pub enum CplErrType {
    None = 0,
    Debug = 1,
    Warning = 2,
    Failure = 3,
    Fatal = 4,
}

impl From<CPLErr::Type> for CplErrType {
    fn from(error_type: CPLErr::Type) -> Self {
        if error_type > 4 {
            return Self::None; // fallback type, should not happen
        }

        unsafe { std::mem::transmute(error_type) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpl_err_type_conversion() {
        assert_eq!(CplErrType::from(CPLErr::CE_Warning), CplErrType::Warning);
        assert_eq!(CplErrType::from(CPLErr::CE_Failure), CplErrType::Failure);
        assert_eq!(CplErrType::from(42), CplErrType::None);
    }

    #[test]
    fn test_error_display() {
        let err = OgrioError::LayerNotFound {
            name: "missing".to_string(),
        };
        assert_eq!(err.to_string(), "Layer 'missing' could not be opened");

        let err = OgrioError::LayerIndexOutOfRange { index: 3, count: 1 };
        assert_eq!(
            err.to_string(),
            "Layer index 3 out of range, data source has 1 layer(s)"
        );
    }
}
