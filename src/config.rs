//! GDAL Configuration Functions
//!
//! GDAL can be configured at runtime using environment variables or by using
//! functions in this module. Options set here are process-wide and override
//! options set in environment variables.
//!
//! ```no_run
//! use ogrio::config::{get_config_option, set_config_options, ConfigValue};
//!
//! set_config_options([("CPL_DEBUG", Some(true))]).unwrap();
//! assert_eq!(get_config_option("CPL_DEBUG").unwrap(), Some(ConfigValue::Bool(true)));
//!
//! // `None` removes the override
//! set_config_options([("CPL_DEBUG", None::<bool>)]).unwrap();
//! ```
//!
//! Refer to [GDAL `ConfigOptions`](https://gdal.org/user/configoptions.html) for
//! a full list of options.

use std::ffi::{c_char, c_void, CString};
use std::fmt::{Display, Formatter};
use std::ptr;
use std::sync::Mutex;

use gdal_sys::{CPLErr, CPLErrorNum, CPLGetErrorHandlerUserData};

use crate::errors::{CplErrType, Result};
use crate::utils::_string;

/// A typed configuration option value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl ConfigValue {
    /// Coerces a raw option string the way it is read back from GDAL.
    ///
    /// All-digit strings become [`ConfigValue::Int`], `ON`/`TRUE`/`YES` and
    /// `OFF`/`FALSE`/`NO` (any case) become [`ConfigValue::Bool`].
    pub fn from_raw(value: &str) -> Self {
        if value.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = value.parse() {
                return ConfigValue::Int(n);
            }
        }
        match value.to_ascii_uppercase().as_str() {
            "ON" | "TRUE" | "YES" => ConfigValue::Bool(true),
            "OFF" | "FALSE" | "NO" => ConfigValue::Bool(false),
            _ => ConfigValue::Text(value.to_string()),
        }
    }
}

impl Display for ConfigValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigValue::Bool(true) => f.write_str("ON"),
            ConfigValue::Bool(false) => f.write_str("OFF"),
            ConfigValue::Int(n) => write!(f, "{n}"),
            ConfigValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Int(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

/// Set a GDAL library configuration option
pub fn set_config_option(key: &str, value: &str) -> Result<()> {
    let c_key = CString::new(key.as_bytes())?;
    let c_val = CString::new(value.as_bytes())?;
    unsafe {
        gdal_sys::CPLSetConfigOption(c_key.as_ptr(), c_val.as_ptr());
    };
    Ok(())
}

/// Clear the value of a GDAL library configuration option, restoring the
/// library default.
pub fn clear_config_option(key: &str) -> Result<()> {
    let c_key = CString::new(key.as_bytes())?;
    unsafe {
        gdal_sys::CPLSetConfigOption(c_key.as_ptr(), ptr::null());
    };
    Ok(())
}

/// Get the raw string value of a GDAL configuration option, or `None` if it
/// is not set.
pub fn get_config_option_raw(key: &str) -> Result<Option<String>> {
    let c_key = CString::new(key.as_bytes())?;
    let rv = unsafe { gdal_sys::CPLGetConfigOption(c_key.as_ptr(), ptr::null()) };
    Ok(_string(rv))
}

/// Set several configuration options at once.
///
/// Booleans are stored as `ON`/`OFF`. A `None` value removes the override.
/// Keys and values are validated before any option is changed.
pub fn set_config_options<I, K, V>(options: I) -> Result<()>
where
    I: IntoIterator<Item = (K, Option<V>)>,
    K: AsRef<str>,
    V: Into<ConfigValue>,
{
    let mut pending = Vec::new();
    for (key, value) in options {
        let c_key = CString::new(key.as_ref())?;
        let c_val = match value {
            Some(value) => Some(CString::new(value.into().to_string())?),
            None => None,
        };
        pending.push((c_key, c_val));
    }

    for (c_key, c_val) in &pending {
        let c_val_ptr = c_val.as_ref().map_or(ptr::null(), |v| v.as_ptr());
        unsafe { gdal_sys::CPLSetConfigOption(c_key.as_ptr(), c_val_ptr) };
    }
    Ok(())
}

/// Get a configuration option with its value coerced (see [`ConfigValue::from_raw`]).
///
/// Returns `None` when the option is unset or empty.
pub fn get_config_option(key: &str) -> Result<Option<ConfigValue>> {
    Ok(get_config_option_raw(key)?
        .filter(|value| !value.is_empty())
        .map(|value| ConfigValue::from_raw(&value)))
}

type ErrorCallbackType = dyn FnMut(CplErrType, i32, &str) + 'static + Send;
// Double-`Box`: the outer box gives a stable address to move in and out of the
// `Mutex`, the inner (sized) box gives a thin pointer to hand over as `c_void`.
type PinnedErrorCallback = Box<Box<ErrorCallbackType>>;

/// Holds the current error callback function
static ERROR_CALLBACK: Mutex<Option<PinnedErrorCallback>> = Mutex::new(None);

/// Set a custom error handler for GDAL.
///
/// The callback is stored in [`ERROR_CALLBACK`] and a pointer to it is passed
/// to GDAL as `pUserData`. It must be `Send` since GDAL may call it from any
/// thread.
pub fn set_error_handler<F>(callback: F)
where
    F: FnMut(CplErrType, i32, &str) + 'static + Send,
{
    unsafe extern "C" fn error_handler(
        error_type: CPLErr::Type,
        error_num: CPLErrorNum,
        error_msg_ptr: *const c_char,
    ) {
        let error_msg = _string(error_msg_ptr).unwrap_or_default();
        let error_type: CplErrType = error_type.into();

        // reconstruct callback from user data pointer
        let callback_raw = CPLGetErrorHandlerUserData();
        let callback: &mut Box<ErrorCallbackType> = &mut *(callback_raw as *mut Box<_>);

        callback(error_type, error_num, &error_msg);
    }

    // pin memory location of callback for sending its pointer to GDAL
    let mut callback: PinnedErrorCallback = Box::new(Box::new(callback));

    let callback_ref: &mut Box<ErrorCallbackType> = callback.as_mut();

    let mut callback_lock = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard,
        // poisoning could only occur on `CPLSetErrorHandler(Ex)` panicking
        Err(poison_error) => poison_error.into_inner(),
    };

    // changing the error callback is fenced by the callback lock
    unsafe {
        gdal_sys::CPLSetErrorHandlerEx(Some(error_handler), callback_ref as *mut _ as *mut c_void);
    };

    // store callback in static variable so we avoid a dangling pointer
    callback_lock.replace(callback);
}

/// Remove a custom error handler for GDAL.
pub fn remove_error_handler() {
    let mut callback_lock = match ERROR_CALLBACK.lock() {
        Ok(guard) => guard,
        Err(poison_error) => poison_error.into_inner(),
    };

    unsafe {
        gdal_sys::CPLSetErrorHandler(None);
    };

    callback_lock.take();
}

/// Forward GDAL's diagnostic messages to the [`log`] facade.
///
/// Debug messages (emitted when `CPL_DEBUG` is on) go to `debug!`, warnings
/// to `warn!`, failures to `error!`.
pub fn route_errors_to_log() {
    set_error_handler(|class, number, msg| match class {
        CplErrType::None => {}
        CplErrType::Debug => log::debug!(target: "gdal", "{msg}"),
        CplErrType::Warning => log::warn!(target: "gdal", "{msg} (CPLE {number})"),
        CplErrType::Failure | CplErrType::Fatal => {
            log::error!(target: "gdal", "{msg} (CPLE {number})")
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_options() {
        // GDAL config options are process-wide, so the scenarios run
        // sequentially to avoid data races.

        test_set_get_option();

        test_set_option_with_embedded_nul();

        test_clear_option();

        test_set_options_coercion();

        test_reset_options();
    }

    fn test_set_get_option() {
        assert!(set_config_option("GDAL_CACHEMAX", "128").is_ok());
        assert_eq!(
            get_config_option_raw("GDAL_CACHEMAX").unwrap(),
            Some("128".to_string())
        );
        assert_eq!(
            get_config_option("GDAL_CACHEMAX").unwrap(),
            Some(ConfigValue::Int(128))
        );
        assert_eq!(get_config_option("NON_EXISTANT_OPTION").unwrap(), None);
        clear_config_option("GDAL_CACHEMAX").unwrap();
    }

    fn test_set_option_with_embedded_nul() {
        assert!(set_config_option("f\0oo", "valid").is_err());
        assert!(set_config_option("foo", "in\0valid").is_err());
        assert!(set_config_options([("OGRIO_NUL_TEST", Some("in\0valid"))]).is_err());
        assert_eq!(get_config_option("OGRIO_NUL_TEST").unwrap(), None);
    }

    fn test_clear_option() {
        assert!(set_config_option("TEST_OPTION", "256").is_ok());
        assert_eq!(
            get_config_option("TEST_OPTION").unwrap(),
            Some(ConfigValue::Int(256))
        );
        assert!(clear_config_option("TEST_OPTION").is_ok());
        assert_eq!(get_config_option("TEST_OPTION").unwrap(), None);
    }

    fn test_set_options_coercion() {
        set_config_options([("OGRIO_TEST_FLAG", Some("ON"))]).unwrap();
        assert_eq!(
            get_config_option("OGRIO_TEST_FLAG").unwrap(),
            Some(ConfigValue::Bool(true))
        );

        set_config_options([("OGRIO_TEST_FLAG", Some(false))]).unwrap();
        assert_eq!(
            get_config_option_raw("OGRIO_TEST_FLAG").unwrap(),
            Some("OFF".to_string())
        );

        set_config_options([("OGRIO_TEST_FLAG", Some(42_i64))]).unwrap();
        assert_eq!(
            get_config_option("OGRIO_TEST_FLAG").unwrap(),
            Some(ConfigValue::Int(42))
        );

        set_config_options([("OGRIO_TEST_FLAG", None::<bool>)]).unwrap();
        assert_eq!(get_config_option("OGRIO_TEST_FLAG").unwrap(), None);
    }

    fn test_reset_options() {
        set_config_options([("OGRIO_A", Some("bar")), ("OGRIO_B", Some("yes"))]).unwrap();
        assert_eq!(
            get_config_option("OGRIO_A").unwrap(),
            Some(ConfigValue::Text("bar".to_string()))
        );
        assert_eq!(
            get_config_option("OGRIO_B").unwrap(),
            Some(ConfigValue::Bool(true))
        );

        set_config_options([("OGRIO_A", None::<&str>), ("OGRIO_B", None)]).unwrap();
        assert_eq!(get_config_option("OGRIO_A").unwrap(), None);
        assert_eq!(get_config_option("OGRIO_B").unwrap(), None);
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(ConfigValue::from_raw("on"), ConfigValue::Bool(true));
        assert_eq!(ConfigValue::from_raw("No"), ConfigValue::Bool(false));
        assert_eq!(ConfigValue::from_raw("1024"), ConfigValue::Int(1024));
        assert_eq!(ConfigValue::from_raw("-1"), ConfigValue::Text("-1".into()));
        assert_eq!(ConfigValue::from_raw("bar"), ConfigValue::Text("bar".into()));
        assert_eq!(ConfigValue::Bool(false).to_string(), "OFF");
    }
}
