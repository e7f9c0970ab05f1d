//! GDAL version inspection
//!
//! ```rust, no_run
//! let (major, minor, patch) = ogrio::version::gdal_version().unwrap();
//! println!("linked against GDAL {major}.{minor}.{patch}");
//! println!("{}", ogrio::version::VersionInfo::VERSION_SUMMARY);
//! ```

use std::ffi::CString;
use std::fmt::{Debug, Display, Formatter};

use crate::errors::{OgrioError, Result};
use crate::utils::_string;

/// Calls `GDALVersionInfo`, expecting `key` as one of the following values:
///
/// “VERSION_NUM”, “RELEASE_DATE”, “RELEASE_NAME”, "--version”, “LICENSE”, “BUILD_INFO”.
pub fn version_info(key: &str) -> String {
    let Ok(c_key) = CString::new(key.as_bytes()) else {
        return String::new();
    };
    _string(unsafe { gdal_sys::GDALVersionInfo(c_key.as_ptr()) }).unwrap_or_default()
}

/// The `(major, minor, patch)` version of the GDAL library in use.
pub fn gdal_version() -> Result<(u32, u32, u32)> {
    let version_num = VersionInfo::VERSION_NUM.to_string();
    let number: u32 = version_num.trim().parse().map_err(|_| {
        OgrioError::BadArgument(format!("unexpected GDAL version number '{version_num}'"))
    })?;
    let major = number / 1_000_000;
    let minor = (number / 10_000) % 100;
    let patch = (number / 100) % 100;
    Ok((major, minor, patch))
}

/// Selector for the properties of the GDAL version information.
///
/// `Display` fetches the associated value from GDAL.
#[allow(non_camel_case_types)]
#[non_exhaustive]
#[derive(Copy, Clone, Default)]
pub enum VersionInfo {
    /// One line version message, i.e. “GDAL 3.8.4, released 2024/02/08”
    #[default]
    VERSION_SUMMARY,
    /// GDAL_VERSION_NUM formatted as a string, i.e. “3080400”
    VERSION_NUM,
    /// GDAL_RELEASE_DATE formatted as a string, i.e. “20240208”
    RELEASE_DATE,
    /// GDAL_RELEASE_NAME, i.e. “3.8.4”
    RELEASE_NAME,
    /// NAME=VALUE pairs separated by newlines with build time options.
    BUILD_INFO,
}

impl VersionInfo {
    /// Get the variant's name
    pub fn name(&self) -> &'static str {
        match self {
            VersionInfo::VERSION_SUMMARY => "VERSION_SUMMARY",
            VersionInfo::VERSION_NUM => "VERSION_NUM",
            VersionInfo::RELEASE_DATE => "RELEASE_DATE",
            VersionInfo::RELEASE_NAME => "RELEASE_NAME",
            VersionInfo::BUILD_INFO => "BUILD_INFO",
        }
    }

    fn gdal_key(&self) -> &'static str {
        match self {
            VersionInfo::VERSION_SUMMARY => "--version",
            other => other.name(),
        }
    }
}

impl Debug for VersionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionInfo::BUILD_INFO => {
                // GDAL returns KEY=VALUE lines; render them as struct fields
                let mut builder = f.debug_struct("");
                let text = self.to_string();
                text.lines()
                    .filter_map(|l| l.split_once('='))
                    .for_each(|(key, value)| {
                        builder.field(key, &value);
                    });
                builder.finish()
            }
            i => f.debug_tuple(i.name()).field(&i.to_string()).finish(),
        }
    }
}

impl Display for VersionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&version_info(self.gdal_key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info() {
        let release_date = version_info("RELEASE_DATE");
        let release_name = version_info("RELEASE_NAME");
        let version_text = version_info("--version");

        let mut date_iter = release_date.chars();

        let expected_text: String = format!(
            "GDAL {}, released {}/{}/{}",
            release_name,
            date_iter.by_ref().take(4).collect::<String>(),
            date_iter.by_ref().take(2).collect::<String>(),
            date_iter.by_ref().take(2).collect::<String>(),
        );

        assert_eq!(version_text, expected_text);
    }

    #[test]
    fn test_gdal_version() {
        let (major, minor, patch) = gdal_version().unwrap();
        assert!(major >= 3);
        let release_name = VersionInfo::RELEASE_NAME.to_string();
        assert!(release_name.starts_with(&format!("{major}.{minor}.{patch}")));
    }
}
