//! GDAL string lists
//!
//! Safe wrapper around the `char **papszStrList` structure GDAL uses to pass
//! `KEY=VALUE` open, creation and layer options.

use std::ffi::{c_char, CString};
use std::fmt::{Debug, Formatter};
use std::ptr;

use gdal_sys::{CSLCount, CSLDestroy, CSLFetchNameValue, CSLSetNameValue};

use crate::errors::{OgrioError, Result};
use crate::utils::_string;

/// Wraps a [`gdal_sys::CSLConstList`] (a null-terminated array of
/// null-terminated strings) and frees it on `drop`.
pub struct CslStringList {
    list_ptr: *mut *mut c_char,
}

impl CslStringList {
    /// Creates an empty GDAL string list.
    pub fn new() -> Self {
        Self {
            list_ptr: ptr::null_mut(),
        }
    }

    /// Assigns `value` to `name`.
    ///
    /// Overwrites duplicate `name`s. Fails if `name` has characters other than
    /// ASCII alphanumerics and `_`, or if `value` contains a line break.
    pub fn set_name_value(&mut self, name: &str, value: &str) -> Result<()> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(OgrioError::BadArgument(format!(
                "Invalid characters in name: '{name}'"
            )));
        }
        if value.contains(['\n', '\r']) {
            return Err(OgrioError::BadArgument(format!(
                "Invalid characters in value: '{value}'"
            )));
        }
        let psz_name = CString::new(name)?;
        let psz_value = CString::new(value)?;

        unsafe {
            self.list_ptr = CSLSetNameValue(self.list_ptr, psz_name.as_ptr(), psz_value.as_ptr());
        }

        Ok(())
    }

    /// Parses a `KEY=VALUE` entry and assigns it.
    pub fn add_name_value_pair(&mut self, entry: &str) -> Result<()> {
        match entry.split_once('=') {
            Some((name, value)) => self.set_name_value(name.trim(), value),
            None => Err(OgrioError::BadArgument(format!(
                "Option '{entry}' is not of the form KEY=VALUE"
            ))),
        }
    }

    /// Looks up the value corresponding to `key`.
    pub fn fetch_name_value(&self, key: &str) -> Result<Option<String>> {
        let key = CString::new(key)?;
        let c_value = unsafe { CSLFetchNameValue(self.as_ptr(), key.as_ptr()) };
        Ok(_string(c_value))
    }

    /// Number of entries in the list.
    pub fn len(&self) -> usize {
        (unsafe { CSLCount(self.as_ptr()) }) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get an iterator over the name/value elements of the list.
    pub fn iter(&self) -> CslStringListIterator<'_> {
        CslStringListIterator {
            list: self,
            idx: 0,
            count: self.len(),
        }
    }

    /// Get the raw pointer to the underlying data.
    pub fn as_ptr(&self) -> gdal_sys::CSLConstList {
        self.list_ptr
    }
}

impl Drop for CslStringList {
    fn drop(&mut self) {
        unsafe { CSLDestroy(self.list_ptr) }
    }
}

impl Default for CslStringList {
    fn default() -> Self {
        Self::new()
    }
}

impl TryFrom<&[&str]> for CslStringList {
    type Error = OgrioError;

    /// Builds a list from `KEY=VALUE` entries.
    fn try_from(entries: &[&str]) -> Result<Self> {
        let mut list = Self::new();
        for entry in entries {
            list.add_name_value_pair(entry)?;
        }
        Ok(list)
    }
}

/// State for iterator over [`CslStringList`] entries.
pub struct CslStringListIterator<'a> {
    list: &'a CslStringList,
    idx: usize,
    count: usize,
}

impl Iterator for CslStringListIterator<'_> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.count {
            return None;
        }

        let field = unsafe { self.list.list_ptr.add(self.idx).read() };
        self.idx += 1;
        let entry = _string(field)?;
        match entry.split_once('=') {
            Some((k, v)) => Some((k.to_string(), v.to_string())),
            None => Some((entry, String::new())),
        }
    }
}

impl Debug for CslStringList {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (k, v) in self.iter() {
            f.write_fmt(format_args!("{k}={v}\n"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_list() -> Result<()> {
        let mut l = CslStringList::new();
        l.set_name_value("ONE", "1")?;
        l.set_name_value("TWO", "2")?;
        assert_eq!(l.len(), 2);
        assert_eq!(l.fetch_name_value("ONE")?, Some("1".into()));
        assert_eq!(l.fetch_name_value("THREE")?, None);

        l.set_name_value("ONE", "uno")?;
        assert_eq!(l.len(), 2);
        assert_eq!(l.fetch_name_value("ONE")?, Some("uno".into()));
        Ok(())
    }

    #[test]
    fn from_entries() -> Result<()> {
        let l = CslStringList::try_from(&["ENCODING=UTF-8", "SPATIAL_INDEX=NO"][..])?;
        let entries: Vec<_> = l.iter().collect();
        assert_eq!(
            entries,
            vec![
                ("ENCODING".to_string(), "UTF-8".to_string()),
                ("SPATIAL_INDEX".to_string(), "NO".to_string())
            ]
        );
        assert!(CslStringList::try_from(&["NOT_A_PAIR"][..]).is_err());
        Ok(())
    }

    #[test]
    fn invalid_keys() {
        let mut l = CslStringList::default();
        assert!(l.set_name_value("l==t", "2").is_err());
        assert!(l.set_name_value("foo", "2\n4\r5").is_err());
        assert!(l.is_empty());
    }
}
