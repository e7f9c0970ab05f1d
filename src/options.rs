use std::ffi::c_uint;

use bitflags::bitflags;

/// Open options for [`crate::Dataset`]
#[derive(Debug, Default)]
pub struct DatasetOptions<'a> {
    pub open_flags: GdalOpenFlags,
    pub allowed_drivers: Option<&'a [&'a str]>,
    pub open_options: Option<&'a [&'a str]>,
    pub sibling_files: Option<&'a [&'a str]>,
}

// These are skipped by bindgen and manually updated.
bitflags! {
    /// GDAL extended open flags used by [`crate::Dataset::open_ex`].
    ///
    /// Used in the `nOpenFlags` argument to `GDALOpenEx`. `GDAL_OF_SHARED`
    /// is left out since a shared handle cannot be moved to another thread.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GdalOpenFlags: c_uint {
        /// Open in read-only mode (default).
        const GDAL_OF_READONLY = 0x00;
        /// Open in update mode.
        const GDAL_OF_UPDATE = 0x01;
        /// Allow raster and vector drivers to be used.
        const GDAL_OF_ALL = 0x00;
        /// Allow raster drivers to be used.
        const GDAL_OF_RASTER = 0x02;
        /// Allow vector drivers to be used.
        const GDAL_OF_VECTOR = 0x04;
        /// Emit error message in case of failed open.
        const GDAL_OF_VERBOSE_ERROR = 0x40;
        /// Open as internal dataset, not registered in the global list of
        /// opened datasets.
        const GDAL_OF_INTERNAL = 0x80;
    }
}

impl Default for GdalOpenFlags {
    fn default() -> GdalOpenFlags {
        GdalOpenFlags::GDAL_OF_READONLY
    }
}

impl GdalOpenFlags {
    /// Flags used by the read operations of this crate.
    pub fn vector_read() -> Self {
        GdalOpenFlags::GDAL_OF_VECTOR | GdalOpenFlags::GDAL_OF_VERBOSE_ERROR
    }

    /// Flags used when appending to an existing data source.
    pub fn vector_update() -> Self {
        Self::vector_read() | GdalOpenFlags::GDAL_OF_UPDATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_flags() {
        assert_eq!(GdalOpenFlags::vector_read().bits(), 0x44);
        assert_eq!(GdalOpenFlags::vector_update().bits(), 0x45);
        assert_eq!(GdalOpenFlags::default().bits(), 0);
    }
}
