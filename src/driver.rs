use std::ffi::CString;
use std::path::Path;
use std::sync::Once;

use gdal_sys::{self, CPLErr, GDALDataType, GDALDriverH};

use crate::cpl::CslStringList;
use crate::dataset::Dataset;
use crate::errors::*;
use crate::utils::{_last_cpl_err, _last_null_pointer_err, _path_to_c_string, _string};

static START: Once = Once::new();

pub fn _register_drivers() {
    START.call_once(|| unsafe {
        gdal_sys::GDALAllRegister();
    });
}

/// Raster and/or vector driver for accessing and creating datasets.
#[derive(Debug)]
pub struct Driver {
    c_driver: GDALDriverH,
}

impl Driver {
    /// Returns the driver with the given short name (e.g. `"GPKG"`).
    pub fn get_by_name(name: &str) -> Result<Driver> {
        _register_drivers();
        let c_name = CString::new(name)?;
        let c_driver = unsafe { gdal_sys::GDALGetDriverByName(c_name.as_ptr()) };
        if c_driver.is_null() {
            return Err(_last_null_pointer_err("GDALGetDriverByName"));
        };
        Ok(Driver { c_driver })
    }

    /// Returns the driver at index `index` of the driver registry.
    pub fn get(index: usize) -> Result<Driver> {
        _register_drivers();
        let c_driver = unsafe { gdal_sys::GDALGetDriver(index as i32) };
        if c_driver.is_null() {
            return Err(_last_null_pointer_err("GDALGetDriver"));
        }
        Ok(Driver { c_driver })
    }

    /// Number of registered drivers.
    pub fn count() -> usize {
        _register_drivers();
        let count = unsafe { gdal_sys::GDALGetDriverCount() };
        count.max(0) as usize
    }

    /// Creates a new Driver object by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer
    pub unsafe fn from_c_driver(c_driver: GDALDriverH) -> Driver {
        Driver { c_driver }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_driver(&self) -> GDALDriverH {
        self.c_driver
    }

    pub fn short_name(&self) -> String {
        let rv = unsafe { gdal_sys::GDALGetDriverShortName(self.c_driver) };
        _string(rv).unwrap_or_default()
    }

    pub fn long_name(&self) -> String {
        let rv = unsafe { gdal_sys::GDALGetDriverLongName(self.c_driver) };
        _string(rv).unwrap_or_default()
    }

    /// Reads an item of the driver's default metadata domain.
    pub fn metadata_item(&self, key: &str) -> Option<String> {
        let c_key = CString::new(key).ok()?;
        let rv = unsafe {
            gdal_sys::GDALGetMetadataItem(self.c_driver, c_key.as_ptr(), std::ptr::null())
        };
        _string(rv)
    }

    fn has_capability(&self, capability: &str) -> bool {
        self.metadata_item(capability)
            .map(|v| v.eq_ignore_ascii_case("YES"))
            .unwrap_or(false)
    }

    /// Whether the driver handles vector data.
    pub fn is_vector(&self) -> bool {
        self.has_capability("DCAP_VECTOR")
    }

    /// Whether the driver can open existing datasets.
    pub fn can_open(&self) -> bool {
        self.has_capability("DCAP_OPEN")
    }

    /// Whether the driver can create new datasets.
    pub fn can_create(&self) -> bool {
        self.has_capability("DCAP_CREATE")
    }

    /// Creates a new dataset without raster bands, to be filled with layers.
    pub fn create_vector_only<P: AsRef<Path>>(
        &self,
        path: P,
        options: &CslStringList,
    ) -> Result<Dataset> {
        let c_filename = _path_to_c_string(path.as_ref())?;
        let c_dataset = unsafe {
            gdal_sys::GDALCreate(
                self.c_driver,
                c_filename.as_ptr(),
                0,
                0,
                0,
                GDALDataType::GDT_Unknown,
                options.as_ptr(),
            )
        };

        if c_dataset.is_null() {
            return Err(_last_null_pointer_err("GDALCreate"));
        };

        Ok(unsafe { Dataset::from_c_dataset(c_dataset) })
    }

    /// Deletes the dataset at `path` together with its sidecar files.
    pub fn delete<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let c_filename = _path_to_c_string(path.as_ref())?;
        let rv = unsafe { gdal_sys::GDALDeleteDataset(self.c_driver, c_filename.as_ptr()) };
        if rv != CPLErr::CE_None {
            return Err(_last_cpl_err(rv));
        }
        Ok(())
    }
}

/// Iterates over all registered drivers.
pub fn drivers() -> impl Iterator<Item = Driver> {
    (0..Driver::count()).filter_map(|index| Driver::get(index).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_driver_by_name() {
        let driver = Driver::get_by_name("GPKG").unwrap();
        assert_eq!(driver.short_name(), "GPKG");
        assert_eq!(driver.long_name(), "GeoPackage");
        assert!(driver.is_vector());
        assert!(driver.can_create());
    }

    #[test]
    fn test_unknown_driver() {
        assert!(Driver::get_by_name("NOT_A_DRIVER").is_err());
    }

    #[test]
    fn test_driver_iteration() {
        assert!(Driver::count() > 0);
        assert!(drivers().any(|d| d.short_name() == "ESRI Shapefile"));
    }
}
