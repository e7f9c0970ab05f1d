//! Coordinate reference systems
//!
//! Only what the I/O functions need: building an SRS for a new layer and
//! describing the SRS of an existing one.

use std::ffi::{c_char, CString};
use std::ptr;

use gdal_sys::{self, OGRErr, OGRSpatialReferenceH, OSRAxisMappingStrategy};

use crate::errors::*;
use crate::utils::{_last_null_pointer_err, _owned_string, _string};

/// A OpenGIS Spatial Reference System definition.
#[derive(Debug)]
pub struct SpatialRef(OGRSpatialReferenceH);

impl Drop for SpatialRef {
    fn drop(&mut self) {
        unsafe { gdal_sys::OSRRelease(self.0) };
        self.0 = ptr::null_mut();
    }
}

impl Clone for SpatialRef {
    fn clone(&self) -> SpatialRef {
        let n_obj = unsafe { gdal_sys::OSRClone(self.0) };
        SpatialRef(n_obj)
    }
}

impl SpatialRef {
    fn empty() -> Result<SpatialRef> {
        let c_obj = unsafe { gdal_sys::OSRNewSpatialReference(ptr::null()) };
        if c_obj.is_null() {
            return Err(_last_null_pointer_err("OSRNewSpatialReference"));
        }
        let srs = SpatialRef(c_obj);
        srs.set_traditional_axis_order();
        Ok(srs)
    }

    /// Set spatial reference from various text formats: `EPSG:4326`, WKT,
    /// PROJ strings, ...
    ///
    /// See [`OSRSetFromUserInput`](https://gdal.org/api/ogr_srs_api.html#_CPPv419OSRSetFromUserInput20OGRSpatialReferenceHPKc).
    pub fn from_definition(definition: &str) -> Result<SpatialRef> {
        let c_definition = CString::new(definition)?;
        let srs = Self::empty()?;
        let rv = unsafe { gdal_sys::OSRSetFromUserInput(srs.0, c_definition.as_ptr()) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OSRSetFromUserInput",
            });
        }
        Ok(srs)
    }

    pub fn from_epsg(epsg_code: u32) -> Result<SpatialRef> {
        let srs = Self::empty()?;
        let rv = unsafe { gdal_sys::OSRImportFromEPSG(srs.0, epsg_code as i32) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OSRImportFromEPSG",
            });
        }
        Ok(srs)
    }

    /// Creates a new SpatialRef by cloning a C pointer that is owned elsewhere.
    ///
    /// # Safety
    /// `c_obj` must be a valid `OGRSpatialReferenceH`.
    pub unsafe fn from_c_obj(c_obj: OGRSpatialReferenceH) -> Result<SpatialRef> {
        let mut_c_obj = gdal_sys::OSRClone(c_obj);
        if mut_c_obj.is_null() {
            Err(_last_null_pointer_err("OSRClone"))
        } else {
            Ok(SpatialRef(mut_c_obj))
        }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn to_c_hsrs(&self) -> OGRSpatialReferenceH {
        self.0
    }

    fn set_traditional_axis_order(&self) {
        unsafe {
            gdal_sys::OSRSetAxisMappingStrategy(
                self.0,
                OSRAxisMappingStrategy::OAMS_TRADITIONAL_GIS_ORDER,
            )
        };
    }

    pub fn to_wkt(&self) -> Result<String> {
        let mut c_wkt: *mut c_char = ptr::null_mut();
        let rv = unsafe { gdal_sys::OSRExportToWkt(self.0, &mut c_wkt) };
        let wkt = _owned_string(c_wkt);
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OSRExportToWkt",
            });
        }
        Ok(wkt.unwrap_or_default())
    }

    /// Tries to fill in the EPSG authority code when it is missing.
    ///
    /// Returns `false` if no code could be matched.
    pub fn auto_identify_epsg(&mut self) -> bool {
        unsafe { gdal_sys::OSRAutoIdentifyEPSG(self.0) == OGRErr::OGRERR_NONE }
    }

    pub fn auth_name(&self) -> Option<String> {
        _string(unsafe { gdal_sys::OSRGetAuthorityName(self.0, ptr::null()) })
            .filter(|name| !name.is_empty())
    }

    pub fn auth_code(&self) -> Option<String> {
        _string(unsafe { gdal_sys::OSRGetAuthorityCode(self.0, ptr::null()) })
            .filter(|code| !code.is_empty())
    }

    /// `AUTHORITY:CODE` of the root node, if both are known.
    pub fn authority(&self) -> Option<String> {
        Some(format!("{}:{}", self.auth_name()?, self.auth_code()?))
    }

    /// Describes this reference system for reporting.
    ///
    /// Tries to identify an EPSG code first and returns `AUTHORITY:CODE`;
    /// falls back to the WKT representation.
    pub fn to_crs_string(&self) -> Result<String> {
        let mut identified = self.clone();
        identified.auto_identify_epsg();
        match identified.authority() {
            Some(authority) => Ok(authority),
            None => self.to_wkt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_epsg() {
        let srs = SpatialRef::from_epsg(4326).unwrap();
        assert_eq!(srs.authority().as_deref(), Some("EPSG:4326"));
        assert_eq!(srs.to_crs_string().unwrap(), "EPSG:4326");
    }

    #[test]
    fn test_from_definition() {
        let srs = SpatialRef::from_definition("EPSG:3857").unwrap();
        assert_eq!(srs.auth_code().as_deref(), Some("3857"));
        assert!(SpatialRef::from_definition("not a crs").is_err());
    }

    #[test]
    fn test_identify_from_wkt() {
        let wkt = SpatialRef::from_epsg(4326).unwrap().to_wkt().unwrap();
        assert!(wkt.starts_with("GEOGCS"));
        let srs = SpatialRef::from_definition(&wkt).unwrap();
        assert_eq!(srs.to_crs_string().unwrap(), "EPSG:4326");
    }

    #[test]
    fn test_unidentifiable_falls_back_to_wkt() {
        let srs =
            SpatialRef::from_definition("+proj=tmerc +lat_0=1.5 +lon_0=7.25 +ellps=GRS80 +units=m")
                .unwrap();
        let crs = srs.to_crs_string().unwrap();
        assert!(crs.starts_with("PROJCS"), "{crs}");
    }
}
