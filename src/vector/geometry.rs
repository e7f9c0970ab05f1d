use std::ffi::{c_char, CString};
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::ptr::{self, null_mut};

use gdal_sys::{self, OGREnvelope, OGRErr, OGRGeometryH, OGRwkbGeometryType};
use geo_types::{coord, Rect};

use crate::errors::*;
use crate::utils::_owned_string;

/// OGR Geometry
pub struct Geometry {
    c_geometry: OGRGeometryH,
    owned: bool,
}

impl Geometry {
    /// Create a new Geometry from a WKT string, which may carry Z and M
    /// ordinates (e.g. `MULTILINESTRING ZM ((0 0 1 2, 1 1 1 3))`).
    pub fn from_wkt(wkt: &str) -> Result<Geometry> {
        let c_wkt = CString::new(wkt)?;
        // OGR_G_CreateFromWkt advances the pointer but does not free the string
        let mut c_wkt_ptr = c_wkt.as_ptr() as *mut c_char;
        let mut c_geom = null_mut();
        let rv = unsafe { gdal_sys::OGR_G_CreateFromWkt(&mut c_wkt_ptr, null_mut(), &mut c_geom) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OGR_G_CreateFromWkt",
            });
        }
        Ok(Geometry {
            c_geometry: c_geom,
            owned: true,
        })
    }

    /// Wraps a geometry owned by someone else (usually a feature).
    ///
    /// # Safety
    /// `c_geometry` must stay valid for the lifetime of the returned value.
    pub(crate) unsafe fn from_c_geometry_ref(c_geometry: OGRGeometryH) -> Geometry {
        Geometry {
            c_geometry,
            owned: false,
        }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_geometry(&self) -> OGRGeometryH {
        self.c_geometry
    }

    /// Hands the C geometry over to the caller, who becomes responsible for
    /// destroying it.
    pub(crate) fn into_c_geometry(self) -> OGRGeometryH {
        assert!(self.owned, "cannot take ownership of a borrowed geometry");
        let this = ManuallyDrop::new(self);
        this.c_geometry
    }

    pub fn geometry_type(&self) -> OGRwkbGeometryType::Type {
        unsafe { gdal_sys::OGR_G_GetGeometryType(self.c_geometry) }
    }

    pub fn is_empty(&self) -> bool {
        unsafe { gdal_sys::OGR_G_IsEmpty(self.c_geometry) != 0 }
    }

    /// Computes the 2D bounding rectangle, or `None` for empty geometries.
    pub fn envelope(&self) -> Option<Rect<f64>> {
        if self.is_empty() {
            return None;
        }
        let mut envelope = OGREnvelope {
            MinX: 0.0,
            MaxX: 0.0,
            MinY: 0.0,
            MaxY: 0.0,
        };
        unsafe { gdal_sys::OGR_G_GetEnvelope(self.c_geometry, &mut envelope) };
        Some(Rect::new(
            coord! { x: envelope.MinX, y: envelope.MinY },
            coord! { x: envelope.MaxX, y: envelope.MaxY },
        ))
    }

    pub fn wkt(&self) -> Result<String> {
        let mut c_wkt = ptr::null_mut();
        let rv = unsafe { gdal_sys::OGR_G_ExportToWkt(self.c_geometry, &mut c_wkt) };
        let wkt = _owned_string(c_wkt);
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OGR_G_ExportToWkt",
            });
        }
        Ok(wkt.unwrap_or_default())
    }
}

impl Drop for Geometry {
    fn drop(&mut self) {
        if self.owned {
            unsafe { gdal_sys::OGR_G_DestroyGeometry(self.c_geometry) };
        }
    }
}

impl Debug for Geometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.wkt() {
            Ok(wkt) => f.write_str(&wkt),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// A geometry borrowed from a feature; cannot outlive it.
pub struct GeometryRef<'f> {
    geom: Geometry,
    _owner: PhantomData<&'f ()>,
}

impl GeometryRef<'_> {
    /// # Safety
    /// `c_geometry` must stay valid while the returned value lives.
    pub(crate) unsafe fn new(c_geometry: OGRGeometryH) -> Self {
        GeometryRef {
            geom: Geometry::from_c_geometry_ref(c_geometry),
            _owner: PhantomData,
        }
    }
}

impl Deref for GeometryRef<'_> {
    type Target = Geometry;

    fn deref(&self) -> &Geometry {
        &self.geom
    }
}
