use std::ffi::{c_int, CString};
use std::marker::PhantomData;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Timelike};
use gdal_sys::{self, OGRErr, OGRFeatureH};

use crate::errors::*;
use crate::utils::{_last_null_pointer_err, _string};
use crate::vector::{Defn, Geometry, GeometryRef};

/// OGR Feature
///
/// Either read from a [`Layer`](crate::vector::Layer) or created from a
/// [`Defn`] to be written to one.
#[derive(Debug)]
pub struct Feature<'a> {
    c_feature: OGRFeatureH,
    _defn: PhantomData<&'a ()>,
}

impl<'a> Feature<'a> {
    /// Creates an empty feature with the schema of `defn`.
    pub fn new(defn: &'a Defn<'_>) -> Result<Feature<'a>> {
        let c_feature = unsafe { gdal_sys::OGR_F_Create(defn.c_defn()) };
        if c_feature.is_null() {
            return Err(_last_null_pointer_err("OGR_F_Create"));
        }
        Ok(Feature {
            c_feature,
            _defn: PhantomData,
        })
    }

    /// Creates a new Feature by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer. The feature takes ownership
    /// of `c_feature` and destroys it on drop.
    pub unsafe fn from_c_feature(c_feature: OGRFeatureH) -> Feature<'a> {
        Feature {
            c_feature,
            _defn: PhantomData,
        }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_feature(&self) -> OGRFeatureH {
        self.c_feature
    }

    /// Get the feature's FID, if set.
    pub fn fid(&self) -> Option<i64> {
        let fid = unsafe { gdal_sys::OGR_F_GetFID(self.c_feature) };
        (fid >= 0).then_some(fid)
    }

    /// The feature's geometry, `None` when it has none.
    pub fn geometry(&self) -> Option<GeometryRef<'_>> {
        let c_geom = unsafe { gdal_sys::OGR_F_GetGeometryRef(self.c_feature) };
        if c_geom.is_null() {
            None
        } else {
            Some(unsafe { GeometryRef::new(c_geom) })
        }
    }

    pub fn set_geometry(&mut self, geom: Geometry) -> Result<()> {
        let c_geometry = geom.into_c_geometry();
        let rv = unsafe { gdal_sys::OGR_F_SetGeometryDirectly(self.c_feature, c_geometry) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OGR_F_SetGeometryDirectly",
            });
        }
        Ok(())
    }

    pub fn field_count(&self) -> usize {
        unsafe { gdal_sys::OGR_F_GetFieldCount(self.c_feature) }.max(0) as usize
    }

    fn check_index(&self, idx: usize) -> Result<c_int> {
        let count = self.field_count();
        if idx >= count {
            return Err(OgrioError::BadArgument(format!(
                "field index {idx} out of range, feature has {count} field(s)"
            )));
        }
        Ok(idx as c_int)
    }

    /// Whether the field at `idx` holds a non-null value.
    pub fn is_field_set(&self, idx: usize) -> Result<bool> {
        let idx = self.check_index(idx)?;
        Ok(unsafe { gdal_sys::OGR_F_IsFieldSetAndNotNull(self.c_feature, idx) } != 0)
    }

    /// The field value at `idx` formatted by OGR, `None` when unset or null.
    pub fn field_as_string(&self, idx: usize) -> Result<Option<String>> {
        if !self.is_field_set(idx)? {
            return Ok(None);
        }
        Ok(_string(unsafe {
            gdal_sys::OGR_F_GetFieldAsString(self.c_feature, idx as c_int)
        }))
    }

    pub fn field_as_double(&self, idx: usize) -> Result<Option<f64>> {
        if !self.is_field_set(idx)? {
            return Ok(None);
        }
        Ok(Some(unsafe {
            gdal_sys::OGR_F_GetFieldAsDouble(self.c_feature, idx as c_int)
        }))
    }

    pub fn field_as_integer64(&self, idx: usize) -> Result<Option<i64>> {
        if !self.is_field_set(idx)? {
            return Ok(None);
        }
        Ok(Some(unsafe {
            gdal_sys::OGR_F_GetFieldAsInteger64(self.c_feature, idx as c_int)
        }))
    }

    /// Sets the field at `idx`. OGR converts the value to the field type.
    pub fn set_field(&mut self, idx: usize, value: &FieldValue) -> Result<()> {
        let idx = self.check_index(idx)?;
        match value {
            FieldValue::Integer(v) => unsafe {
                gdal_sys::OGR_F_SetFieldInteger(self.c_feature, idx, *v)
            },
            FieldValue::Integer64(v) => unsafe {
                gdal_sys::OGR_F_SetFieldInteger64(self.c_feature, idx, *v)
            },
            FieldValue::Real(v) => unsafe {
                gdal_sys::OGR_F_SetFieldDouble(self.c_feature, idx, *v)
            },
            FieldValue::String(v) => {
                let c_str = CString::new(v.as_str())?;
                unsafe { gdal_sys::OGR_F_SetFieldString(self.c_feature, idx, c_str.as_ptr()) }
            }
            FieldValue::Date(date) => unsafe {
                gdal_sys::OGR_F_SetFieldDateTimeEx(
                    self.c_feature,
                    idx,
                    date.year(),
                    date.month() as c_int,
                    date.day() as c_int,
                    0,
                    0,
                    0.0,
                    0,
                )
            },
            FieldValue::DateTime(dt) => {
                let tz_flag = 100 + dt.offset().local_minus_utc() / 900;
                let seconds = dt.second() as f32 + dt.nanosecond() as f32 / 1e9;
                unsafe {
                    gdal_sys::OGR_F_SetFieldDateTimeEx(
                        self.c_feature,
                        idx,
                        dt.year(),
                        dt.month() as c_int,
                        dt.day() as c_int,
                        dt.hour() as c_int,
                        dt.minute() as c_int,
                        seconds,
                        tz_flag,
                    )
                }
            }
            FieldValue::Null => unsafe { gdal_sys::OGR_F_SetFieldNull(self.c_feature, idx) },
        }
        Ok(())
    }
}

impl Drop for Feature<'_> {
    fn drop(&mut self) {
        unsafe { gdal_sys::OGR_F_Destroy(self.c_feature) };
    }
}

/// A value to be written to a feature field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(i32),
    Integer64(i64),
    Real(f64),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Null,
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer64(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Real(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}
