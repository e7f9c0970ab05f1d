use std::ffi::c_int;
use std::marker::PhantomData;

use gdal_sys::{self, OGRFeatureDefnH, OGRFieldDefnH, OGRFieldType};

use crate::utils::_string;

/// Layer definition
///
/// Defines the fields available for features in a layer.
#[derive(Debug)]
pub struct Defn<'a> {
    c_defn: OGRFeatureDefnH,
    _layer: PhantomData<&'a ()>,
}

impl Defn<'_> {
    /// Creates a new Defn by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer
    pub unsafe fn from_c_defn(c_defn: OGRFeatureDefnH) -> Self {
        Defn {
            c_defn,
            _layer: PhantomData,
        }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_defn(&self) -> OGRFeatureDefnH {
        self.c_defn
    }

    pub fn field_count(&self) -> usize {
        unsafe { gdal_sys::OGR_FD_GetFieldCount(self.c_defn) }.max(0) as usize
    }

    /// Iterate over the field schema of this layer.
    pub fn fields(&self) -> FieldIterator<'_> {
        FieldIterator {
            defn: self,
            next_id: 0,
            total: self.field_count(),
        }
    }

    /// Index of the field called `name`, if any.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        let c_name = std::ffi::CString::new(name).ok()?;
        let idx = unsafe { gdal_sys::OGR_FD_GetFieldIndex(self.c_defn, c_name.as_ptr()) };
        (idx >= 0).then_some(idx as usize)
    }
}

pub struct FieldIterator<'a> {
    defn: &'a Defn<'a>,
    next_id: usize,
    total: usize,
}

impl<'a> Iterator for FieldIterator<'a> {
    type Item = Field<'a>;

    #[inline]
    fn next(&mut self) -> Option<Field<'a>> {
        if self.next_id == self.total {
            return None;
        }
        let field = Field {
            _defn: PhantomData,
            c_field_defn: unsafe {
                gdal_sys::OGR_FD_GetFieldDefn(self.defn.c_defn, self.next_id as c_int)
            },
        };
        self.next_id += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next_id;
        (remaining, Some(remaining))
    }
}

pub struct Field<'a> {
    _defn: PhantomData<&'a ()>,
    c_field_defn: OGRFieldDefnH,
}

impl Field<'_> {
    /// Get the name of this field.
    pub fn name(&self) -> String {
        _string(unsafe { gdal_sys::OGR_Fld_GetNameRef(self.c_field_defn) }).unwrap_or_default()
    }

    /// Get the alternative name (alias) of this field.
    ///
    /// This API is new as of GDAL 3.2.
    #[cfg(any(major_ge_4, all(major_is_3, minor_ge_2)))]
    pub fn alternative_name(&self) -> String {
        _string(unsafe { gdal_sys::OGR_Fld_GetAlternativeNameRef(self.c_field_defn) })
            .unwrap_or_default()
    }

    /// Get the data type of this field.
    pub fn field_type(&self) -> OGRFieldType::Type {
        unsafe { gdal_sys::OGR_Fld_GetType(self.c_field_defn) }
    }

    /// OGR's name for the data type, e.g. `"Integer64"` or `"String"`.
    pub fn type_name(&self) -> String {
        _string(unsafe { gdal_sys::OGR_GetFieldTypeName(self.field_type()) }).unwrap_or_default()
    }

    /// Get the formatting width for this field.
    ///
    /// Zero means no specified width.
    pub fn width(&self) -> i32 {
        unsafe { gdal_sys::OGR_Fld_GetWidth(self.c_field_defn) }
    }

    /// Get the formatting precision for this field.
    ///
    /// This should normally be zero for fields of types other than Real.
    pub fn precision(&self) -> i32 {
        unsafe { gdal_sys::OGR_Fld_GetPrecision(self.c_field_defn) }
    }

    /// Return whether this field can receive null values.
    pub fn is_nullable(&self) -> bool {
        unsafe { gdal_sys::OGR_Fld_IsNullable(self.c_field_defn) != 0 }
    }
}
