use std::ffi::{c_int, CStr, CString};
use std::marker::PhantomData;
use std::ptr;

use gdal_sys::{self, OGREnvelope, OGRErr, OGRFieldType, OGRLayerH, OGRwkbGeometryType};
use geo_types::{coord, Rect};

use crate::dataset::Dataset;
use crate::errors::*;
use crate::spatial_ref::SpatialRef;
use crate::utils::{_last_error_msg, _last_null_pointer_err, _string};
use crate::vector::{Defn, Feature};

/// Layer capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::enum_variant_names)]
pub enum LayerCaps {
    /// Layer capability for random read
    OLCRandomRead,
    /// Layer capability for sequential write
    OLCSequentialWrite,
    /// Layer capability for fast spatial filter
    OLCFastSpatialFilter,
    /// Layer capability for fast feature count retrieval
    OLCFastFeatureCount,
    /// Layer capability for fast extent retrieval
    OLCFastGetExtent,
    /// Layer capability for fast setting of next read feature
    OLCFastSetNextByIndex,
    /// Layer capability for field creation
    OLCCreateField,
    /// Layer capability for transactions
    OLCTransactions,
    /// Layer capability for strings returned with UTF-8 encoding
    OLCStringsAsUTF8,
}

impl LayerCaps {
    fn into_cstr(self) -> &'static CStr {
        match self {
            LayerCaps::OLCRandomRead => c"RandomRead",
            LayerCaps::OLCSequentialWrite => c"SequentialWrite",
            LayerCaps::OLCFastSpatialFilter => c"FastSpatialFilter",
            LayerCaps::OLCFastFeatureCount => c"FastFeatureCount",
            LayerCaps::OLCFastGetExtent => c"FastGetExtent",
            LayerCaps::OLCFastSetNextByIndex => c"FastSetNextByIndex",
            LayerCaps::OLCCreateField => c"CreateField",
            LayerCaps::OLCTransactions => c"Transactions",
            LayerCaps::OLCStringsAsUTF8 => c"StringsAsUTF8",
        }
    }
}

/// Layer in a vector dataset
///
/// ```no_run
/// use ogrio::Dataset;
///
/// let dataset = Dataset::open("data/countries.shp").unwrap();
/// let mut layer = dataset.layer(0).unwrap();
/// for feature in layer.features() {
///     // do something with each feature
/// }
/// ```
#[derive(Debug)]
pub struct Layer<'a> {
    c_layer: OGRLayerH,
    _dataset: PhantomData<&'a Dataset>,
}

impl<'a> Layer<'a> {
    /// Creates a new Layer by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer.
    /// The pointer must be a valid layer of `dataset`.
    pub(crate) unsafe fn from_c_layer(_dataset: &'a Dataset, c_layer: OGRLayerH) -> Self {
        Layer {
            c_layer,
            _dataset: PhantomData,
        }
    }

    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_layer(&self) -> OGRLayerH {
        self.c_layer
    }

    pub fn name(&self) -> String {
        _string(unsafe { gdal_sys::OGR_L_GetName(self.c_layer) }).unwrap_or_default()
    }

    /// The geometry type as reported by the driver, before any
    /// normalization.
    pub fn raw_geometry_type(&self) -> OGRwkbGeometryType::Type {
        unsafe { gdal_sys::OGR_L_GetGeomType(self.c_layer) }
    }

    /// The layer's spatial reference, `None` when it has none.
    pub fn spatial_ref(&self) -> Option<SpatialRef> {
        let c_obj = unsafe { gdal_sys::OGR_L_GetSpatialRef(self.c_layer) };
        if c_obj.is_null() {
            return None;
        }
        unsafe { SpatialRef::from_c_obj(c_obj) }.ok()
    }

    /// The layer schema; it is owned by the dataset, not the layer.
    pub fn defn(&self) -> Defn<'a> {
        unsafe { Defn::from_c_defn(gdal_sys::OGR_L_GetLayerDefn(self.c_layer)) }
    }

    /// Returns the number of features, scanning the layer if `force` is set
    /// and the driver cannot count cheaply.
    ///
    /// `None` if the count is not known without scanning and `force` is
    /// `false`.
    pub fn feature_count(&self, force: bool) -> Option<u64> {
        let count = unsafe { gdal_sys::OGR_L_GetFeatureCount(self.c_layer, force as c_int) };
        (count >= 0).then_some(count as u64)
    }

    pub fn has_capability(&self, capability: LayerCaps) -> bool {
        unsafe {
            gdal_sys::OGR_L_TestCapability(self.c_layer, capability.into_cstr().as_ptr()) == 1
        }
    }

    /// The 2D extent of all features.
    ///
    /// Without `force`, returns `None` when the driver would have to scan
    /// every feature to compute it.
    pub fn extent(&self, force: bool) -> Result<Option<Rect<f64>>> {
        let mut envelope = OGREnvelope {
            MinX: 0.0,
            MaxX: 0.0,
            MinY: 0.0,
            MaxY: 0.0,
        };
        let rv = unsafe { gdal_sys::OGR_L_GetExtent(self.c_layer, &mut envelope, force as c_int) };
        match rv {
            OGRErr::OGRERR_NONE => Ok(Some(Rect::new(
                coord! { x: envelope.MinX, y: envelope.MinY },
                coord! { x: envelope.MaxX, y: envelope.MaxY },
            ))),
            // no extent available, e.g. no features or not cheap
            OGRErr::OGRERR_FAILURE => {
                unsafe { gdal_sys::CPLErrorReset() };
                Ok(None)
            }
            err => Err(OgrioError::OgrError {
                err,
                method_name: "OGR_L_GetExtent",
            }),
        }
    }

    /// Reads a metadata item of the layer, from the default domain when
    /// `domain` is `None`.
    pub fn metadata_item(&self, key: &str, domain: Option<&str>) -> Option<String> {
        let c_key = CString::new(key).ok()?;
        let c_domain = match domain {
            Some(domain) => Some(CString::new(domain).ok()?),
            None => None,
        };
        let rv = unsafe {
            gdal_sys::GDALGetMetadataItem(
                self.c_layer,
                c_key.as_ptr(),
                c_domain.as_ref().map_or(ptr::null(), |d| d.as_ptr()),
            )
        };
        _string(rv)
    }

    /// Name of the FID column, empty when the driver does not expose one.
    pub fn fid_column(&self) -> String {
        _string(unsafe { gdal_sys::OGR_L_GetFIDColumn(self.c_layer) }).unwrap_or_default()
    }

    /// Name of the geometry column, empty when the driver does not expose
    /// one.
    pub fn geometry_column(&self) -> String {
        _string(unsafe { gdal_sys::OGR_L_GetGeometryColumn(self.c_layer) }).unwrap_or_default()
    }

    /// Set a feature filter on this layer.
    ///
    /// Only features matching the SQL `WHERE` clause `query` are returned
    /// until the filter is cleared.
    pub fn set_attribute_filter(&mut self, query: &str) -> Result<()> {
        let c_str = CString::new(query)?;
        let rv = unsafe { gdal_sys::OGR_L_SetAttributeFilter(self.c_layer, c_str.as_ptr()) };
        if rv != OGRErr::OGRERR_NONE {
            let msg = _last_error_msg();
            unsafe { gdal_sys::CPLErrorReset() };
            return Err(OgrioError::InvalidQuery {
                query: query.to_string(),
                msg,
            });
        }
        Ok(())
    }

    pub fn clear_attribute_filter(&mut self) {
        unsafe { gdal_sys::OGR_L_SetAttributeFilter(self.c_layer, ptr::null()) };
    }

    /// Only return features intersecting the rectangle.
    pub fn set_spatial_filter_rect(&mut self, bbox: Rect<f64>) {
        unsafe {
            gdal_sys::OGR_L_SetSpatialFilterRect(
                self.c_layer,
                bbox.min().x,
                bbox.min().y,
                bbox.max().x,
                bbox.max().y,
            )
        };
    }

    pub fn clear_spatial_filter(&mut self) {
        unsafe { gdal_sys::OGR_L_SetSpatialFilter(self.c_layer, ptr::null_mut()) };
    }

    pub fn reset_reading(&mut self) {
        unsafe { gdal_sys::OGR_L_ResetReading(self.c_layer) };
    }

    /// Moves the read cursor so that the next feature returned is the one at
    /// (0-based) position `idx`, filters taken into account.
    pub fn set_next_by_index(&mut self, idx: u64) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_SetNextByIndex(self.c_layer, idx as i64) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OGR_L_SetNextByIndex",
            });
        }
        Ok(())
    }

    /// Iterate over the features of this layer, starting at the current
    /// read cursor.
    pub fn features(&mut self) -> FeatureIterator<'_> {
        FeatureIterator {
            c_layer: self.c_layer,
            _layer: PhantomData,
        }
    }

    /// Adds an attribute field to the layer schema.
    pub fn create_field(
        &mut self,
        name: &str,
        field_type: OGRFieldType::Type,
        width: Option<i32>,
    ) -> Result<()> {
        let c_name = CString::new(name)?;
        let c_field_defn = unsafe { gdal_sys::OGR_Fld_Create(c_name.as_ptr(), field_type) };
        if c_field_defn.is_null() {
            return Err(_last_null_pointer_err("OGR_Fld_Create"));
        }
        if let Some(width) = width {
            unsafe { gdal_sys::OGR_Fld_SetWidth(c_field_defn, width) };
        }
        let rv = unsafe { gdal_sys::OGR_L_CreateField(self.c_layer, c_field_defn, 1) };
        unsafe { gdal_sys::OGR_Fld_Destroy(c_field_defn) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OGR_L_CreateField",
            });
        }
        Ok(())
    }

    /// Writes `feature` to the layer as a new feature.
    pub fn create_feature(&mut self, feature: &Feature<'_>) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_CreateFeature(self.c_layer, feature.c_feature()) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OGR_L_CreateFeature",
            });
        }
        Ok(())
    }

    pub fn sync_to_disk(&mut self) -> Result<()> {
        let rv = unsafe { gdal_sys::OGR_L_SyncToDisk(self.c_layer) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "OGR_L_SyncToDisk",
            });
        }
        Ok(())
    }
}

pub struct FeatureIterator<'a> {
    c_layer: OGRLayerH,
    _layer: PhantomData<&'a mut ()>,
}

impl<'a> Iterator for FeatureIterator<'a> {
    type Item = Feature<'a>;

    #[inline]
    fn next(&mut self) -> Option<Feature<'a>> {
        let c_feature = unsafe { gdal_sys::OGR_L_GetNextFeature(self.c_layer) };
        if c_feature.is_null() {
            None
        } else {
            Some(unsafe { Feature::from_c_feature(c_feature) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::open_vector;
    use crate::test_utils::{naturalearth_lowres, SuppressGDALErrorLog};

    #[test]
    fn test_layer_metadata() {
        let fixture = naturalearth_lowres();
        let ds = open_vector(fixture.path(), None).unwrap();
        let layer = ds.layer(0).unwrap();
        assert_eq!(layer.name(), "naturalearth_lowres");
        assert_eq!(layer.raw_geometry_type(), OGRwkbGeometryType::wkbPolygon);
        assert_eq!(layer.feature_count(true), Some(177));
        assert_eq!(
            layer.spatial_ref().unwrap().to_crs_string().unwrap(),
            "EPSG:4326"
        );
        assert!(layer.has_capability(LayerCaps::OLCFastGetExtent));
        assert!(!layer.has_capability(LayerCaps::OLCTransactions));
    }

    #[test]
    fn test_layer_fields() {
        let fixture = naturalearth_lowres();
        let ds = open_vector(fixture.path(), None).unwrap();
        let layer = ds.layer(0).unwrap();
        let defn = layer.defn();
        let names: Vec<String> = defn.fields().map(|f| f.name()).collect();
        assert_eq!(
            names,
            vec!["pop_est", "continent", "name", "iso_a3", "gdp_md_est"]
        );
        assert_eq!(defn.field_index("iso_a3"), Some(3));
        assert_eq!(defn.field_index("nope"), None);
        let types: Vec<String> = defn.fields().map(|f| f.type_name()).collect();
        assert_eq!(types, vec!["Real", "String", "String", "String", "Real"]);
    }

    #[test]
    fn test_layer_extent() {
        let fixture = naturalearth_lowres();
        let ds = open_vector(fixture.path(), None).unwrap();
        let layer = ds.layer(0).unwrap();
        let extent = layer.extent(true).unwrap().unwrap();
        assert!(extent.min().x >= -180.0 && extent.max().x <= 180.0);
        assert!(extent.min().y >= -90.0 && extent.max().y <= 90.0);
    }

    #[test]
    fn test_features_and_filters() {
        let fixture = naturalearth_lowres();
        let ds = open_vector(fixture.path(), None).unwrap();
        let mut layer = ds.layer(0).unwrap();
        assert_eq!(layer.features().count(), 177);

        layer.set_attribute_filter("iso_a3 = 'C000'").unwrap();
        layer.reset_reading();
        let matched: Vec<_> = layer.features().collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].fid(), Some(0));
        assert_eq!(
            matched[0].field_as_string(3).unwrap().as_deref(),
            Some("C000")
        );
        drop(matched);

        layer.clear_attribute_filter();
        layer.reset_reading();
        layer.set_next_by_index(170).unwrap();
        assert_eq!(layer.features().count(), 7);
    }

    #[test]
    fn test_invalid_attribute_filter() {
        let _nolog = SuppressGDALErrorLog::new();
        let fixture = naturalearth_lowres();
        let ds = open_vector(fixture.path(), None).unwrap();
        let mut layer = ds.layer(0).unwrap();
        let err = layer.set_attribute_filter("foo = ").unwrap_err();
        assert!(matches!(err, OgrioError::InvalidQuery { .. }));
    }
}
