//! Layer enumeration and metadata
//!
//! ```no_run
//! use ogrio::core::{list_layers, read_info};
//!
//! let layers = list_layers("data/countries.gpkg").unwrap();
//! for layer in layers.iter() {
//!     println!("{} {:?}", layer.name, layer.geometry_type.map(|t| t.to_string()));
//! }
//! let info = read_info("data/countries.gpkg").unwrap();
//! println!("{:?} {} features", info.crs, info.features);
//! ```

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::Path;

use geo_types::Rect;
use log::{debug, warn};

use crate::dataset::{open_vector, Dataset};
use crate::driver::drivers;
use crate::errors::*;
use crate::vector::{
    normalize_geometry_type, ogr_type_name, Field, GeometryType, Layer, LayerCaps,
};
use crate::vsi::resolve_source;

const SHAPEFILE_DRIVER: &str = "ESRI Shapefile";

/// A non-fatal condition met while reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadWarning {
    /// The layer's geometry type has an M dimension that was dropped.
    MeasuredGeometryDowngraded {
        layer: String,
        original: String,
        reported: String,
    },
}

impl Display for ReadWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadWarning::MeasuredGeometryDowngraded {
                layer,
                original,
                reported,
            } => write!(
                f,
                "Measured (M) geometry types are not supported. \
                 Original type '{original}' of layer '{layer}' is converted to '{reported}'"
            ),
        }
    }
}

/// Name and geometry type of one layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSummary {
    pub name: String,
    /// `None` for layers without geometry.
    pub geometry_type: Option<GeometryType>,
}

/// The layers of a data source in index order, plus the warnings raised
/// while classifying them.
#[derive(Debug, Clone, Default)]
pub struct LayerListing {
    layers: Vec<LayerSummary>,
    warnings: Vec<ReadWarning>,
}

impl LayerListing {
    pub fn warnings(&self) -> &[ReadWarning] {
        &self.warnings
    }

    pub fn into_layers(self) -> Vec<LayerSummary> {
        self.layers
    }
}

impl Deref for LayerListing {
    type Target = [LayerSummary];

    fn deref(&self) -> &[LayerSummary] {
        &self.layers
    }
}

impl<'a> IntoIterator for &'a LayerListing {
    type Item = &'a LayerSummary;
    type IntoIter = std::slice::Iter<'a, LayerSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.layers.iter()
    }
}

/// Selects a layer by 0-based index or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerSelector {
    Index(usize),
    Name(String),
}

impl From<usize> for LayerSelector {
    fn from(index: usize) -> Self {
        LayerSelector::Index(index)
    }
}

impl From<&str> for LayerSelector {
    fn from(name: &str) -> Self {
        LayerSelector::Name(name.to_string())
    }
}

impl From<String> for LayerSelector {
    fn from(name: String) -> Self {
        LayerSelector::Name(name)
    }
}

/// Options for [`read_info_ex`].
#[derive(Debug, Clone, Default)]
pub struct InfoOptions {
    /// Layer to describe, the first one when `None`.
    pub layer: Option<LayerSelector>,
    /// Encoding of the attribute data, overriding detection.
    ///
    /// For shapefiles it is passed to GDAL as the `ENCODING` open option.
    pub encoding: Option<String>,
    /// Compute the total bounds even when the driver has to scan every
    /// feature to do so.
    pub force_total_bounds: bool,
}

/// Schema of one attribute field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    /// OGR type name, e.g. `"Integer64"`, `"Real"`, `"String"`.
    pub field_type: String,
    pub width: i32,
    pub precision: i32,
    pub nullable: bool,
    /// Alternative name, when the driver stores one (GDAL >= 3.2).
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerCapabilities {
    pub random_read: bool,
    pub fast_set_next_by_index: bool,
    pub fast_spatial_filter: bool,
    pub fast_feature_count: bool,
    pub fast_total_bounds: bool,
}

/// Metadata of a single layer.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    pub layer_name: String,
    /// `AUTHORITY:CODE` when identifiable, else WKT; `None` without SRS.
    pub crs: Option<String>,
    pub geometry_type: Option<GeometryType>,
    pub encoding: String,
    pub fields: Vec<FieldInfo>,
    pub features: u64,
    /// Short name of the driver that opened the source.
    pub driver: String,
    /// Empty when the driver does not name the geometry column.
    pub geometry_column: String,
    /// Empty when the driver does not name the FID column.
    pub fid_column: String,
    pub total_bounds: Option<Rect<f64>>,
    pub capabilities: LayerCapabilities,
    pub warnings: Vec<ReadWarning>,
}

/// Whether a driver can only read, or also create data sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverMode {
    Read,
    ReadWrite,
}

impl DriverMode {
    pub fn can_write(&self) -> bool {
        matches!(self, DriverMode::ReadWrite)
    }
}

impl Display for DriverMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DriverMode::Read => f.write_str("r"),
            DriverMode::ReadWrite => f.write_str("rw"),
        }
    }
}

/// Lists the layers of the data source at `path`.
///
/// Measured geometry types are downgraded (XYZM to 2.5D, XYM to 2D); one
/// [`ReadWarning::MeasuredGeometryDowngraded`] is recorded, and logged, for
/// each affected layer.
pub fn list_layers<P: AsRef<Path>>(path: P) -> Result<LayerListing> {
    let ds = open_vector(&resolve_source(path.as_ref()), None)?;
    let mut listing = LayerListing::default();
    for idx in 0..ds.layer_count() {
        let layer = ds.layer(idx)?;
        let geometry_type = classify_geometry(&layer, &mut listing.warnings)?;
        listing.layers.push(LayerSummary {
            name: layer.name(),
            geometry_type,
        });
    }
    Ok(listing)
}

/// Describes the first layer of the data source at `path`.
pub fn read_info<P: AsRef<Path>>(path: P) -> Result<LayerInfo> {
    read_info_ex(path, &InfoOptions::default())
}

/// Describes a layer of the data source at `path`.
pub fn read_info_ex<P: AsRef<Path>>(path: P, options: &InfoOptions) -> Result<LayerInfo> {
    let path = resolve_source(path.as_ref());
    let ds = open_with_encoding(&path, options.encoding.as_deref())?;
    let mut layer = select_layer(&ds, options.layer.as_ref())?;
    let driver = ds.driver().short_name();

    let mut warnings = Vec::new();
    let geometry_type = classify_geometry(&layer, &mut warnings)?;
    let crs = layer
        .spatial_ref()
        .map(|srs| srs.to_crs_string())
        .transpose()?;
    let encoding = detect_encoding(&layer, &driver, options.encoding.as_deref());

    let fields = layer
        .defn()
        .fields()
        .map(|field| FieldInfo {
            name: field.name(),
            field_type: field.type_name(),
            width: field.width(),
            precision: field.precision(),
            nullable: field.is_nullable(),
            alias: field_alias(&field),
        })
        .collect();

    let capabilities = LayerCapabilities {
        random_read: layer.has_capability(LayerCaps::OLCRandomRead),
        fast_set_next_by_index: layer.has_capability(LayerCaps::OLCFastSetNextByIndex),
        fast_spatial_filter: layer.has_capability(LayerCaps::OLCFastSpatialFilter),
        fast_feature_count: layer.has_capability(LayerCaps::OLCFastFeatureCount),
        fast_total_bounds: layer.has_capability(LayerCaps::OLCFastGetExtent),
    };

    let total_bounds = if capabilities.fast_total_bounds || options.force_total_bounds {
        layer.extent(true)?
    } else {
        None
    };

    let features = count_features(&mut layer);

    Ok(LayerInfo {
        layer_name: layer.name(),
        crs,
        geometry_type,
        encoding,
        fields,
        features,
        driver,
        geometry_column: layer.geometry_column(),
        fid_column: layer.fid_column(),
        total_bounds,
        capabilities,
        warnings,
    })
}

/// Lists the installed vector drivers by short name.
///
/// With `read` set only drivers that can open data sources are kept, with
/// `write` set only those that can create them.
pub fn list_drivers(read: bool, write: bool) -> BTreeMap<String, DriverMode> {
    drivers()
        .filter(|driver| driver.is_vector())
        .filter(|driver| !read || driver.can_open())
        .map(|driver| {
            let mode = if driver.can_create() {
                DriverMode::ReadWrite
            } else {
                DriverMode::Read
            };
            (driver.short_name(), mode)
        })
        .filter(|(_, mode)| !write || mode.can_write())
        .collect()
}

pub(crate) fn open_with_encoding(path: &Path, encoding: Option<&str>) -> Result<Dataset> {
    let ds = open_vector(path, None)?;
    let Some(encoding) = encoding else {
        return Ok(ds);
    };
    if ds.driver().short_name() != SHAPEFILE_DRIVER {
        return Ok(ds);
    }
    drop(ds);
    debug!("reopening '{}' with ENCODING={encoding}", path.display());
    let option = format!("ENCODING={encoding}");
    open_vector(path, Some(&[option.as_str()]))
}

pub(crate) fn select_layer<'a>(
    ds: &'a Dataset,
    selector: Option<&LayerSelector>,
) -> Result<Layer<'a>> {
    match selector {
        None => ds.layer(0),
        Some(LayerSelector::Index(idx)) => ds.layer(*idx),
        Some(LayerSelector::Name(name)) => ds.layer_by_name(name),
    }
}

/// Normalizes the layer geometry type, recording a warning when an M
/// dimension is dropped.
fn classify_geometry(
    layer: &Layer<'_>,
    warnings: &mut Vec<ReadWarning>,
) -> Result<Option<GeometryType>> {
    let normalized = normalize_geometry_type(layer.raw_geometry_type())?;
    if normalized.measured {
        let warning = ReadWarning::MeasuredGeometryDowngraded {
            layer: layer.name(),
            original: ogr_type_name(normalized.original),
            reported: normalized
                .geometry_type
                .map(|t| t.to_string())
                .unwrap_or_default(),
        };
        warn!("{warning}");
        warnings.push(warning);
    }
    Ok(normalized.geometry_type)
}

#[cfg(any(major_ge_4, all(major_is_3, minor_ge_2)))]
fn field_alias(field: &Field<'_>) -> Option<String> {
    Some(field.alternative_name()).filter(|alias| !alias.is_empty())
}

#[cfg(not(any(major_ge_4, all(major_is_3, minor_ge_2))))]
fn field_alias(_field: &Field<'_>) -> Option<String> {
    None
}

fn detect_encoding(layer: &Layer<'_>, driver: &str, requested: Option<&str>) -> String {
    if let Some(encoding) = requested {
        return encoding.to_string();
    }
    if driver == SHAPEFILE_DRIVER {
        // code page of the .cpg/.dbf, reported since GDAL 3.9 even when
        // strings are recoded to UTF-8
        let source = layer
            .metadata_item("SOURCE_ENCODING", Some("SHAPEFILE"))
            .filter(|encoding| !encoding.is_empty());
        if let Some(encoding) = source {
            return encoding;
        }
    }
    if layer.has_capability(LayerCaps::OLCStringsAsUTF8) {
        return "UTF-8".to_string();
    }
    if driver == SHAPEFILE_DRIVER {
        // DBF files without a code page are read as Latin-1
        return "ISO-8859-1".to_string();
    }
    "UTF-8".to_string()
}

fn count_features(layer: &mut Layer<'_>) -> u64 {
    if let Some(count) = layer.feature_count(true) {
        return count;
    }
    debug!("driver cannot count features of '{}', scanning", layer.name());
    layer.reset_reading();
    let count = layer.features().count() as u64;
    layer.reset_reading();
    count
}
