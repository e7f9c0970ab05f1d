//! Writing layers
//!
//! ```no_run
//! use ogrio::vector::{GeometryKind, GeometryType};
//! use ogrio::write::{write_layer, FieldKind, FieldSchema, LayerSchema, WriteFeature, WriteOptions};
//!
//! let schema = LayerSchema {
//!     name: "cities".to_string(),
//!     geometry_type: Some(GeometryType::flat(GeometryKind::Point)),
//!     crs: Some("EPSG:4326".to_string()),
//!     fields: vec![FieldSchema::new("name", FieldKind::String)],
//! };
//! let features = vec![WriteFeature {
//!     geometry: Some("POINT (2.35 48.85)".to_string()),
//!     values: vec!["Paris".into()],
//! }];
//! write_layer("cities.gpkg", &schema, features, &WriteOptions::default()).unwrap();
//! ```

use std::path::Path;

use log::debug;

use crate::cpl::CslStringList;
use crate::dataset::Dataset;
use crate::driver::Driver;
use crate::errors::*;
use crate::options::{DatasetOptions, GdalOpenFlags};
use crate::spatial_ref::SpatialRef;
use crate::vector::{
    Feature, FieldValue, Geometry, GeometryType, OGRFieldType, OGRwkbGeometryType,
};
use crate::vsi::path_exists;

const DRIVERS_BY_EXTENSION: &[(&str, &str)] = &[
    ("shp", "ESRI Shapefile"),
    ("gpkg", "GPKG"),
    ("geojson", "GeoJSON"),
    ("json", "GeoJSON"),
    ("geojsonl", "GeoJSONSeq"),
    ("geojsons", "GeoJSONSeq"),
    ("fgb", "FlatGeobuf"),
    ("gdb", "OpenFileGDB"),
];

/// Picks the output driver from the file extension of `path`.
pub fn detect_driver<P: AsRef<Path>>(path: P) -> Result<&'static str> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    DRIVERS_BY_EXTENSION
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, driver)| *driver)
        .ok_or_else(|| OgrioError::DriverNotDetected {
            path: path.to_path_buf(),
        })
}

/// Attribute field data types that can be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Integer64,
    Real,
    String,
    Date,
    DateTime,
}

impl FieldKind {
    fn to_ogr(self) -> OGRFieldType::Type {
        match self {
            FieldKind::Integer => OGRFieldType::OFTInteger,
            FieldKind::Integer64 => OGRFieldType::OFTInteger64,
            FieldKind::Real => OGRFieldType::OFTReal,
            FieldKind::String => OGRFieldType::OFTString,
            FieldKind::Date => OGRFieldType::OFTDate,
            FieldKind::DateTime => OGRFieldType::OFTDateTime,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
    /// Formatting width, driver default when `None`.
    pub width: Option<i32>,
}

impl FieldSchema {
    pub fn new(name: &str, kind: FieldKind) -> Self {
        FieldSchema {
            name: name.to_string(),
            kind,
            width: None,
        }
    }

    pub fn with_width(mut self, width: i32) -> Self {
        self.width = Some(width);
        self
    }
}

/// Schema of the layer to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSchema {
    pub name: String,
    /// `None` writes a table without geometry.
    pub geometry_type: Option<GeometryType>,
    /// Any definition accepted by [`SpatialRef::from_definition`].
    pub crs: Option<String>,
    pub fields: Vec<FieldSchema>,
}

/// One feature to write: a WKT geometry and one value per schema field.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteFeature {
    pub geometry: Option<String>,
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Driver short name, detected from the extension when `None`.
    pub driver: Option<String>,
    /// Append to an existing data source instead of replacing it.
    pub append: bool,
    /// Encoding of the attribute data; shapefiles only.
    pub encoding: Option<String>,
    /// Layer creation options as `KEY=VALUE`.
    pub layer_options: Vec<String>,
    /// Dataset creation options as `KEY=VALUE`.
    pub dataset_options: Vec<String>,
}

/// Writes `features` to the layer `schema.name` of the data source at
/// `path`, returning the number of features written.
///
/// Unless `append` is set, an existing data source at `path` is replaced.
/// Features are written inside a transaction when the driver supports one,
/// so a failure leaves such data sources untouched.
pub fn write_layer<P, I>(
    path: P,
    schema: &LayerSchema,
    features: I,
    options: &WriteOptions,
) -> Result<u64>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = WriteFeature>,
{
    let path = path.as_ref();
    let driver_name = match &options.driver {
        Some(name) => name.clone(),
        None => detect_driver(path)?.to_string(),
    };
    let driver = Driver::get_by_name(&driver_name)
        .map_err(|_| OgrioError::BadArgument(format!("unknown driver '{driver_name}'")))?;
    if !driver.can_create() {
        return Err(OgrioError::DriverCannotWrite {
            driver: driver_name,
        });
    }

    let mut ds = open_or_create(&driver, path, options)?;

    let existing = ds.layer_by_name(&schema.name).ok().map(|layer| layer.name());
    let layer_name = match existing {
        Some(name) => name,
        None => create_layer(&mut ds, schema, &driver_name, options)?,
    };

    let written = if ds.supports_transactions() {
        let txn = ds.start_transaction()?;
        let written = write_features(txn.dataset(), &layer_name, features)?;
        txn.commit()?;
        written
    } else {
        let written = write_features(&ds, &layer_name, features)?;
        ds.layer_by_name(&layer_name)?.sync_to_disk()?;
        written
    };
    debug!(
        "wrote {written} feature(s) to layer '{layer_name}' of '{}'",
        path.display()
    );
    Ok(written)
}

fn open_or_create(driver: &Driver, path: &Path, options: &WriteOptions) -> Result<Dataset> {
    let exists = path_exists(path);
    if options.append && exists {
        return Dataset::open_ex(
            path,
            DatasetOptions {
                open_flags: GdalOpenFlags::vector_update(),
                ..DatasetOptions::default()
            },
        );
    }
    if exists {
        debug!("replacing existing data source '{}'", path.display());
        driver.delete(path)?;
    }
    let mut dataset_options = CslStringList::new();
    for option in &options.dataset_options {
        dataset_options.add_name_value_pair(option)?;
    }
    driver.create_vector_only(path, &dataset_options)
}

/// Creates the layer and its fields, returning the name the driver gave it.
fn create_layer(
    ds: &mut Dataset,
    schema: &LayerSchema,
    driver_name: &str,
    options: &WriteOptions,
) -> Result<String> {
    let srs = schema
        .crs
        .as_deref()
        .map(SpatialRef::from_definition)
        .transpose()?;
    let geometry_type = schema
        .geometry_type
        .map_or(OGRwkbGeometryType::wkbNone, |t| t.to_ogr());

    let mut layer_options = CslStringList::new();
    for option in &options.layer_options {
        layer_options.add_name_value_pair(option)?;
    }
    if let Some(encoding) = &options.encoding {
        if driver_name == "ESRI Shapefile" {
            layer_options.set_name_value("ENCODING", encoding)?;
        }
    }

    let mut layer = ds.create_layer(&schema.name, srs.as_ref(), geometry_type, &layer_options)?;
    for field in &schema.fields {
        layer.create_field(&field.name, field.kind.to_ogr(), field.width)?;
    }
    Ok(layer.name())
}

fn write_features<I>(ds: &Dataset, layer_name: &str, features: I) -> Result<u64>
where
    I: IntoIterator<Item = WriteFeature>,
{
    let mut layer = ds.layer_by_name(layer_name)?;
    let defn = layer.defn();
    let field_count = defn.field_count();

    let mut written = 0;
    for feature in features {
        if feature.values.len() != field_count {
            return Err(OgrioError::BadArgument(format!(
                "feature {written} has {} value(s), layer '{layer_name}' has {field_count} field(s)",
                feature.values.len()
            )));
        }
        let mut ogr_feature = Feature::new(&defn)?;
        if let Some(wkt) = &feature.geometry {
            ogr_feature.set_geometry(Geometry::from_wkt(wkt)?)?;
        }
        for (idx, value) in feature.values.iter().enumerate() {
            ogr_feature.set_field(idx, value)?;
        }
        layer.create_feature(&ogr_feature)?;
        written += 1;
    }
    Ok(written)
}
