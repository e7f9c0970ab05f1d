//! OGR vector data
//!
//! Thin wrappers over layers, their schema, features and geometries.
//!
//! ## Reading
//!
//! ```no_run
//! use ogrio::Dataset;
//!
//! let dataset = Dataset::open("data/countries.shp").unwrap();
//! let mut layer = dataset.layer(0).unwrap();
//! for feature in layer.features() {
//!     if let Some(geometry) = feature.geometry() {
//!         println!("{:?} {:?}", feature.fid(), geometry.envelope());
//!     }
//! }
//! ```

pub use crate::vector::defn::{Defn, Field, FieldIterator};
pub use crate::vector::feature::{Feature, FieldValue};
pub use crate::vector::geometry::{Geometry, GeometryRef};
pub use crate::vector::geometry_type::{
    normalize_geometry_type, ogr_type_name, GeometryKind, GeometryType, NormalizedGeometryType,
};
pub use crate::vector::layer::{FeatureIterator, Layer, LayerCaps};
pub use gdal_sys::{OGRFieldType, OGRwkbGeometryType};

mod defn;
mod feature;
mod geometry;
mod geometry_type;
mod layer;
