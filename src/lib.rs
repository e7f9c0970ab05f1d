//! Vector data I/O over [GDAL](http://gdal.org/)/OGR.
//!
//! `ogrio` lists the layers of a geospatial data source, describes them
//! (CRS, geometry type, encoding, fields, feature count), reads feature
//! bounds and writes layers, on top of safe wrappers for the GDAL handles
//! involved. Process-wide GDAL configuration options are exposed in
//! [`config`].
//!
//! ## Use
//!
//! ```no_run
//! use ogrio::{list_layers, read_info};
//!
//! for layer in list_layers("data/countries.gpkg").unwrap().iter() {
//!     println!("{}: {:?}", layer.name, layer.geometry_type.map(|t| t.to_string()));
//! }
//!
//! let info = read_info("data/countries.gpkg").unwrap();
//! assert_eq!(info.crs.as_deref(), Some("EPSG:4326"));
//! println!("{} features, {} fields", info.features, info.fields.len());
//! ```
//!
//! Measured geometry types are not supported: XYZM layers are reported as
//! 2.5D and XYM layers as 2D, with a [`ReadWarning`] (also logged through
//! the [`log`](https://docs.rs/log) facade).

#![crate_name = "ogrio"]
#![crate_type = "lib"]

pub mod config;
pub mod core;
pub mod cpl;
mod dataset;
mod driver;
pub mod errors;
mod options;
pub mod read;
pub mod spatial_ref;
mod utils;
pub mod vector;
pub mod version;
pub mod vsi;
pub mod write;

#[cfg(test)]
mod test_utils;

pub use crate::core::{
    list_drivers, list_layers, read_info, read_info_ex, DriverMode, FieldInfo, InfoOptions,
    LayerCapabilities, LayerInfo, LayerListing, LayerSelector, LayerSummary, ReadWarning,
};
pub use config::{get_config_option, set_config_options, ConfigValue};
pub use dataset::{Dataset, LayerIterator, Transaction};
pub use driver::{drivers, Driver};
pub use errors::{OgrioError, Result};
pub use options::{DatasetOptions, GdalOpenFlags};
pub use read::{read_bounds, read_bounds_ex, FeatureBounds, ReadOptions};
pub use version::gdal_version;
pub use write::{write_layer, WriteOptions};
