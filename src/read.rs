//! Per-feature bounds
//!
//! ```no_run
//! use geo_types::{coord, Rect};
//! use ogrio::read::{read_bounds_ex, ReadOptions};
//!
//! let bounds = read_bounds_ex(
//!     "data/countries.shp",
//!     &ReadOptions {
//!         where_clause: Some("continent = 'Africa'".to_string()),
//!         bbox: Some(Rect::new(coord! { x: -20., y: -40. }, coord! { x: 55., y: 40. })),
//!         ..Default::default()
//!     },
//! )
//! .unwrap();
//! println!("{} features", bounds.len());
//! ```

use std::path::Path;

use geo_types::Rect;
use log::debug;

use crate::core::{select_layer, LayerSelector};
use crate::dataset::open_vector;
use crate::errors::*;
use crate::vector::LayerCaps;
use crate::vsi::resolve_source;

/// FID and 2D bounds of one feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBounds {
    pub fid: i64,
    /// `None` for features with a null or empty geometry.
    pub bounds: Option<Rect<f64>>,
}

/// Options for [`read_bounds_ex`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Layer to read, the first one when `None`.
    pub layer: Option<LayerSelector>,
    /// Number of features to skip, after filtering.
    pub skip_features: u64,
    /// Maximum number of features to return, after skipping.
    pub max_features: Option<u64>,
    /// SQL `WHERE` clause applied to the attributes.
    pub where_clause: Option<String>,
    /// Only features intersecting this rectangle are returned.
    pub bbox: Option<Rect<f64>>,
}

/// Reads the bounds of every feature of the first layer.
pub fn read_bounds<P: AsRef<Path>>(path: P) -> Result<Vec<FeatureBounds>> {
    read_bounds_ex(path, &ReadOptions::default())
}

/// Reads the bounds of the features selected by `options`.
pub fn read_bounds_ex<P: AsRef<Path>>(
    path: P,
    options: &ReadOptions,
) -> Result<Vec<FeatureBounds>> {
    let ds = open_vector(&resolve_source(path.as_ref()), None)?;
    let mut layer = select_layer(&ds, options.layer.as_ref())?;

    if let Some(query) = &options.where_clause {
        layer.set_attribute_filter(query)?;
    }
    if let Some(bbox) = options.bbox {
        layer.set_spatial_filter_rect(bbox);
    }
    layer.reset_reading();

    let skip = options.skip_features;
    let mut iter_skip = 0;
    if skip > 0 {
        if layer.has_capability(LayerCaps::OLCFastSetNextByIndex) {
            if layer.set_next_by_index(skip).is_err() {
                // past the end
                unsafe { gdal_sys::CPLErrorReset() };
                return Ok(Vec::new());
            }
        } else {
            debug!("skipping {skip} features of '{}' by iteration", layer.name());
            iter_skip = saturating_usize(skip);
        }
    }
    let take = options.max_features.map_or(usize::MAX, saturating_usize);

    let bounds = layer
        .features()
        .skip(iter_skip)
        .take(take)
        .map(|feature| FeatureBounds {
            fid: feature.fid().unwrap_or(-1),
            bounds: feature.geometry().and_then(|geom| geom.envelope()),
        })
        .collect();
    Ok(bounds)
}

/// Counts past `usize::MAX` mean "all of them" on 32-bit targets.
fn saturating_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{naturalearth_lowres, SuppressGDALErrorLog};
    use geo_types::coord;

    #[test]
    fn test_read_bounds_all() {
        let fixture = naturalearth_lowres();
        let bounds = read_bounds(fixture.path()).unwrap();
        assert_eq!(bounds.len(), 177);
        assert_eq!(bounds[0].fid, 0);
        assert!(bounds.iter().all(|b| b.bounds.is_some()));
    }

    #[test]
    fn test_skip_and_max() {
        let fixture = naturalearth_lowres();
        let bounds = read_bounds_ex(
            fixture.path(),
            &ReadOptions {
                skip_features: 10,
                max_features: Some(2),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            bounds.iter().map(|b| b.fid).collect::<Vec<_>>(),
            vec![10, 11]
        );

        let unbounded = read_bounds_ex(
            fixture.path(),
            &ReadOptions {
                max_features: Some(u64::MAX),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(unbounded.len(), 177);

        let past_end = read_bounds_ex(
            fixture.path(),
            &ReadOptions {
                skip_features: 500,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_saturating_usize() {
        assert_eq!(saturating_usize(7), 7);
        assert_eq!(saturating_usize(u64::MAX), usize::MAX);
    }

    #[test]
    fn test_where_clause() {
        let fixture = naturalearth_lowres();
        let bounds = read_bounds_ex(
            fixture.path(),
            &ReadOptions {
                where_clause: Some("iso_a3 IN ('C005', 'C007')".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            bounds.iter().map(|b| b.fid).collect::<Vec<_>>(),
            vec![5, 7]
        );
    }

    #[test]
    fn test_invalid_where_clause() {
        let _nolog = SuppressGDALErrorLog::new();
        let fixture = naturalearth_lowres();
        let err = read_bounds_ex(
            fixture.path(),
            &ReadOptions {
                where_clause: Some("invalid where".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, OgrioError::InvalidQuery { .. }));
    }

    #[test]
    fn test_bbox() {
        let fixture = naturalearth_lowres();
        let bbox = Rect::new(coord! { x: -180., y: -90. }, coord! { x: -170., y: -80. });
        let bounds = read_bounds_ex(
            fixture.path(),
            &ReadOptions {
                bbox: Some(bbox),
                ..Default::default()
            },
        )
        .unwrap();
        // only the first cell touches the south-west corner
        assert_eq!(
            bounds.iter().map(|b| b.fid).collect::<Vec<_>>(),
            vec![0]
        );
    }
}
