use std::fmt::{Display, Formatter};

use gdal_sys::{self, OGRwkbGeometryType};

use crate::errors::*;
use crate::utils::_string;

/// The base (flat, linear) geometry kinds reported by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    Unknown,
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
    LinearRing,
}

impl GeometryKind {
    pub fn name(&self) -> &'static str {
        match self {
            GeometryKind::Unknown => "Unknown",
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::GeometryCollection => "GeometryCollection",
            GeometryKind::LinearRing => "LinearRing",
        }
    }

    fn from_flat(flat: OGRwkbGeometryType::Type) -> Option<Self> {
        let kind = match flat {
            OGRwkbGeometryType::wkbUnknown => GeometryKind::Unknown,
            OGRwkbGeometryType::wkbPoint => GeometryKind::Point,
            OGRwkbGeometryType::wkbLineString => GeometryKind::LineString,
            OGRwkbGeometryType::wkbPolygon => GeometryKind::Polygon,
            OGRwkbGeometryType::wkbMultiPoint => GeometryKind::MultiPoint,
            OGRwkbGeometryType::wkbMultiLineString => GeometryKind::MultiLineString,
            OGRwkbGeometryType::wkbMultiPolygon => GeometryKind::MultiPolygon,
            OGRwkbGeometryType::wkbGeometryCollection => GeometryKind::GeometryCollection,
            OGRwkbGeometryType::wkbLinearRing => GeometryKind::LinearRing,
            _ => return None,
        };
        Some(kind)
    }

    fn to_flat(self) -> OGRwkbGeometryType::Type {
        match self {
            GeometryKind::Unknown => OGRwkbGeometryType::wkbUnknown,
            GeometryKind::Point => OGRwkbGeometryType::wkbPoint,
            GeometryKind::LineString => OGRwkbGeometryType::wkbLineString,
            GeometryKind::Polygon => OGRwkbGeometryType::wkbPolygon,
            GeometryKind::MultiPoint => OGRwkbGeometryType::wkbMultiPoint,
            GeometryKind::MultiLineString => OGRwkbGeometryType::wkbMultiLineString,
            GeometryKind::MultiPolygon => OGRwkbGeometryType::wkbMultiPolygon,
            GeometryKind::GeometryCollection => OGRwkbGeometryType::wkbGeometryCollection,
            GeometryKind::LinearRing => OGRwkbGeometryType::wkbLinearRing,
        }
    }
}

/// A layer geometry type: a [`GeometryKind`] that is either 2D or 2.5D (XYZ).
///
/// Measured (M) types are never represented; they are downgraded when read,
/// see [`normalize_geometry_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryType {
    kind: GeometryKind,
    has_z: bool,
}

impl GeometryType {
    pub const fn new(kind: GeometryKind, has_z: bool) -> Self {
        GeometryType { kind, has_z }
    }

    pub const fn flat(kind: GeometryKind) -> Self {
        Self::new(kind, false)
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn has_z(&self) -> bool {
        self.has_z
    }

    /// The OGR geometry type code for this type.
    pub fn to_ogr(&self) -> OGRwkbGeometryType::Type {
        let flat = self.kind.to_flat();
        if self.has_z {
            unsafe { gdal_sys::OGR_GT_SetZ(flat) }
        } else {
            flat
        }
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.has_z {
            f.write_str("2.5D ")?;
        }
        f.write_str(self.kind.name())
    }
}

/// Result of classifying a raw OGR geometry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedGeometryType {
    /// `None` for layers without geometry.
    pub geometry_type: Option<GeometryType>,
    /// The raw type carried an M dimension that was dropped.
    pub measured: bool,
    /// The raw OGR type as reported by the driver.
    pub original: OGRwkbGeometryType::Type,
}

/// The OGR name of a raw geometry type, e.g. `"3D Measured Multi Line String"`.
pub fn ogr_type_name(ogr_type: OGRwkbGeometryType::Type) -> String {
    _string(unsafe { gdal_sys::OGRGeometryTypeToName(ogr_type) }).unwrap_or_default()
}

/// Classifies a raw OGR geometry type.
///
/// Curve types are replaced by their linear counterpart. Measured types lose
/// their M dimension: XYZM becomes 2.5D, XYM becomes 2D, and `measured` is
/// set on the result. Types with no linear equivalent (TIN, polyhedral
/// surfaces, triangles) are rejected.
pub fn normalize_geometry_type(
    ogr_type: OGRwkbGeometryType::Type,
) -> Result<NormalizedGeometryType> {
    if ogr_type == OGRwkbGeometryType::wkbNone {
        return Ok(NormalizedGeometryType {
            geometry_type: None,
            measured: false,
            original: ogr_type,
        });
    }

    let mut linear = ogr_type;
    if unsafe { gdal_sys::OGR_GT_IsNonLinear(linear) } != 0 {
        linear = unsafe { gdal_sys::OGR_GT_GetLinear(linear) };
    }

    let measured = unsafe { gdal_sys::OGR_GT_HasM(linear) } != 0;
    let has_z = unsafe { gdal_sys::OGR_GT_HasZ(linear) } != 0;
    let flat = unsafe { gdal_sys::OGR_GT_Flatten(linear) };

    let kind = GeometryKind::from_flat(flat).ok_or_else(|| OgrioError::UnsupportedGeometryType {
        ogr_type,
        name: ogr_type_name(ogr_type),
    })?;

    Ok(NormalizedGeometryType {
        geometry_type: Some(GeometryType::new(kind, has_z)),
        measured,
        original: ogr_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(ogr_type: OGRwkbGeometryType::Type) -> Option<String> {
        normalize_geometry_type(ogr_type)
            .unwrap()
            .geometry_type
            .map(|t| t.to_string())
    }

    #[test]
    fn test_flat_types() {
        assert_eq!(label(OGRwkbGeometryType::wkbPolygon).as_deref(), Some("Polygon"));
        assert_eq!(label(OGRwkbGeometryType::wkbUnknown).as_deref(), Some("Unknown"));
        assert_eq!(label(OGRwkbGeometryType::wkbNone), None);
    }

    #[test]
    fn test_z_types() {
        assert_eq!(
            label(OGRwkbGeometryType::wkbMultiPolygon25D).as_deref(),
            Some("2.5D MultiPolygon")
        );
        // ISO 3D codes are reported like the 2.5D ones
        assert_eq!(
            label(1002 /* ISO wkbLineStringZ */).as_deref(),
            Some("2.5D LineString")
        );
    }

    #[test]
    fn test_measured_downgrade() {
        let zm = normalize_geometry_type(OGRwkbGeometryType::wkbMultiLineStringZM).unwrap();
        assert!(zm.measured);
        assert_eq!(
            zm.geometry_type,
            Some(GeometryType::new(GeometryKind::MultiLineString, true))
        );

        let m = normalize_geometry_type(OGRwkbGeometryType::wkbPointM).unwrap();
        assert!(m.measured);
        assert_eq!(m.geometry_type, Some(GeometryType::flat(GeometryKind::Point)));

        let z = normalize_geometry_type(OGRwkbGeometryType::wkbPoint25D).unwrap();
        assert!(!z.measured);
    }

    #[test]
    fn test_curves_are_linearized() {
        assert_eq!(
            label(OGRwkbGeometryType::wkbMultiSurface).as_deref(),
            Some("MultiPolygon")
        );
        assert_eq!(
            label(OGRwkbGeometryType::wkbCompoundCurveZ).as_deref(),
            Some("2.5D LineString")
        );
    }

    #[test]
    fn test_unsupported() {
        let err = normalize_geometry_type(OGRwkbGeometryType::wkbTIN).unwrap_err();
        assert!(matches!(err, OgrioError::UnsupportedGeometryType { .. }));
    }

    #[test]
    fn test_to_ogr() {
        let t = GeometryType::new(GeometryKind::MultiPolygon, true);
        assert_eq!(t.to_ogr(), OGRwkbGeometryType::wkbMultiPolygon25D);
        assert_eq!(
            GeometryType::flat(GeometryKind::Point).to_ogr(),
            OGRwkbGeometryType::wkbPoint
        );
    }
}
