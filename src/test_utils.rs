use std::ffi::{c_void, CString};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::cpl::CslStringList;
use crate::driver::Driver;
use crate::spatial_ref::SpatialRef;
use crate::vector::{
    Feature, FieldValue, Geometry, GeometryKind, GeometryType, OGRFieldType, OGRwkbGeometryType,
};
use crate::write::{write_layer, FieldKind, FieldSchema, LayerSchema, WriteFeature, WriteOptions};

/// A struct that contains a temporary directory and a path to a file in that directory.
pub struct TempFixture {
    _temp_dir: tempfile::TempDir,
    temp_path: PathBuf,
}

impl TempFixture {
    /// Creates a temporary directory and path to a non-existent file with given `name`.
    ///
    /// Returns the struct `TempFixture` that contains the temp dir (for clean-up on `drop`)
    /// as well as the empty file path.
    pub fn empty(name: &str) -> Self {
        let _temp_dir = tempfile::tempdir().unwrap();
        let temp_path = _temp_dir.path().join(name);
        Self {
            _temp_dir,
            temp_path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.temp_path
    }
}

/// A `/vsimem/` (in-memory) file in its own directory.
///
/// The directory is deleted when the value is dropped.
pub struct InMemoryFixture {
    dir: PathBuf,
    path: PathBuf,
}

impl InMemoryFixture {
    pub fn new(filename: &str) -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = PathBuf::from(format!("/vsimem/ogrio_{}_{n}", std::process::id()));
        let path = dir.join(filename);
        Self { dir, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InMemoryFixture {
    fn drop(&mut self) {
        let c_dir = crate::utils::_path_to_c_string(&self.dir).unwrap();
        unsafe { gdal_sys::VSIRmdirRecursive(c_dir.as_ptr()) };
    }
}

/// Scoped value for temporarily suppressing thread-local GDAL log messages.
///
/// Useful for tests that expect GDAL errors and want to keep the output log clean
/// of distracting yet expected error messages.
pub(crate) struct SuppressGDALErrorLog {
    // Make !Sync and !Send, and force use of `new`.
    _private: PhantomData<*mut c_void>,
}

impl SuppressGDALErrorLog {
    pub(crate) fn new() -> Self {
        unsafe { gdal_sys::CPLPushErrorHandler(Some(gdal_sys::CPLQuietErrorHandler)) };
        SuppressGDALErrorLog {
            _private: PhantomData,
        }
    }
}

impl Drop for SuppressGDALErrorLog {
    fn drop(&mut self) {
        unsafe { gdal_sys::CPLPopErrorHandler() };
    }
}

const CONTINENTS: [&str; 6] = [
    "Africa",
    "Asia",
    "Europe",
    "North America",
    "Oceania",
    "South America",
];

/// Number of countries in the reference layer.
pub const NATURALEARTH_FEATURES: usize = 177;

fn naturalearth_schema() -> LayerSchema {
    LayerSchema {
        name: "naturalearth_lowres".to_string(),
        geometry_type: Some(GeometryType::flat(GeometryKind::Polygon)),
        crs: Some("EPSG:4326".to_string()),
        fields: vec![
            FieldSchema::new("pop_est", FieldKind::Real),
            FieldSchema::new("continent", FieldKind::String),
            FieldSchema::new("name", FieldKind::String),
            FieldSchema::new("iso_a3", FieldKind::String),
            FieldSchema::new("gdp_md_est", FieldKind::Real),
        ],
    }
}

/// One 19°x17° cell per country on an 18 column grid starting at (-180, -90).
fn naturalearth_features() -> impl Iterator<Item = WriteFeature> {
    (0..NATURALEARTH_FEATURES).map(|i| {
        let x0 = -180.0 + (i % 18) as f64 * 20.0;
        let y0 = -90.0 + (i / 18) as f64 * 18.0;
        let (x1, y1) = (x0 + 19.0, y0 + 17.0);
        WriteFeature {
            geometry: Some(format!(
                "POLYGON (({x0} {y0}, {x0} {y1}, {x1} {y1}, {x1} {y0}, {x0} {y0}))"
            )),
            values: vec![
                FieldValue::Real(i as f64 * 1000.0),
                CONTINENTS[i % CONTINENTS.len()].into(),
                format!("Country {i}").into(),
                format!("C{i:03}").into(),
                FieldValue::Real(i as f64 * 10.5),
            ],
        }
    })
}

fn write_naturalearth(path: &Path, options: &WriteOptions) {
    write_layer(path, &naturalearth_schema(), naturalearth_features(), options).unwrap();
}

/// A shapefile with 177 polygons in EPSG:4326 and five attribute fields.
pub fn naturalearth_lowres() -> TempFixture {
    let fixture = TempFixture::empty("naturalearth_lowres.shp");
    let options = WriteOptions {
        encoding: Some("UTF-8".to_string()),
        ..Default::default()
    };
    write_naturalearth(fixture.path(), &options);
    fixture
}

/// The same data as [`naturalearth_lowres`], as a GeoPackage in `/vsimem/`.
pub fn naturalearth_lowres_vsi() -> InMemoryFixture {
    let fixture = InMemoryFixture::new("naturalearth_lowres.gpkg");
    write_naturalearth(fixture.path(), &WriteOptions::default());
    fixture
}

/// Layers of the measured archive in creation order: name, OGR type, one
/// sample geometry (`None` for tables) and the reported geometry type.
pub const MEASURED_ARCHIVE_LAYERS: [MeasuredArchiveLayer; 7] = [
    ("basetable_2", OGRwkbGeometryType::wkbNone, None, None),
    (
        "test_points",
        OGRwkbGeometryType::wkbPoint,
        Some("POINT (1 2)"),
        Some("Point"),
    ),
    (
        "test_multipoints",
        OGRwkbGeometryType::wkbMultiPoint,
        Some("MULTIPOINT ((1 2), (3 4))"),
        Some("MultiPoint"),
    ),
    (
        "test_lines",
        OGRwkbGeometryType::wkbMultiLineStringZM,
        Some("MULTILINESTRING ZM ((0 0 1 2, 1 1 1 3))"),
        Some("2.5D MultiLineString"),
    ),
    (
        "test_polygons",
        OGRwkbGeometryType::wkbPolygon,
        Some("POLYGON ((0 0, 0 1, 1 1, 0 0))"),
        Some("Polygon"),
    ),
    ("test_table", OGRwkbGeometryType::wkbNone, None, None),
    (
        "test_areas",
        OGRwkbGeometryType::wkbMultiPolygonZM,
        Some("MULTIPOLYGON ZM (((0 0 0 1, 0 1 0 2, 1 1 0 3, 0 0 0 1)))"),
        Some("2.5D MultiPolygon"),
    ),
];

pub type MeasuredArchiveLayer = (
    &'static str,
    OGRwkbGeometryType::Type,
    Option<&'static str>,
    Option<&'static str>,
);

/// Reported geometry type label of a measured archive layer.
pub fn measured_archive_label(name: &str) -> Option<&'static str> {
    MEASURED_ARCHIVE_LAYERS
        .iter()
        .find(|(layer, ..)| *layer == name)
        .and_then(|(.., label)| *label)
}

/// A GeoPackage with seven layers, two of them with measured geometries.
pub fn measured_archive() -> TempFixture {
    let fixture = TempFixture::empty("test_fgdb.gpkg");
    let driver = Driver::get_by_name("GPKG").unwrap();
    let mut ds = driver
        .create_vector_only(fixture.path(), &CslStringList::new())
        .unwrap();
    let srs = SpatialRef::from_epsg(4326).unwrap();

    for (name, ty, wkt, _) in MEASURED_ARCHIVE_LAYERS {
        let srs = (ty != OGRwkbGeometryType::wkbNone).then_some(&srs);
        let mut layer = ds
            .create_layer(name, srs, ty, &CslStringList::new())
            .unwrap();
        layer
            .create_field("label", OGRFieldType::OFTString, None)
            .unwrap();
        let defn = layer.defn();
        let mut feature = Feature::new(&defn).unwrap();
        if let Some(wkt) = wkt {
            feature.set_geometry(Geometry::from_wkt(wkt).unwrap()).unwrap();
        }
        feature.set_field(0, &FieldValue::from(name)).unwrap();
        layer.create_feature(&feature).unwrap();
    }
    fixture
}

/// The measured archive stored as the only member of a zip file; the
/// fixture path is the zip file.
pub fn measured_archive_zip() -> TempFixture {
    let gpkg = measured_archive();
    let bytes = std::fs::read(gpkg.path()).unwrap();

    let fixture = TempFixture::empty("test_fgdb.gpkg.zip");
    let member = format!("/vsizip/{}/test_fgdb.gpkg", fixture.path().display());
    let c_member = CString::new(member).unwrap();
    unsafe {
        let fp = gdal_sys::VSIFOpenL(c_member.as_ptr(), c"wb".as_ptr());
        assert!(!fp.is_null(), "cannot create zip member");
        let written = gdal_sys::VSIFWriteL(bytes.as_ptr().cast(), 1, bytes.len(), fp);
        assert_eq!(written, bytes.len());
        assert_eq!(gdal_sys::VSIFCloseL(fp), 0);
    }
    fixture
}
