use std::ffi::{c_char, CString, NulError};
use std::path::Path;
use std::ptr::{self, null_mut};

use gdal_sys::{self, GDALDatasetH, OGRErr, OGRwkbGeometryType};

use crate::cpl::CslStringList;
use crate::driver::{Driver, _register_drivers};
use crate::errors::*;
use crate::options::{DatasetOptions, GdalOpenFlags};
use crate::spatial_ref::SpatialRef;
use crate::utils::{_last_null_pointer_err, _path_to_c_string};
use crate::vector::Layer;

/// Wrapper around a [`GDALDataset`][GDALDataset] object.
///
/// Represents a data source containing vector layers. The underlying handle
/// is closed when the value is dropped.
///
/// [GDALDataset]: https://gdal.org/api/gdaldataset_cpp.html#_CPPv411GDALDataset
#[derive(Debug)]
pub struct Dataset {
    c_dataset: GDALDatasetH,
}

// GDAL Docs state: The returned dataset should only be accessed by one thread at a time.
// See: https://gdal.org/api/raster_c_api.html#_CPPv48GDALOpenPKc10GDALAccess
unsafe impl Send for Dataset {}

/// Holds the `CString`s backing a null-terminated `char **` argument.
struct CStringArray {
    _strings: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl CStringArray {
    fn new(items: Option<&[&str]>) -> std::result::Result<Option<Self>, NulError> {
        let Some(items) = items else {
            return Ok(None);
        };
        let strings = items
            .iter()
            .map(|&s| CString::new(s))
            .collect::<std::result::Result<Vec<CString>, NulError>>()?;
        let mut ptrs = strings.iter().map(|s| s.as_ptr()).collect::<Vec<_>>();
        ptrs.push(ptr::null());
        Ok(Some(Self {
            _strings: strings,
            ptrs,
        }))
    }

    fn as_ptr(array: &Option<Self>) -> *const *const c_char {
        array.as_ref().map_or(ptr::null(), |a| a.ptrs.as_ptr())
    }
}

impl Dataset {
    /// Returns the wrapped C pointer
    ///
    /// # Safety
    /// This method returns a raw C pointer
    pub unsafe fn c_dataset(&self) -> GDALDatasetH {
        self.c_dataset
    }

    /// Creates a new Dataset by wrapping a C pointer
    ///
    /// # Safety
    /// This method operates on a raw C pointer
    pub unsafe fn from_c_dataset(c_dataset: GDALDatasetH) -> Dataset {
        Dataset { c_dataset }
    }

    /// Open a dataset at the given `path` with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        Self::_open_ex(path.as_ref(), DatasetOptions::default())
    }

    /// Open a dataset with extended options. See [`GDALOpenEx`].
    ///
    /// [`GDALOpenEx`]: https://gdal.org/doxygen/gdal_8h.html#a9cb8585d0b3c16726b08e25bcc94274a
    pub fn open_ex<P: AsRef<Path>>(path: P, options: DatasetOptions) -> Result<Dataset> {
        Self::_open_ex(path.as_ref(), options)
    }

    fn _open_ex(path: &Path, options: DatasetOptions) -> Result<Dataset> {
        _register_drivers();

        let c_filename = _path_to_c_string(path)?;
        let c_open_flags = options.open_flags.bits();

        // we need to keep the CStrings and the pointers around
        let c_allowed_drivers = CStringArray::new(options.allowed_drivers)?;
        let c_open_options = CStringArray::new(options.open_options)?;
        let c_sibling_files = CStringArray::new(options.sibling_files)?;

        let c_dataset = unsafe {
            gdal_sys::GDALOpenEx(
                c_filename.as_ptr(),
                c_open_flags,
                CStringArray::as_ptr(&c_allowed_drivers),
                CStringArray::as_ptr(&c_open_options),
                CStringArray::as_ptr(&c_sibling_files),
            )
        };
        if c_dataset.is_null() {
            let err = _last_null_pointer_err("GDALOpenEx");
            let msg = match err {
                OgrioError::NullPointer { msg, .. } if !msg.is_empty() => msg,
                _ => "No such file or directory".to_string(),
            };
            return Err(OgrioError::DataSource {
                path: path.to_path_buf(),
                msg,
            });
        }
        Ok(Dataset { c_dataset })
    }

    /// Get the driver used to open this dataset.
    pub fn driver(&self) -> Driver {
        unsafe {
            let c_driver = gdal_sys::GDALGetDatasetDriver(self.c_dataset);
            Driver::from_c_driver(c_driver)
        }
    }

    /// Get the number of layers in this dataset.
    pub fn layer_count(&self) -> usize {
        let count = unsafe { gdal_sys::GDALDatasetGetLayerCount(self.c_dataset) };
        count.max(0) as usize
    }

    /// Fetch a layer by index.
    ///
    /// Applies to vector datasets, and fetches by the given
    /// _0-based_ index.
    pub fn layer(&self, idx: usize) -> Result<Layer<'_>> {
        let count = self.layer_count();
        if idx >= count {
            return Err(OgrioError::LayerIndexOutOfRange { index: idx, count });
        }
        let c_layer = unsafe { gdal_sys::GDALDatasetGetLayer(self.c_dataset, idx as i32) };
        if c_layer.is_null() {
            return Err(_last_null_pointer_err("GDALDatasetGetLayer"));
        }
        Ok(unsafe { Layer::from_c_layer(self, c_layer) })
    }

    /// Fetch a layer by name.
    pub fn layer_by_name(&self, name: &str) -> Result<Layer<'_>> {
        let c_name = CString::new(name)?;
        let c_layer =
            unsafe { gdal_sys::GDALDatasetGetLayerByName(self.c_dataset, c_name.as_ptr()) };
        if c_layer.is_null() {
            unsafe { gdal_sys::CPLErrorReset() };
            return Err(OgrioError::LayerNotFound {
                name: name.to_string(),
            });
        }
        Ok(unsafe { Layer::from_c_layer(self, c_layer) })
    }

    /// Returns an iterator over the layers of the dataset.
    pub fn layers(&self) -> LayerIterator<'_> {
        LayerIterator::with_dataset(self)
    }

    /// Create a new layer with a name, an optional `SpatialRef`, a raw OGR
    /// geometry type, and layer creation options.
    pub fn create_layer(
        &mut self,
        name: &str,
        srs: Option<&SpatialRef>,
        ty: OGRwkbGeometryType::Type,
        options: &CslStringList,
    ) -> Result<Layer<'_>> {
        let c_name = CString::new(name)?;
        let c_srs = match srs {
            Some(srs) => unsafe { srs.to_c_hsrs() },
            None => null_mut(),
        };

        let c_layer = unsafe {
            gdal_sys::GDALDatasetCreateLayer(
                self.c_dataset,
                c_name.as_ptr(),
                c_srs,
                ty,
                options.as_ptr(),
            )
        };
        if c_layer.is_null() {
            return Err(_last_null_pointer_err("GDALDatasetCreateLayer"));
        };
        Ok(unsafe { Layer::from_c_layer(self, c_layer) })
    }

    /// Whether the datasource supports native transactions.
    pub fn supports_transactions(&self) -> bool {
        let rv = unsafe {
            gdal_sys::GDALDatasetTestCapability(self.c_dataset, c"Transactions".as_ptr())
        };
        rv == 1
    }

    /// For datasources which support transactions, this creates a transaction.
    ///
    /// All changes done after the start of the transaction are applied to the
    /// datasource when [`commit`](Transaction::commit) is called. Dropping the
    /// `Transaction` without committing rolls it back.
    ///
    /// For datasources that do not support transactions, this function will
    /// return [`OGRErr::OGRERR_UNSUPPORTED_OPERATION`].
    pub fn start_transaction(&mut self) -> Result<Transaction<'_>> {
        // no emulation: drivers without native transactions report unsupported
        let force = 0;
        let rv = unsafe { gdal_sys::GDALDatasetStartTransaction(self.c_dataset, force) };
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "GDALDatasetStartTransaction",
            });
        }
        Ok(Transaction {
            dataset: self,
            rollback_on_drop: true,
        })
    }
}

pub struct LayerIterator<'a> {
    dataset: &'a Dataset,
    idx: usize,
    count: usize,
}

impl<'a> Iterator for LayerIterator<'a> {
    type Item = Layer<'a>;

    #[inline]
    fn next(&mut self) -> Option<Layer<'a>> {
        while self.idx < self.count {
            let idx = self.idx;
            self.idx += 1;
            if let Ok(layer) = self.dataset.layer(idx) {
                return Some(layer);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.count - self.idx))
    }
}

impl<'a> LayerIterator<'a> {
    pub fn with_dataset(dataset: &'a Dataset) -> LayerIterator<'a> {
        LayerIterator {
            dataset,
            idx: 0,
            count: dataset.layer_count(),
        }
    }
}

impl Drop for Dataset {
    fn drop(&mut self) {
        unsafe {
            gdal_sys::GDALClose(self.c_dataset);
        }
    }
}

/// Represents an in-flight transaction on a dataset.
///
/// If the transaction is not explicitly committed when it is dropped, it is
/// implicitly rolled back.
#[derive(Debug)]
pub struct Transaction<'a> {
    dataset: &'a mut Dataset,
    rollback_on_drop: bool,
}

impl Transaction<'_> {
    /// Returns a reference to the dataset from which this `Transaction` was created.
    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    /// Commits this transaction.
    pub fn commit(mut self) -> Result<()> {
        let rv = unsafe { gdal_sys::GDALDatasetCommitTransaction(self.dataset.c_dataset) };
        self.rollback_on_drop = false;
        if rv != OGRErr::OGRERR_NONE {
            return Err(OgrioError::OgrError {
                err: rv,
                method_name: "GDALDatasetCommitTransaction",
            });
        }
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.rollback_on_drop {
            // errors can't be reported from drop
            unsafe { gdal_sys::GDALDatasetRollbackTransaction(self.dataset.c_dataset) };
        }
    }
}

/// Opens `path` for reading with vector drivers only.
pub(crate) fn open_vector(path: &Path, open_options: Option<&[&str]>) -> Result<Dataset> {
    Dataset::open_ex(
        path,
        DatasetOptions {
            open_flags: GdalOpenFlags::vector_read(),
            open_options,
            ..DatasetOptions::default()
        },
    )
}
