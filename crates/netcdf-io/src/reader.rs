//! Reading datasets through libnetcdf.
//!
//! The same code path serves local files and OPeNDAP endpoints: libnetcdf
//! accepts a URL wherever it accepts a path when built with DAP support.

use std::path::Path;
use std::sync::{Arc, Once};

use indexmap::IndexMap;

use crate::array::{BlockSource, DataArray, LazyArray};
use crate::attrs::{number_attr, AttrValue, Attributes};
use crate::dataset::DatasetSource;
use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 prints diagnostics even for errors the caller handles, such as
/// probing for an optional attribute. Call once early at startup; later
/// calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// An open NetCDF file or OPeNDAP endpoint.
pub struct NetCdfDataset {
    location: String,
    file: Arc<netcdf::File>,
    dims: IndexMap<String, usize>,
    attrs: Attributes,
}

impl NetCdfDataset {
    /// Open a local path or a remote URL. Only metadata is read.
    pub fn open(location: &str) -> NetCdfResult<Self> {
        silence_hdf5_errors();

        let file = netcdf::open(Path::new(location)).map_err(|e| NetCdfError::Open {
            location: location.to_string(),
            message: e.to_string(),
        })?;

        let dims = file
            .dimensions()
            .map(|d| (d.name(), d.len()))
            .collect();
        let attrs = read_attributes(file.attributes());

        tracing::debug!(location = %location, dims = ?dims, "Opened NetCDF dataset");

        Ok(Self {
            location: location.to_string(),
            file: Arc::new(file),
            dims,
            attrs,
        })
    }

    fn coordinate(&self, dim: &str) -> NetCdfResult<Option<DataArray>> {
        let var = match self.file.variable(dim) {
            Some(var) => var,
            None => return Ok(None),
        };
        if var.dimensions().len() != 1 {
            return Ok(None);
        }
        let values: Vec<f64> = var.get_values(..)?;
        let attrs = read_attributes(var.attributes());
        Ok(Some(DataArray::coordinate(dim, values).with_attrs(attrs)))
    }
}

impl DatasetSource for NetCdfDataset {
    fn location(&self) -> &str {
        &self.location
    }

    fn dim_sizes(&self) -> IndexMap<String, usize> {
        self.dims.clone()
    }

    fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name()).collect()
    }

    fn variable(&self, name: &str) -> NetCdfResult<LazyArray> {
        let var = self
            .file
            .variable(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable {} in {}", name, self.location)))?;

        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
        let attrs = read_attributes(var.attributes());

        let mut coords = IndexMap::new();
        for dim in &dims {
            if let Some(coord) = self.coordinate(dim)? {
                coords.insert(dim.clone(), coord);
            }
        }

        let source = Arc::new(NetCdfVariableSource {
            file: Arc::clone(&self.file),
            name: name.to_string(),
            scale_factor: number_attr(&attrs, "scale_factor").unwrap_or(1.0),
            add_offset: number_attr(&attrs, "add_offset").unwrap_or(0.0),
            fill_value: number_attr(&attrs, "_FillValue"),
            missing_value: number_attr(&attrs, "missing_value"),
        });

        Ok(LazyArray::new(name, dims, shape, source)
            .with_attrs(attrs)
            .with_coords(coords))
    }
}

/// Reads hyperslabs of one variable, unpacking and masking as it goes.
struct NetCdfVariableSource {
    file: Arc<netcdf::File>,
    name: String,
    scale_factor: f64,
    add_offset: f64,
    fill_value: Option<f64>,
    missing_value: Option<f64>,
}

impl BlockSource for NetCdfVariableSource {
    fn read_block(&self, start: &[usize], count: &[usize]) -> NetCdfResult<Vec<f64>> {
        let var = self
            .file
            .variable(&self.name)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable {}", self.name)))?;

        let raw: Vec<f64> = var.get_values((start, count))?;

        Ok(raw
            .into_iter()
            .map(|v| {
                if Some(v) == self.fill_value || Some(v) == self.missing_value {
                    f64::NAN
                } else {
                    v * self.scale_factor + self.add_offset
                }
            })
            .collect())
    }
}

fn read_attributes<'a>(attributes: impl Iterator<Item = netcdf::Attribute<'a>>) -> Attributes {
    let mut attrs = Attributes::new();
    for attr in attributes {
        match attr.value() {
            Ok(value) => {
                if let Some(value) = AttrValue::from_netcdf(value) {
                    attrs.insert(attr.name().to_string(), value);
                }
            }
            Err(e) => {
                tracing::debug!(attribute = %attr.name(), error = %e, "Skipping unreadable attribute");
            }
        }
    }
    attrs
}
