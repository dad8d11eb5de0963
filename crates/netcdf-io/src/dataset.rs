//! Datasets: named variables sharing dimensions and global attributes.

use indexmap::IndexMap;

use crate::array::{DataArray, LazyArray};
use crate::attrs::Attributes;
use crate::error::{NetCdfError, NetCdfResult};

/// A dataset whose variables can be opened lazily.
pub trait DatasetSource {
    /// Path or URL the dataset was opened from.
    fn location(&self) -> &str;

    /// Dimension lengths in declaration order.
    fn dim_sizes(&self) -> IndexMap<String, usize>;

    /// Global attributes.
    fn attrs(&self) -> &Attributes;

    fn variable_names(&self) -> Vec<String>;

    /// Open a variable without reading its values.
    fn variable(&self, name: &str) -> NetCdfResult<LazyArray>;
}

/// A dataset held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub attrs: Attributes,

    /// Coordinate variables keyed by dimension name.
    pub coords: IndexMap<String, DataArray>,

    pub data_vars: IndexMap<String, DataArray>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_coord(&mut self, coord: DataArray) {
        self.coords.insert(coord.name.clone(), coord);
    }

    pub fn add_data_var(&mut self, var: DataArray) {
        self.data_vars.insert(var.name.clone(), var);
    }

    /// Dimension lengths in order of first use, coordinates first.
    ///
    /// Fails if two variables disagree on the length of a dimension.
    pub fn checked_dim_sizes(&self) -> NetCdfResult<IndexMap<String, usize>> {
        let mut dims: IndexMap<String, usize> = IndexMap::new();
        for var in self.coords.values().chain(self.data_vars.values()) {
            for (dim, &len) in var.dims.iter().zip(&var.shape) {
                match dims.get(dim) {
                    Some(&known) if known != len => {
                        return Err(NetCdfError::Shape(format!(
                            "dimension {} has length {} in {} but {} elsewhere",
                            dim, len, var.name, known
                        )))
                    }
                    Some(_) => {}
                    None => {
                        dims.insert(dim.clone(), len);
                    }
                }
            }
        }
        Ok(dims)
    }

    fn array(&self, name: &str) -> Option<&DataArray> {
        self.data_vars.get(name).or_else(|| self.coords.get(name))
    }
}

impl DatasetSource for Dataset {
    fn location(&self) -> &str {
        "<memory>"
    }

    fn dim_sizes(&self) -> IndexMap<String, usize> {
        let mut dims = IndexMap::new();
        for var in self.coords.values().chain(self.data_vars.values()) {
            for (dim, &len) in var.dims.iter().zip(&var.shape) {
                dims.entry(dim.clone()).or_insert(len);
            }
        }
        dims
    }

    fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    fn variable_names(&self) -> Vec<String> {
        self.coords
            .keys()
            .chain(self.data_vars.keys())
            .cloned()
            .collect()
    }

    fn variable(&self, name: &str) -> NetCdfResult<LazyArray> {
        let array = self
            .array(name)
            .ok_or_else(|| NetCdfError::MissingData(format!("variable {}", name)))?;

        let coords = array
            .dims
            .iter()
            .filter_map(|dim| self.coords.get(dim).map(|c| (dim.clone(), c.clone())))
            .collect();

        Ok(LazyArray::from_array(array.clone()).with_coords(coords))
    }
}
