//! Materialized and lazily-read n-dimensional arrays.
//!
//! A [`LazyArray`] knows its shape and where its values live but reads
//! nothing until [`LazyArray::load`] is called. When chunk sizes are set
//! the values are read one block at a time, so a remote source is queried
//! with bounded requests.

use std::ops::Range;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::attrs::Attributes;
use crate::error::{NetCdfError, NetCdfResult};

/// An n-dimensional array of values held in memory, in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub values: Vec<f64>,
    pub attrs: Attributes,
}

impl DataArray {
    /// Create an array, checking that the values fill the shape exactly.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<String>,
        shape: Vec<usize>,
        values: Vec<f64>,
    ) -> NetCdfResult<Self> {
        let name = name.into();
        if dims.len() != shape.len() {
            return Err(NetCdfError::Shape(format!(
                "{}: {} dimensions but {} lengths",
                name,
                dims.len(),
                shape.len()
            )));
        }
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            return Err(NetCdfError::Shape(format!(
                "{}: shape {:?} needs {} values, got {}",
                name,
                shape,
                expected,
                values.len()
            )));
        }
        Ok(Self {
            name,
            dims,
            shape,
            values,
            attrs: Attributes::new(),
        })
    }

    /// A one-dimensional coordinate array named after its dimension.
    pub fn coordinate(name: impl Into<String>, values: Vec<f64>) -> Self {
        let name = name.into();
        Self {
            dims: vec![name.clone()],
            shape: vec![values.len()],
            name,
            values,
            attrs: Attributes::new(),
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn dim_index(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.dim_index(dim).map(|i| self.shape[i])
    }

    /// Copy out the index ranges given by dimension name. Dimensions not
    /// named are kept whole.
    pub fn select(&self, ranges: &IndexMap<String, Range<usize>>) -> NetCdfResult<DataArray> {
        let (start, count) = hyperslab(&self.dims, &self.shape, ranges);
        check_block(&self.shape, &start, &count)?;
        let mut values = vec![0.0; count.iter().product()];
        for_each_row(&self.shape, &start, &count, |full, local, len| {
            values[local..local + len].copy_from_slice(&self.values[full..full + len]);
        });
        let mut array = DataArray::new(&self.name, self.dims.clone(), count, values)?;
        array.attrs = self.attrs.clone();
        Ok(array)
    }
}

/// Anything that can serve a rectangular block of one variable.
pub trait BlockSource: Send + Sync {
    /// Read the block starting at `start` with extent `count`, row-major.
    fn read_block(&self, start: &[usize], count: &[usize]) -> NetCdfResult<Vec<f64>>;
}

/// Block source over values already in memory.
#[derive(Debug, Clone)]
pub struct MemorySource {
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl MemorySource {
    pub fn new(shape: Vec<usize>, values: Vec<f64>) -> Self {
        Self { shape, values }
    }
}

impl BlockSource for MemorySource {
    fn read_block(&self, start: &[usize], count: &[usize]) -> NetCdfResult<Vec<f64>> {
        check_block(&self.shape, start, count)?;
        let mut block = vec![0.0; count.iter().product()];
        for_each_row(&self.shape, start, count, |full, local, len| {
            block[local..local + len].copy_from_slice(&self.values[full..full + len]);
        });
        Ok(block)
    }
}

/// A variable whose values are read on demand.
#[derive(Clone)]
pub struct LazyArray {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub attrs: Attributes,

    /// Coordinate variables for the dimensions that have one.
    pub coords: IndexMap<String, DataArray>,

    chunks: Option<Vec<usize>>,
    source: Arc<dyn BlockSource>,
}

impl std::fmt::Debug for LazyArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyArray")
            .field("name", &self.name)
            .field("dims", &self.dims)
            .field("shape", &self.shape)
            .field("chunks", &self.chunks)
            .finish()
    }
}

impl LazyArray {
    pub fn new(
        name: impl Into<String>,
        dims: Vec<String>,
        shape: Vec<usize>,
        source: Arc<dyn BlockSource>,
    ) -> Self {
        Self {
            name: name.into(),
            dims,
            shape,
            attrs: Attributes::new(),
            coords: IndexMap::new(),
            chunks: None,
            source,
        }
    }

    /// Wrap an in-memory array.
    pub fn from_array(array: DataArray) -> Self {
        let source = Arc::new(MemorySource::new(array.shape.clone(), array.values));
        Self {
            name: array.name,
            dims: array.dims,
            shape: array.shape,
            attrs: array.attrs,
            coords: IndexMap::new(),
            chunks: None,
            source,
        }
    }

    pub fn with_attrs(mut self, attrs: Attributes) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_coords(mut self, coords: IndexMap<String, DataArray>) -> Self {
        self.coords = coords;
        self
    }

    /// Set block sizes by dimension name. Dimensions not named are read
    /// whole; sizes are clamped to `1..=len`.
    pub fn with_chunks(mut self, chunks: &IndexMap<String, usize>) -> Self {
        let sizes = self
            .dims
            .iter()
            .zip(&self.shape)
            .map(|(dim, &len)| {
                chunks
                    .get(dim)
                    .copied()
                    .unwrap_or(len)
                    .min(len)
                    .max(1)
            })
            .collect();
        self.chunks = Some(sizes);
        self
    }

    /// Block sizes, if chunked.
    pub fn chunks(&self) -> Option<&[usize]> {
        self.chunks.as_deref()
    }

    /// Number of blocks a load will read.
    pub fn block_count(&self) -> usize {
        match &self.chunks {
            Some(sizes) => self
                .shape
                .iter()
                .zip(sizes)
                .map(|(&len, &size)| len.div_ceil(size))
                .product(),
            None => 1,
        }
    }

    pub fn dim_sizes(&self) -> IndexMap<String, usize> {
        self.dims
            .iter()
            .cloned()
            .zip(self.shape.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the index ranges given by dimension name with a single request.
    /// Dimensions not named are read whole. Chunking is ignored.
    pub fn select(&self, ranges: &IndexMap<String, Range<usize>>) -> NetCdfResult<DataArray> {
        let (start, count) = hyperslab(&self.dims, &self.shape, ranges);
        check_block(&self.shape, &start, &count)?;
        let values = self.source.read_block(&start, &count)?;

        tracing::debug!(variable = %self.name, ?start, ?count, "Read selection");

        let mut array = DataArray::new(&self.name, self.dims.clone(), count, values)?;
        array.attrs = self.attrs.clone();
        Ok(array)
    }

    /// Read every value.
    pub fn load(&self) -> NetCdfResult<DataArray> {
        let total = self.len();
        let values = match &self.chunks {
            None => {
                let start = vec![0; self.shape.len()];
                self.source.read_block(&start, &self.shape)?
            }
            Some(sizes) => {
                let mut values = vec![0.0; total];
                for (start, count) in BlockIter::new(&self.shape, sizes) {
                    let block = self.source.read_block(&start, &count)?;
                    if block.len() != count.iter().product::<usize>() {
                        return Err(NetCdfError::Shape(format!(
                            "{}: block at {:?} returned {} values",
                            self.name,
                            start,
                            block.len()
                        )));
                    }
                    for_each_row(&self.shape, &start, &count, |full, local, len| {
                        values[full..full + len].copy_from_slice(&block[local..local + len]);
                    });
                }
                values
            }
        };

        tracing::debug!(
            variable = %self.name,
            values = total,
            blocks = self.block_count(),
            "Loaded variable"
        );

        let mut array = DataArray::new(&self.name, self.dims.clone(), self.shape.clone(), values)?;
        array.attrs = self.attrs.clone();
        Ok(array)
    }
}

/// Iterates over the `(start, count)` of every block of a chunked shape.
struct BlockIter {
    shape: Vec<usize>,
    sizes: Vec<usize>,
    next: Option<Vec<usize>>,
}

impl BlockIter {
    fn new(shape: &[usize], sizes: &[usize]) -> Self {
        let empty = shape.iter().any(|&len| len == 0);
        Self {
            shape: shape.to_vec(),
            sizes: sizes.to_vec(),
            next: if empty { None } else { Some(vec![0; shape.len()]) },
        }
    }
}

impl Iterator for BlockIter {
    type Item = (Vec<usize>, Vec<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next.take()?;
        let count: Vec<usize> = start
            .iter()
            .zip(&self.shape)
            .zip(&self.sizes)
            .map(|((&s, &len), &size)| size.min(len - s))
            .collect();

        let mut following = start.clone();
        let mut dim = following.len();
        while dim > 0 {
            dim -= 1;
            following[dim] += self.sizes[dim];
            if following[dim] < self.shape[dim] {
                self.next = Some(following);
                break;
            }
            following[dim] = 0;
        }

        Some((start, count))
    }
}

fn check_block(shape: &[usize], start: &[usize], count: &[usize]) -> NetCdfResult<()> {
    let fits = start.len() == shape.len()
        && count.len() == shape.len()
        && shape
            .iter()
            .zip(start.iter().zip(count))
            .all(|(&len, (&s, &c))| s + c <= len);
    if fits {
        Ok(())
    } else {
        Err(NetCdfError::Shape(format!(
            "block {:?}+{:?} outside shape {:?}",
            start, count, shape
        )))
    }
}

/// Start and count of the block selected by `ranges`.
fn hyperslab(
    dims: &[String],
    shape: &[usize],
    ranges: &IndexMap<String, Range<usize>>,
) -> (Vec<usize>, Vec<usize>) {
    dims.iter()
        .zip(shape)
        .map(|(dim, &len)| match ranges.get(dim) {
            Some(range) => (range.start, range.end.saturating_sub(range.start)),
            None => (0, len),
        })
        .unzip()
}

fn strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

/// Call `f(full_offset, block_offset, row_len)` for every contiguous row of
/// the block `start..start+count` inside an array of `full_shape`.
fn for_each_row(
    full_shape: &[usize],
    start: &[usize],
    count: &[usize],
    mut f: impl FnMut(usize, usize, usize),
) {
    if count.iter().any(|&c| c == 0) {
        return;
    }
    let ndim = count.len();
    if ndim == 0 {
        f(0, 0, 1);
        return;
    }

    let full_strides = strides(full_shape);
    let row = count[ndim - 1];
    let mut index = vec![0usize; ndim - 1];
    let mut block_offset = 0;

    loop {
        let full_offset: usize = (0..ndim)
            .map(|d| {
                let i = if d < ndim - 1 { index[d] } else { 0 };
                (start[d] + i) * full_strides[d]
            })
            .sum();
        f(full_offset, block_offset, row);
        block_offset += row;

        let mut d = ndim - 1;
        loop {
            if d == 0 {
                return;
            }
            d -= 1;
            index[d] += 1;
            if index[d] < count[d] {
                break;
            }
            index[d] = 0;
        }
    }
}
