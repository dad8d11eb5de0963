//! NetCDF dataset access for climate data.
//!
//! Variables are opened as [`LazyArray`]s that read nothing until loaded.
//! Loading can be split into blocks along chosen dimensions so that remote
//! OPeNDAP endpoints are queried with bounded requests.
//!
//! # Example
//!
//! ```no_run
//! use indexmap::IndexMap;
//! use netcdf_io::{DatasetSource, NetCdfDataset};
//!
//! let ds = NetCdfDataset::open("tasmax_day_BCCAQv2.nc")?;
//! let mut chunks = IndexMap::new();
//! chunks.insert("time".to_string(), 365);
//! let tasmax = ds.variable("tasmax")?.with_chunks(&chunks).load()?;
//! # Ok::<(), netcdf_io::NetCdfError>(())
//! ```

pub mod array;
pub mod attrs;
pub mod dataset;
pub mod error;
pub mod reader;
pub mod time;
pub mod writer;

pub use array::{BlockSource, DataArray, LazyArray, MemorySource};
pub use attrs::{number_attr, text_attr, AttrValue, Attributes};
pub use dataset::{Dataset, DatasetSource};
pub use error::{NetCdfError, NetCdfResult};
pub use reader::{silence_hdf5_errors, NetCdfDataset};
pub use time::{Calendar, CfDate, TimeUnits};
pub use writer::{write_dataset, FILL_VALUE};
