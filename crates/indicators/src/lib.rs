//! Climate indicator library.
//!
//! Indicators are named computations over daily gridded time series. Each
//! publishes [`IndicatorMetadata`] describing its parameters and output, and
//! is called with keyword arguments ([`IndicatorArgs`]). The
//! [`IndicatorCatalog`] enumerates them in a fixed order.
//!
//! # Example
//!
//! ```
//! use indicators::{Indicator, IndicatorCatalog};
//!
//! let catalog = IndicatorCatalog::builtin();
//! let hwf = catalog.get("heat_wave_frequency").unwrap();
//! let params = hwf.metadata().parameter_specs().unwrap();
//! assert_eq!(params[0].name, "tasmin");
//! ```

pub mod args;
mod builtin;
pub mod catalog;
pub mod error;
pub mod metadata;
pub mod resample;
pub mod units;

pub use args::{ArgValue, IndicatorArgs};
pub use builtin::BuiltinIndicator;
pub use catalog::{IndicatorCatalog, CATALOG_VERSION};
pub use error::{IndicatorError, IndicatorResult};
pub use metadata::{IndicatorMetadata, ParameterSpec};
pub use resample::Frequency;
pub use units::Quantity;

use netcdf_io::Dataset;

/// A climate indicator.
pub trait Indicator: Send + Sync {
    fn metadata(&self) -> &IndicatorMetadata;

    /// Compute the indicator. The output dataset holds one data variable
    /// named after the identifier, plus its coordinates.
    fn compute(&self, args: &IndicatorArgs) -> IndicatorResult<Dataset>;
}
