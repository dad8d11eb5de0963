//! Synthetic CMIP5-style datasets.
//!
//! Each fixture holds one daily variable on a small regular grid with the
//! global attributes a downscaled CMIP5 file carries. Fixtures are built in
//! memory or written to disk as NetCDF.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use netcdf_io::{write_dataset, AttrValue, Attributes, DataArray, Dataset};
use tempfile::TempDir;

use crate::generators::{precipitation_series, temperature_series};

/// Default number of daily steps.
pub const FIXTURE_DAYS: usize = 365;

pub const FIXTURE_LAT: usize = 6;

pub const FIXTURE_LON: usize = 5;

/// Time units of every fixture.
pub const FIXTURE_TIME_UNITS: &str = "days since 2000-01-01 00:00:00";

/// Values of the `driving_*` global attributes.
pub const DRIVING_MODEL: &str = "dummy-model";
pub const DRIVING_EXPERIMENT: &str = "historical,rcp85";

/// The variables written by [`netcdf_datasets`].
pub const FIXTURE_VARIABLES: [&str; 4] = ["tas", "tasmax", "tasmin", "pr"];

/// Global attributes of a downscaled CMIP5 file.
pub fn cmip5_attributes() -> Attributes {
    let mut attrs = Attributes::new();
    for (name, value) in [
        ("Conventions", "CF-1.4"),
        ("frequency", "day"),
        ("modeling_realm", "atmos"),
        ("project_id", "CMIP5"),
        ("driving_experiment", DRIVING_EXPERIMENT),
        ("driving_experiment_id", DRIVING_EXPERIMENT),
        ("driving_model_id", DRIVING_MODEL),
        ("driving_realization", "1"),
        ("driving_initialization_method", "1"),
        ("driving_physics_version", "1"),
    ] {
        attrs.insert(name.to_string(), AttrValue::from(value));
    }
    attrs
}

/// Builder for a single-variable synthetic dataset.
#[derive(Debug, Clone)]
pub struct Fixture {
    variable: String,
    days: usize,
    lat: usize,
    lon: usize,
    seed: u64,
    calendar: String,
    missing: bool,
}

impl Fixture {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            days: FIXTURE_DAYS,
            lat: FIXTURE_LAT,
            lon: FIXTURE_LON,
            seed: 0,
            calendar: "standard".to_string(),
            missing: false,
        }
    }

    pub fn days(mut self, days: usize) -> Self {
        self.days = days;
        self
    }

    pub fn grid(mut self, lat: usize, lon: usize) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn calendar(mut self, calendar: impl Into<String>) -> Self {
        self.calendar = calendar.into();
        self
    }

    /// Put a NaN on January 15th in every cell.
    pub fn with_missing(mut self) -> Self {
        self.missing = true;
        self
    }

    /// Build the dataset in memory.
    pub fn dataset(&self) -> Dataset {
        let cells = self.lat * self.lon;
        let (units, cell_methods, standard_name, mut values) = match self.variable.as_str() {
            "tasmax" => (
                "K",
                "time: maximum within days",
                "air_temperature",
                temperature_series(self.days, cells, 6.0, self.seed),
            ),
            "tasmin" => (
                "K",
                "time: minimum within days",
                "air_temperature",
                temperature_series(self.days, cells, -6.0, self.seed),
            ),
            "pr" | "prsn" => (
                "kg m-2 s-1",
                "time: mean",
                "precipitation_flux",
                precipitation_series(self.days, cells, self.seed),
            ),
            _ => (
                "K",
                "time: mean within days",
                "air_temperature",
                temperature_series(self.days, cells, 0.0, self.seed),
            ),
        };

        if self.missing && self.days > 14 {
            values[14 * cells..15 * cells].fill(f64::NAN);
        }

        let mut ds = Dataset::new();
        ds.attrs = cmip5_attributes();

        let time = DataArray::coordinate("time", (0..self.days).map(|d| d as f64).collect())
            .with_attrs(attrs(&[
                ("units", FIXTURE_TIME_UNITS),
                ("calendar", self.calendar.as_str()),
                ("standard_name", "time"),
            ]));
        let lat = DataArray::coordinate("lat", (0..self.lat).map(|i| 45.0 + i as f64).collect())
            .with_attrs(attrs(&[("units", "degrees_north"), ("standard_name", "latitude")]));
        let lon = DataArray::coordinate("lon", (0..self.lon).map(|i| -75.0 + i as f64).collect())
            .with_attrs(attrs(&[("units", "degrees_east"), ("standard_name", "longitude")]));
        ds.add_coord(time);
        ds.add_coord(lat);
        ds.add_coord(lon);

        let var = DataArray::new(
            self.variable.clone(),
            vec!["time".to_string(), "lat".to_string(), "lon".to_string()],
            vec![self.days, self.lat, self.lon],
            values,
        )
        .expect("fixture shape is consistent")
        .with_attrs(attrs(&[
            ("units", units),
            ("cell_methods", cell_methods),
            ("standard_name", standard_name),
        ]));
        ds.add_data_var(var);
        ds
    }

    /// Write the dataset to `path` and return it.
    pub fn write_to(&self, path: &Path) -> PathBuf {
        write_dataset(&self.dataset(), path).expect("failed to write fixture");
        path.to_path_buf()
    }

    /// Write the dataset as `<dir>/<variable>.nc`.
    pub fn write_in(&self, dir: &Path) -> PathBuf {
        self.write_to(&dir.join(format!("{}.nc", self.variable)))
    }
}

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), AttrValue::from(*v)))
        .collect()
}

/// Write one fixture per variable in [`FIXTURE_VARIABLES`] to a fresh
/// temporary directory.
///
/// The directory is deleted when the returned [`TempDir`] is dropped.
pub fn netcdf_datasets() -> (TempDir, IndexMap<String, PathBuf>) {
    let dir = TempDir::new().expect("failed to create temp dir");
    let paths = FIXTURE_VARIABLES
        .iter()
        .enumerate()
        .map(|(seed, name)| {
            let path = Fixture::new(*name).seed(seed as u64).write_in(dir.path());
            (name.to_string(), path)
        })
        .collect();
    (dir, paths)
}
