//! Nearest grid point extraction.
//!
//! `subset_gridpoint` is the one process not synthesized from an indicator.
//! Every variable of an input dataset is cut down to the grid cell nearest
//! to the requested point, optionally keeping only a range of years. The
//! selection is read with one request per variable, so remote datasets are
//! never read whole.

use std::ops::Range;

use indexmap::IndexMap;
use indicators::ArgValue;
use netcdf_io::{CfDate, DataArray, Dataset, DatasetSource, TimeUnits};
use tracing::debug;
use wps_protocol::{InputDescription, LiteralDataType, ProcessDescription};

use crate::descriptors::file_input;
use crate::error::{BridgeError, Result};

/// Identifier of the grid point process.
pub const SUBSET_GRIDPOINT: &str = "subset_gridpoint";

const LAT_NAMES: [&str; 2] = ["lat", "latitude"];
const LON_NAMES: [&str; 2] = ["lon", "longitude"];

/// Description of the grid point process, outputs excluded.
pub fn subset_description(version: &str) -> ProcessDescription {
    let mut description = ProcessDescription::new(
        SUBSET_GRIDPOINT,
        "Subset of a gridded dataset at a point",
        version,
    )
    .with_description(
        "Return the data for which the grid cell is nearest to the given coordinates \
         for every input dataset.",
    );

    description.add_input("resource", file_input());
    description.add_input(
        "lat",
        InputDescription::literal("Latitude", LiteralDataType::Float)
            .with_description("Latitude coordinate, in decimal degrees north"),
    );
    description.add_input(
        "lon",
        InputDescription::literal("Longitude", LiteralDataType::Float)
            .with_description("Longitude coordinate, in decimal degrees east"),
    );
    description.add_input(
        "start",
        InputDescription::literal("Start year", LiteralDataType::Integer)
            .with_description("First year of the subset. Defaults to the first year of the data.")
            .optional(),
    );
    description.add_input(
        "end",
        InputDescription::literal("End year", LiteralDataType::Integer)
            .with_description("Last year of the subset. Defaults to the last year of the data.")
            .optional(),
    );
    description
}

/// Where and when to cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub lat: f64,
    pub lon: f64,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

impl GridPoint {
    /// Read the point from bound literal inputs.
    pub fn from_literals(literals: &IndexMap<String, ArgValue>) -> Result<Self> {
        let lat = coordinate(literals, "lat")?;
        let lon = coordinate(literals, "lon")?;
        if !(-90.0..=90.0).contains(&lat) {
            return Err(BridgeError::invalid_input("lat", format!("{} is not a latitude", lat)));
        }

        let start_year = year(literals, "start")?;
        let end_year = year(literals, "end")?;
        if let (Some(start), Some(end)) = (start_year, end_year) {
            if start > end {
                return Err(BridgeError::invalid_input(
                    "end",
                    format!("end year {} is before start year {}", end, start),
                ));
            }
        }

        Ok(Self {
            lat,
            lon,
            start_year,
            end_year,
        })
    }

    /// Cut every variable of `source` down to this point.
    ///
    /// Variables without dimensions are left out.
    pub fn extract(&self, source: &dyn DatasetSource) -> Result<Dataset> {
        let names = source.variable_names();
        let lat = load_coordinate(source, &names, &LAT_NAMES)?;
        let lon = load_coordinate(source, &names, &LON_NAMES)?;

        let mut ranges: IndexMap<String, Range<usize>> = IndexMap::new();
        let i = nearest(&lat.values, self.lat, false)
            .ok_or_else(|| BridgeError::Computation("latitude coordinate has no values".into()))?;
        let j = nearest(&lon.values, self.lon, true)
            .ok_or_else(|| BridgeError::Computation("longitude coordinate has no values".into()))?;
        ranges.insert(lat.dims[0].clone(), i..i + 1);
        ranges.insert(lon.dims[0].clone(), j..j + 1);

        if self.start_year.is_some() || self.end_year.is_some() {
            let time = source
                .variable("time")
                .and_then(|t| t.load())
                .map_err(|e| BridgeError::resolution(source.location(), e))?;
            let dates = TimeUnits::from_attrs(&time.attrs)
                .and_then(|units| units.decode_all(&time.values))
                .map_err(|e| BridgeError::resolution(source.location(), e))?;
            let range = year_range(&dates, self.start_year, self.end_year).ok_or_else(|| {
                BridgeError::Computation(format!(
                    "No time steps between years {} and {}",
                    self.start_year.map_or("start".to_string(), |y| y.to_string()),
                    self.end_year.map_or("end".to_string(), |y| y.to_string()),
                ))
            })?;
            ranges.insert("time".to_string(), range);
        }

        debug!(
            location = %source.location(),
            lat = lat.values[i],
            lon = lon.values[j],
            ?ranges,
            "Selected grid point"
        );

        let dims = source.dim_sizes();
        let mut output = Dataset::new();
        output.attrs = source.attrs().clone();
        for name in &names {
            let lazy = source
                .variable(name)
                .map_err(|e| BridgeError::resolution(source.location(), e))?;
            if lazy.dims.is_empty() {
                debug!(variable = %name, "Skipping scalar variable");
                continue;
            }
            let selected = lazy
                .select(&ranges)
                .map_err(|e| BridgeError::resolution(source.location(), e))?;
            if lazy.dims.len() == 1 && dims.contains_key(name) && lazy.dims[0] == *name {
                output.add_coord(selected);
            } else {
                output.add_data_var(selected);
            }
        }
        Ok(output)
    }
}

fn coordinate(literals: &IndexMap<String, ArgValue>, name: &str) -> Result<f64> {
    match literals.get(name) {
        Some(ArgValue::Float(v)) if v.is_finite() => Ok(*v),
        Some(ArgValue::Integer(v)) => Ok(*v as f64),
        Some(_) => Err(BridgeError::invalid_input(name, "expected a number of degrees")),
        None => Err(BridgeError::invalid_input(name, "missing required input")),
    }
}

fn year(literals: &IndexMap<String, ArgValue>, name: &str) -> Result<Option<i32>> {
    match literals.get(name) {
        None => Ok(None),
        Some(ArgValue::Integer(v)) => i32::try_from(*v)
            .map(Some)
            .map_err(|_| BridgeError::invalid_input(name, format!("{} is not a year", v))),
        Some(_) => Err(BridgeError::invalid_input(name, "expected a year")),
    }
}

/// Load the first one-dimensional variable named like a coordinate.
fn load_coordinate(
    source: &dyn DatasetSource,
    names: &[String],
    candidates: &[&str],
) -> Result<DataArray> {
    let name = candidates
        .iter()
        .find(|c| names.iter().any(|n| n == *c))
        .ok_or_else(|| {
            BridgeError::Computation(format!(
                "Dataset {} has no {} coordinate",
                source.location(),
                candidates[0]
            ))
        })?;
    let array = source
        .variable(name)
        .and_then(|v| v.load())
        .map_err(|e| BridgeError::resolution(source.location(), e))?;
    if array.dims.len() != 1 {
        return Err(BridgeError::Computation(format!(
            "Coordinate {} must be one-dimensional, has dimensions {:?}",
            name, array.dims
        )));
    }
    Ok(array)
}

/// Index of the value closest to `target`, NaNs ignored. Periodic values
/// are compared modulo 360 so that -75 finds 285.
fn nearest(values: &[f64], target: f64, periodic: bool) -> Option<usize> {
    let distance = |v: f64| {
        let d = (v - target).abs();
        if periodic {
            let d = d % 360.0;
            d.min(360.0 - d)
        } else {
            d
        }
    };
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .min_by(|(_, a), (_, b)| distance(**a).total_cmp(&distance(**b)))
        .map(|(i, _)| i)
}

/// Indices of the time steps inside the year range. Times are assumed
/// increasing.
fn year_range(dates: &[CfDate], start: Option<i32>, end: Option<i32>) -> Option<Range<usize>> {
    let inside = |d: &CfDate| {
        start.map_or(true, |s| d.year >= s) && end.map_or(true, |e| d.year <= e)
    };
    let first = dates.iter().position(inside)?;
    let last = dates.iter().rposition(inside)?;
    Some(first..last + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_io::text_attr;
    use test_utils::{Fixture, DRIVING_MODEL};

    fn literals(pairs: &[(&str, ArgValue)]) -> IndexMap<String, ArgValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn point(lat: f64, lon: f64) -> GridPoint {
        GridPoint {
            lat,
            lon,
            start_year: None,
            end_year: None,
        }
    }

    #[test]
    fn test_nearest() {
        let lats = [45.0, 46.0, 47.0, f64::NAN];
        assert_eq!(nearest(&lats, 46.4, false), Some(1));
        assert_eq!(nearest(&lats, 90.0, false), Some(2));
        assert_eq!(nearest(&[], 0.0, false), None);

        let lons = [0.0, 90.0, 180.0, 270.0, 355.0];
        assert_eq!(nearest(&lons, -80.0, true), Some(3));
        assert_eq!(nearest(&lons, -3.0, true), Some(4));
    }

    #[test]
    fn test_year_range() {
        let dates: Vec<CfDate> = [1999, 2000, 2000, 2001, 2002]
            .iter()
            .map(|&y| CfDate::new(y, 6, 1))
            .collect();
        assert_eq!(year_range(&dates, Some(2000), Some(2001)), Some(1..4));
        assert_eq!(year_range(&dates, None, Some(1999)), Some(0..1));
        assert_eq!(year_range(&dates, Some(2002), None), Some(4..5));
        assert_eq!(year_range(&dates, Some(2010), None), None);
    }

    #[test]
    fn test_point_from_literals() {
        let point = GridPoint::from_literals(&literals(&[
            ("lat", ArgValue::Float(46.0)),
            ("lon", ArgValue::Integer(-73)),
            ("start", ArgValue::Integer(2000)),
        ]))
        .unwrap();
        assert_eq!(point.lon, -73.0);
        assert_eq!(point.start_year, Some(2000));
        assert_eq!(point.end_year, None);

        let err = GridPoint::from_literals(&literals(&[
            ("lat", ArgValue::Float(46.0)),
            ("lon", ArgValue::Text("25 degC".into())),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), "invalid_input");

        let err = GridPoint::from_literals(&literals(&[
            ("lat", ArgValue::Float(120.0)),
            ("lon", ArgValue::Float(0.0)),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("not a latitude"));

        let err = GridPoint::from_literals(&literals(&[
            ("lat", ArgValue::Float(46.0)),
            ("lon", ArgValue::Float(0.0)),
            ("start", ArgValue::Integer(2005)),
            ("end", ArgValue::Integer(2001)),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("before start year"));
    }

    #[test]
    fn test_extract_keeps_one_cell() {
        let source = Fixture::new("tas").days(10).dataset();
        let full = &source.data_vars["tas"];

        let subset = point(46.8, -73.2).extract(&source).unwrap();

        assert_eq!(subset.coords["lat"].values, vec![47.0]);
        assert_eq!(subset.coords["lon"].values, vec![-73.0]);
        assert_eq!(subset.coords["time"].values.len(), 10);
        assert_eq!(
            text_attr(&subset.coords["time"].attrs, "units"),
            Some(test_utils::FIXTURE_TIME_UNITS)
        );

        let tas = &subset.data_vars["tas"];
        assert_eq!(tas.shape, vec![10, 1, 1]);
        let cells = test_utils::FIXTURE_LAT * test_utils::FIXTURE_LON;
        let expected: Vec<f64> = (0..10).map(|t| full.values[t * cells + 2 * 5 + 2]).collect();
        assert_eq!(tas.values, expected);
        assert_eq!(text_attr(&subset.attrs, "driving_model_id"), Some(DRIVING_MODEL));
        assert!(subset.checked_dim_sizes().is_ok());
    }

    #[test]
    fn test_extract_year_range() {
        let source = Fixture::new("tas").days(800).dataset();
        let mut request = point(45.0, -75.0);
        request.start_year = Some(2001);

        let subset = request.extract(&source).unwrap();
        // 2000 is a leap year
        assert_eq!(subset.coords["time"].values.first(), Some(&366.0));
        assert_eq!(subset.data_vars["tas"].shape, vec![800 - 366, 1, 1]);

        request.start_year = Some(2030);
        let err = request.extract(&source).unwrap_err();
        assert_eq!(err.kind(), "computation");
        assert!(err.to_string().contains("No time steps"));
    }

    #[test]
    fn test_extract_needs_coordinates() {
        let mut source = Fixture::new("tas").days(3).dataset();
        source.coords.shift_remove("lon");

        let err = point(45.0, -75.0).extract(&source).unwrap_err();
        assert!(err.to_string().contains("no lon coordinate"));
    }
}
