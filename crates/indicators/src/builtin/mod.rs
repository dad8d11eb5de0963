//! Reference indicators.
//!
//! Each indicator is a compute function from keyword arguments to a
//! resampled array, wrapped with its metadata in a [`BuiltinIndicator`].

mod heat_wave;
mod precipitation;
mod temperature;

use netcdf_io::{AttrValue, DataArray, Dataset};
use serde_json::Value;

use crate::args::IndicatorArgs;
use crate::error::IndicatorResult;
use crate::metadata::{IndicatorMetadata, ParameterSpec};
use crate::resample::{Resampled, TimeSeries};
use crate::units::temperature_converter;
use crate::Indicator;

type ComputeFn = fn(&IndicatorArgs) -> IndicatorResult<Resampled>;

/// An indicator implemented in this crate.
pub struct BuiltinIndicator {
    metadata: IndicatorMetadata,
    compute: ComputeFn,
}

impl Indicator for BuiltinIndicator {
    fn metadata(&self) -> &IndicatorMetadata {
        &self.metadata
    }

    fn compute(&self, args: &IndicatorArgs) -> IndicatorResult<Dataset> {
        let resampled = (self.compute)(args)?;
        tracing::debug!(
            indicator = %self.metadata.identifier,
            periods = resampled.periods.len(),
            "Computed indicator"
        );
        Ok(output_dataset(&self.metadata, resampled))
    }
}

/// Every reference indicator, in catalog order.
pub(crate) fn all() -> Vec<BuiltinIndicator> {
    let mut indicators = temperature::indicators();
    indicators.extend(heat_wave::indicators());
    indicators.extend(precipitation::indicators());
    indicators
}

/// Fields shared by every reference indicator's metadata.
struct Definition<'a> {
    identifier: &'a str,
    long_name: &'a str,
    abstract_: &'a str,
    standard_name: &'a str,
    units: &'a str,
    cell_methods: &'a str,
    parameters: Vec<ParameterSpec>,
}

fn indicator(def: Definition<'_>, compute: ComputeFn) -> BuiltinIndicator {
    BuiltinIndicator {
        metadata: IndicatorMetadata {
            identifier: def.identifier.to_string(),
            long_name: def.long_name.to_string(),
            abstract_: def.abstract_.to_string(),
            standard_name: def.standard_name.to_string(),
            units: def.units.to_string(),
            cell_methods: def.cell_methods.to_string(),
            parameters: IndicatorMetadata::encode_parameters(&def.parameters),
        },
        compute,
    }
}

fn required(name: &str, desc: &str) -> ParameterSpec {
    ParameterSpec::new(name, None, desc)
}

fn with_default(name: &str, default: Value, desc: &str) -> ParameterSpec {
    ParameterSpec::new(name, Some(default), desc)
}

fn freq_param() -> ParameterSpec {
    with_default(
        "freq",
        Value::from("YS"),
        "Resampling frequency; Defaults to \"YS\" (yearly).",
    )
}

/// Load a temperature argument converted to kelvin.
fn load_kelvin(args: &IndicatorArgs, name: &str) -> IndicatorResult<TimeSeries> {
    let series = TimeSeries::load(args.array(name)?)?;
    let units = series.units().unwrap_or("K").to_string();
    let mut converted = series.map(temperature_converter(&units, "K")?);
    converted
        .array
        .attrs
        .insert("units".to_string(), AttrValue::from("K"));
    Ok(converted)
}

/// Length of each run of non-zero values in `flags`.
fn runs(flags: &[f64]) -> Vec<usize> {
    let mut runs = Vec::new();
    let mut current = 0;
    for &flag in flags {
        if flag != 0.0 {
            current += 1;
        } else if current > 0 {
            runs.push(current);
            current = 0;
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}

fn output_dataset(metadata: &IndicatorMetadata, resampled: Resampled) -> Dataset {
    let mut ds = Dataset::new();
    ds.add_coord(resampled.time);
    for coord in resampled.coords.into_values() {
        ds.add_coord(coord);
    }

    let DataArray {
        dims, shape, values, ..
    } = resampled.array;
    let mut var = DataArray {
        name: metadata.identifier.clone(),
        dims,
        shape,
        values,
        attrs: Default::default(),
    };
    let attrs = [
        ("standard_name", &metadata.standard_name),
        ("long_name", &metadata.long_name),
        ("units", &metadata.units),
        ("cell_methods", &metadata.cell_methods),
        ("description", &metadata.abstract_),
    ];
    for (name, value) in attrs {
        if !value.is_empty() {
            var.attrs
                .insert(name.to_string(), AttrValue::from(value.as_str()));
        }
    }
    ds.add_data_var(var);
    ds
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs() {
        assert_eq!(runs(&[1.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0]), vec![2, 1, 3]);
        assert!(runs(&[0.0, 0.0]).is_empty());
    }

    #[test]
    fn test_every_builtin_has_parseable_parameters() {
        for indicator in all() {
            let specs = indicator.metadata().parameter_specs().unwrap();
            assert!(!specs.is_empty(), "{}", indicator.metadata().identifier);
            assert!(specs.iter().any(|s| s.name == "freq"));
        }
    }
}
