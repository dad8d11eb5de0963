//! Temperature statistics.

use serde_json::Value;

use super::{freq_param, indicator, load_kelvin, required, with_default, BuiltinIndicator, Definition};
use crate::args::IndicatorArgs;
use crate::error::IndicatorResult;
use crate::resample::Resampled;

const TX_DAYS_ABOVE_THRESH: &str = "25.0 degC";

pub(super) fn indicators() -> Vec<BuiltinIndicator> {
    vec![
        indicator(
            Definition {
                identifier: "tg_mean",
                long_name: "Mean daily mean temperature",
                abstract_: "Mean of daily mean temperature.",
                standard_name: "air_temperature",
                units: "K",
                cell_methods: "time: mean within days time: mean over days",
                parameters: vec![required("tas", "Mean daily temperature [K]."), freq_param()],
            },
            tg_mean,
        ),
        indicator(
            Definition {
                identifier: "tx_max",
                long_name: "Maximum daily maximum temperature",
                abstract_: "Maximum of daily maximum temperature.",
                standard_name: "air_temperature",
                units: "K",
                cell_methods: "time: maximum within days time: maximum over days",
                parameters: vec![
                    required("tasmax", "Maximum daily temperature [K]."),
                    freq_param(),
                ],
            },
            tx_max,
        ),
        indicator(
            Definition {
                identifier: "tn_min",
                long_name: "Minimum daily minimum temperature",
                abstract_: "Minimum of daily minimum temperature.",
                standard_name: "air_temperature",
                units: "K",
                cell_methods: "time: minimum within days time: minimum over days",
                parameters: vec![
                    required("tasmin", "Minimum daily temperature [K]."),
                    freq_param(),
                ],
            },
            tn_min,
        ),
        indicator(
            Definition {
                identifier: "dtr",
                long_name: "Mean Diurnal Temperature Range",
                abstract_: "The average difference between the daily maximum and minimum temperatures.",
                standard_name: "air_temperature",
                units: "K",
                cell_methods: "time range within days time: mean over days",
                parameters: vec![
                    required("tasmax", "Maximum daily temperature [K]."),
                    required("tasmin", "Minimum daily temperature [K]."),
                    freq_param(),
                ],
            },
            dtr,
        ),
        indicator(
            Definition {
                identifier: "frost_days",
                long_name: "Number of frost days (Tmin < 0°C)",
                abstract_: "Number of days where daily minimum temperatures are below 0°C.",
                standard_name: "days_with_air_temperature_below_threshold",
                units: "days",
                cell_methods: "time: minimum within days time: sum over days",
                parameters: vec![
                    required("tasmin", "Minimum daily temperature [K]."),
                    freq_param(),
                ],
            },
            frost_days,
        ),
        indicator(
            Definition {
                identifier: "tx_days_above",
                long_name: "Number of summer days (Tmax > threshold)",
                abstract_: "Number of days where daily maximum temperature exceed a threshold.",
                standard_name: "number_of_days_with_air_temperature_above_threshold",
                units: "days",
                cell_methods: "time: maximum within days time: sum over days",
                parameters: vec![
                    required("tasmax", "Maximum daily temperature [K]."),
                    with_default(
                        "thresh",
                        Value::from(TX_DAYS_ABOVE_THRESH),
                        "Threshold temperature on which to base evaluation.",
                    ),
                    freq_param(),
                ],
            },
            tx_days_above,
        ),
    ]
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn tg_mean(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    load_kelvin(args, "tas")?.resample(args.frequency()?, mean)
}

fn tx_max(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    load_kelvin(args, "tasmax")?.resample(args.frequency()?, |s| {
        s.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

fn tn_min(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    load_kelvin(args, "tasmin")?.resample(args.frequency()?, |s| {
        s.iter().copied().fold(f64::INFINITY, f64::min)
    })
}

fn dtr(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    let tasmax = load_kelvin(args, "tasmax")?;
    let tasmin = load_kelvin(args, "tasmin")?;
    tasmax
        .zip_with(&tasmin, |max, min| max - min)?
        .resample(args.frequency()?, mean)
}

fn frost_days(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    let freezing = 273.15;
    load_kelvin(args, "tasmin")?.resample(args.frequency()?, |s| {
        s.iter().filter(|&&v| v < freezing).count() as f64
    })
}

fn tx_days_above(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    let thresh = args
        .quantity("thresh", TX_DAYS_ABOVE_THRESH)?
        .temperature_in("K")?;
    load_kelvin(args, "tasmax")?.resample(args.frequency()?, |s| {
        s.iter().filter(|&&v| v > thresh).count() as f64
    })
}

#[cfg(test)]
mod tests {
    use super::super::testing::daily;
    use crate::args::{ArgValue, IndicatorArgs};
    use crate::catalog::IndicatorCatalog;
    use crate::Indicator;
    use crate::error::IndicatorError;

    fn compute(id: &str, args: &IndicatorArgs) -> Result<netcdf_io::Dataset, IndicatorError> {
        IndicatorCatalog::builtin().get(id).unwrap().compute(args)
    }

    #[test]
    fn test_tg_mean_converts_celsius() {
        let args = IndicatorArgs::new().with("tas", ArgValue::Array(daily("tas", "degC", |_, c| c as f64)));
        let out = compute("tg_mean", &args).unwrap();
        let var = &out.data_vars["tg_mean"];

        assert_eq!(var.shape, vec![1, 2]);
        assert!((var.values[0] - 273.15).abs() < 1e-9);
        assert!((var.values[1] - 274.15).abs() < 1e-9);
        assert_eq!(netcdf_io::text_attr(&var.attrs, "units"), Some("K"));
    }

    #[test]
    fn test_dtr_monthly() {
        let args = IndicatorArgs::new()
            .with("tasmax", ArgValue::Array(daily("tasmax", "K", |d, _| 290.0 + (d % 2) as f64)))
            .with("tasmin", ArgValue::Array(daily("tasmin", "K", |_, _| 280.0)))
            .with("freq", ArgValue::Text("MS".to_string()));
        let out = compute("dtr", &args).unwrap();
        let var = &out.data_vars["dtr"];

        assert_eq!(var.shape, vec![12, 2]);
        // January: 16 even days (10 K) and 15 odd days (11 K)
        assert!((var.values[0] - (16.0 * 10.0 + 15.0 * 11.0) / 31.0).abs() < 1e-9);
        assert_eq!(out.coords["time"].len(), 12);
    }

    #[test]
    fn test_dtr_unequal_time_axes() {
        let short = {
            let full = daily("tasmin", "K", |_, _| 280.0);
            let mut loaded = full.load().unwrap();
            loaded.values.truncate(300 * 2);
            loaded.shape[0] = 300;
            let mut coords = full.coords.clone();
            let time = coords.get_mut("time").unwrap();
            time.values.truncate(300);
            time.shape[0] = 300;
            netcdf_io::LazyArray::from_array(loaded).with_coords(coords)
        };
        let args = IndicatorArgs::new()
            .with("tasmax", ArgValue::Array(daily("tasmax", "K", |_, _| 290.0)))
            .with("tasmin", ArgValue::Array(short));

        let err = compute("dtr", &args).unwrap_err();
        assert!(matches!(err, IndicatorError::Mismatch(_)));
        assert!(err.to_string().contains("must be equal"));
    }

    #[test]
    fn test_frost_days_and_threshold_counts() {
        // Below freezing for the first 40 days in the first cell only.
        let tasmin = daily("tasmin", "K", |d, c| if c == 0 && d < 40 { 270.0 } else { 280.0 });
        let args = IndicatorArgs::new().with("tasmin", ArgValue::Array(tasmin));
        let out = compute("frost_days", &args).unwrap();
        assert_eq!(out.data_vars["frost_days"].values, vec![40.0, 0.0]);

        let tasmax = daily("tasmax", "degC", |d, _| if d < 100 { 30.0 } else { 20.0 });
        let args = IndicatorArgs::new()
            .with("tasmax", ArgValue::Array(tasmax))
            .with("thresh", ArgValue::Text("25 degC".to_string()));
        let out = compute("tx_days_above", &args).unwrap();
        assert_eq!(out.data_vars["tx_days_above"].values, vec![100.0, 100.0]);
    }

    #[test]
    fn test_missing_argument() {
        let err = compute("tx_max", &IndicatorArgs::new()).unwrap_err();
        assert!(matches!(err, IndicatorError::MissingArgument(name) if name == "tasmax"));
    }
}
