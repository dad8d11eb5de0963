//! Heat wave indices based on runs of hot days.

use serde_json::Value;

use super::{
    freq_param, indicator, load_kelvin, required, runs, with_default, BuiltinIndicator, Definition,
};
use crate::args::IndicatorArgs;
use crate::error::IndicatorResult;
use crate::resample::Resampled;

const HWF_THRESH_TASMIN: &str = "22.0 degC";
const HWF_THRESH_TASMAX: &str = "30 degC";
const HWF_WINDOW: usize = 3;

const HWI_THRESH: &str = "25.0 degC";
const HWI_WINDOW: usize = 5;

pub(super) fn indicators() -> Vec<BuiltinIndicator> {
    vec![
        indicator(
            Definition {
                identifier: "heat_wave_frequency",
                long_name: "Number of heat wave events (Tmin > thresh_tasmin and Tmax > thresh_tasmax for >= window days)",
                abstract_: "Number of heat waves over a given period. A heat wave is defined as an event where the minimum and maximum daily temperature both exceeds specific thresholds over a minimum number of days.",
                standard_name: "heat_wave_events",
                units: "",
                cell_methods: "",
                parameters: vec![
                    required("tasmin", "Minimum daily temperature [℃] or [K]"),
                    required("tasmax", "Maximum daily temperature [℃] or [K]"),
                    with_default(
                        "thresh_tasmin",
                        Value::from(HWF_THRESH_TASMIN),
                        "The minimum temperature threshold needed to trigger a heatwave event.",
                    ),
                    with_default(
                        "thresh_tasmax",
                        Value::from(HWF_THRESH_TASMAX),
                        "The maximum temperature threshold needed to trigger a heatwave event.",
                    ),
                    with_default(
                        "window",
                        Value::from(HWF_WINDOW),
                        "Minimum number of days with temperatures above thresholds to qualify as a heatwave.",
                    ),
                    freq_param(),
                ],
            },
            heat_wave_frequency,
        ),
        indicator(
            Definition {
                identifier: "heat_wave_index",
                long_name: "Number of days that are part of a heatwave",
                abstract_: "Number of days that are part of a heatwave, defined as five or more consecutive days over 25℃.",
                standard_name: "heat_wave_index",
                units: "days",
                cell_methods: "",
                parameters: vec![
                    required("tasmax", "Maximum daily temperature."),
                    with_default(
                        "thresh",
                        Value::from(HWI_THRESH),
                        "Threshold temperature on which to designate a heatwave.",
                    ),
                    with_default(
                        "window",
                        Value::from(HWI_WINDOW),
                        "Minimum number of days with temperature above threshold to qualify as a heatwave.",
                    ),
                    freq_param(),
                ],
            },
            heat_wave_index,
        ),
    ]
}

fn heat_wave_frequency(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    let tn_thresh = args
        .quantity("thresh_tasmin", HWF_THRESH_TASMIN)?
        .temperature_in("K")?;
    let tx_thresh = args
        .quantity("thresh_tasmax", HWF_THRESH_TASMAX)?
        .temperature_in("K")?;
    let window = args.positive_integer("window", HWF_WINDOW)?;

    let tasmin = load_kelvin(args, "tasmin")?;
    let tasmax = load_kelvin(args, "tasmax")?;

    let hot = tasmin.zip_with(&tasmax, |tn, tx| {
        if tn.is_nan() || tx.is_nan() {
            f64::NAN
        } else if tn > tn_thresh && tx > tx_thresh {
            1.0
        } else {
            0.0
        }
    })?;

    hot.resample(args.frequency()?, |flags| {
        runs(flags).into_iter().filter(|&len| len >= window).count() as f64
    })
}

fn heat_wave_index(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    let thresh = args.quantity("thresh", HWI_THRESH)?.temperature_in("K")?;
    let window = args.positive_integer("window", HWI_WINDOW)?;

    let hot = load_kelvin(args, "tasmax")?.map(|tx| {
        if tx.is_nan() {
            f64::NAN
        } else if tx > thresh {
            1.0
        } else {
            0.0
        }
    });

    hot.resample(args.frequency()?, |flags| {
        runs(flags)
            .into_iter()
            .filter(|&len| len >= window)
            .sum::<usize>() as f64
    })
}
