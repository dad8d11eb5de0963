//! Precipitation totals.

use netcdf_io::AttrValue;

use super::{freq_param, indicator, required, BuiltinIndicator, Definition};
use crate::args::IndicatorArgs;
use crate::error::IndicatorResult;
use crate::resample::{Resampled, TimeSeries};
use crate::units::precipitation_to_mm_per_day;

pub(super) fn indicators() -> Vec<BuiltinIndicator> {
    vec![indicator(
        Definition {
            identifier: "prcptot",
            long_name: "Total precipitation",
            abstract_: "Total precipitation.",
            standard_name: "lwe_thickness_of_precipitation_amount",
            units: "mm",
            cell_methods: "time: sum within days time: sum over days",
            parameters: vec![
                required("pr", "Total daily precipitation [kg m-2 s-1]."),
                freq_param(),
            ],
        },
        prcptot,
    )]
}

fn prcptot(args: &IndicatorArgs) -> IndicatorResult<Resampled> {
    let pr = TimeSeries::load(args.array("pr")?)?;
    let factor = precipitation_to_mm_per_day(pr.units().unwrap_or("kg m-2 s-1"))?;

    let mut daily = pr.map(|v| v * factor);
    daily
        .array
        .attrs
        .insert("units".to_string(), AttrValue::from("mm/d"));

    daily.resample(args.frequency()?, |s| s.iter().sum())
}

#[cfg(test)]
mod tests {
    use super::super::testing::daily;
    use crate::args::{ArgValue, IndicatorArgs};
    use crate::catalog::IndicatorCatalog;
    use crate::Indicator;

    #[test]
    fn test_prcptot_converts_flux() {
        // 1 mm/day expressed as a flux.
        let pr = daily("pr", "kg m-2 s-1", |_, _| 1.0 / 86_400.0);
        let args = IndicatorArgs::new()
            .with("pr", ArgValue::Array(pr))
            .with("freq", ArgValue::Text("QS-DEC".to_string()));

        let out = IndicatorCatalog::builtin()
            .get("prcptot")
            .unwrap()
            .compute(&args)
            .unwrap();
        let var = &out.data_vars["prcptot"];

        // Seasons starting Dec 2000, Mar, Jun, Sep and Dec 2001
        assert_eq!(var.shape, vec![5, 2]);
        assert!((var.values[0] - 59.0).abs() < 1e-6);
        assert!((var.values[2] - 92.0).abs() < 1e-6);
        assert!((var.values[8] - 31.0).abs() < 1e-6);
    }
}
