//! Time series loading and resampling to coarser frequencies.

use indexmap::IndexMap;
use netcdf_io::{CfDate, DataArray, LazyArray, TimeUnits};

use crate::error::{IndicatorError, IndicatorResult};

/// Name of the time dimension and coordinate.
pub const TIME: &str = "time";

/// Resampling frequencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    /// `YS`: calendar years.
    Annual,
    /// `MS`: calendar months.
    Monthly,
    /// `QS-DEC`: seasons DJF, MAM, JJA, SON.
    Seasonal,
    /// `AS-JUL`: years starting in July.
    AnnualJuly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Annual,
        Frequency::Monthly,
        Frequency::Seasonal,
        Frequency::AnnualJuly,
    ];

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim() {
            "YS" => Some(Self::Annual),
            "MS" => Some(Self::Monthly),
            "QS-DEC" => Some(Self::Seasonal),
            "AS-JUL" => Some(Self::AnnualJuly),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Annual => "YS",
            Self::Monthly => "MS",
            Self::Seasonal => "QS-DEC",
            Self::AnnualJuly => "AS-JUL",
        }
    }

    /// CF `frequency` attribute of data at this frequency.
    pub fn cf_frequency(&self) -> &'static str {
        match self {
            Self::Annual | Self::AnnualJuly => "yr",
            Self::Monthly => "mon",
            Self::Seasonal => "seas",
        }
    }

    /// First day of the period containing `date`.
    pub fn period_start(&self, date: &CfDate) -> CfDate {
        match self {
            Self::Annual => CfDate::new(date.year, 1, 1),
            Self::Monthly => CfDate::new(date.year, date.month, 1),
            Self::Seasonal => match date.month {
                12 => CfDate::new(date.year, 12, 1),
                1 | 2 => CfDate::new(date.year - 1, 12, 1),
                m => CfDate::new(date.year, m - (m % 3), 1),
            },
            Self::AnnualJuly => {
                if date.month >= 7 {
                    CfDate::new(date.year, 7, 1)
                } else {
                    CfDate::new(date.year - 1, 7, 1)
                }
            }
        }
    }
}

/// A loaded variable with a decoded time axis.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    pub array: DataArray,
    pub dates: Vec<CfDate>,
    pub time_units: TimeUnits,

    /// Attributes of the time coordinate, reused for the resampled axis.
    pub time_attrs: netcdf_io::Attributes,

    /// Coordinates of the non-time dimensions.
    pub coords: IndexMap<String, DataArray>,

    time_axis: usize,
}

impl TimeSeries {
    /// Load `lazy` and decode its time coordinate.
    pub fn load(lazy: &LazyArray) -> IndicatorResult<Self> {
        let time_axis = lazy
            .dims
            .iter()
            .position(|d| d == TIME)
            .ok_or_else(|| IndicatorError::invalid(&lazy.name, "variable has no time dimension"))?;
        let time = lazy
            .coords
            .get(TIME)
            .ok_or_else(|| IndicatorError::invalid(&lazy.name, "variable has no time coordinate"))?;

        let time_units = TimeUnits::from_attrs(&time.attrs)?;
        let dates = time_units.decode_all(&time.values)?;
        let array = lazy.load()?;

        let coords = lazy
            .coords
            .iter()
            .filter(|(name, _)| name.as_str() != TIME)
            .map(|(name, c)| (name.clone(), c.clone()))
            .collect();

        Ok(Self {
            array,
            dates,
            time_units,
            time_attrs: time.attrs.clone(),
            coords,
            time_axis,
        })
    }

    pub fn name(&self) -> &str {
        &self.array.name
    }

    pub fn units(&self) -> Option<&str> {
        netcdf_io::text_attr(&self.array.attrs, "units")
    }

    pub fn steps(&self) -> usize {
        self.dates.len()
    }

    /// Elementwise combination with another series over the same grid.
    pub fn zip_with(
        &self,
        other: &TimeSeries,
        f: impl Fn(f64, f64) -> f64,
    ) -> IndicatorResult<TimeSeries> {
        if self.steps() != other.steps() {
            return Err(IndicatorError::Mismatch(format!(
                "time axes of {} ({} steps) and {} ({} steps) must be equal",
                self.name(),
                self.steps(),
                other.name(),
                other.steps()
            )));
        }
        if self.array.shape != other.array.shape || self.array.dims != other.array.dims {
            return Err(IndicatorError::Mismatch(format!(
                "grids of {} {:?} and {} {:?} must be equal",
                self.name(),
                self.array.shape,
                other.name(),
                other.array.shape
            )));
        }

        let mut combined = self.clone();
        combined.array.values = self
            .array
            .values
            .iter()
            .zip(&other.array.values)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(combined)
    }

    /// Apply `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> TimeSeries {
        let mut mapped = self.clone();
        for v in &mut mapped.array.values {
            *v = f(*v);
        }
        mapped
    }

    /// Reduce each cell's series within each period.
    ///
    /// The reducer sees the values of one period in time order. A period
    /// containing a missing value yields NaN.
    pub fn resample(
        &self,
        freq: Frequency,
        reducer: impl Fn(&[f64]) -> f64,
    ) -> IndicatorResult<Resampled> {
        let mut groups: IndexMap<CfDate, Vec<usize>> = IndexMap::new();
        for (i, date) in self.dates.iter().enumerate() {
            groups.entry(freq.period_start(date)).or_default().push(i);
        }

        let shape = &self.array.shape;
        let steps = shape[self.time_axis];
        let outer: usize = shape[..self.time_axis].iter().product();
        let inner: usize = shape[self.time_axis + 1..].iter().product();
        let periods = groups.len();

        let mut values = vec![f64::NAN; outer * periods * inner];
        let mut series = Vec::with_capacity(steps);
        for o in 0..outer {
            for i in 0..inner {
                for (p, indices) in groups.values().enumerate() {
                    series.clear();
                    series.extend(
                        indices
                            .iter()
                            .map(|&t| self.array.values[(o * steps + t) * inner + i]),
                    );
                    values[(o * periods + p) * inner + i] = if series.iter().any(|v| v.is_nan()) {
                        f64::NAN
                    } else {
                        reducer(&series)
                    };
                }
            }
        }

        let mut out_shape = shape.clone();
        out_shape[self.time_axis] = periods;

        let starts: Vec<CfDate> = groups.keys().copied().collect();
        let time_values = starts
            .iter()
            .map(|d| self.time_units.encode(d))
            .collect::<Result<Vec<_>, _>>()?;
        let time = DataArray::coordinate(TIME, time_values).with_attrs(self.time_attrs.clone());

        let array = DataArray::new(self.name(), self.array.dims.clone(), out_shape, values)?;

        Ok(Resampled {
            array,
            periods: starts,
            time,
            coords: self.coords.clone(),
        })
    }
}

/// Output of [`TimeSeries::resample`].
#[derive(Debug, Clone)]
pub struct Resampled {
    pub array: DataArray,

    /// First day of each period.
    pub periods: Vec<CfDate>,

    /// Encoded time coordinate of the periods.
    pub time: DataArray,

    pub coords: IndexMap<String, DataArray>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_io::{AttrValue, Attributes};

    fn daily_series(days: usize, values: Vec<f64>) -> LazyArray {
        let mut time_attrs = Attributes::new();
        time_attrs.insert(
            "units".to_string(),
            AttrValue::from("days since 2001-01-01 00:00:00"),
        );
        time_attrs.insert("calendar".to_string(), AttrValue::from("noleap"));
        let time = DataArray::coordinate(TIME, (0..days).map(|d| d as f64).collect())
            .with_attrs(time_attrs);
        let lat = DataArray::coordinate("lat", vec![45.0, 46.0]);

        let array = DataArray::new(
            "tas",
            vec![TIME.to_string(), "lat".to_string()],
            vec![days, 2],
            values,
        )
        .unwrap();

        let mut coords = IndexMap::new();
        coords.insert(TIME.to_string(), time);
        coords.insert("lat".to_string(), lat);
        LazyArray::from_array(array).with_coords(coords)
    }

    #[test]
    fn test_period_starts() {
        let d = CfDate::new(2001, 2, 14);
        assert_eq!(Frequency::Annual.period_start(&d), CfDate::new(2001, 1, 1));
        assert_eq!(Frequency::Monthly.period_start(&d), CfDate::new(2001, 2, 1));
        assert_eq!(Frequency::Seasonal.period_start(&d), CfDate::new(2000, 12, 1));
        assert_eq!(
            Frequency::Seasonal.period_start(&CfDate::new(2001, 5, 31)),
            CfDate::new(2001, 3, 1)
        );
        assert_eq!(
            Frequency::Seasonal.period_start(&CfDate::new(2001, 11, 1)),
            CfDate::new(2001, 9, 1)
        );
        assert_eq!(Frequency::AnnualJuly.period_start(&d), CfDate::new(2000, 7, 1));
    }

    #[test]
    fn test_codes_and_cf_frequency() {
        for freq in Frequency::ALL {
            assert_eq!(Frequency::parse(freq.code()), Some(freq));
        }
        assert_eq!(Frequency::Annual.cf_frequency(), "yr");
        assert_eq!(Frequency::AnnualJuly.cf_frequency(), "yr");
        assert_eq!(Frequency::Monthly.cf_frequency(), "mon");
        assert_eq!(Frequency::Seasonal.cf_frequency(), "seas");
        assert_eq!(Frequency::parse("W"), None);
    }

    #[test]
    fn test_monthly_mean() {
        // Jan has 31 days, Feb 28 in a noleap calendar.
        let days = 59;
        let values = (0..days).flat_map(|d| [d as f64, 1.0]).collect();
        let series = TimeSeries::load(&daily_series(days, values)).unwrap();

        let out = series
            .resample(Frequency::Monthly, |s| s.iter().sum::<f64>() / s.len() as f64)
            .unwrap();

        assert_eq!(out.periods, vec![CfDate::new(2001, 1, 1), CfDate::new(2001, 2, 1)]);
        assert_eq!(out.array.shape, vec![2, 2]);
        assert_eq!(out.array.values, vec![15.0, 1.0, 44.5, 1.0]);
        assert_eq!(out.time.values, vec![0.0, 31.0]);
        assert!(out.coords.contains_key("lat"));
    }

    #[test]
    fn test_missing_value_masks_period() {
        let mut values: Vec<f64> = vec![1.0; 40 * 2];
        values[2] = f64::NAN; // day 1, first cell
        let series = TimeSeries::load(&daily_series(40, values)).unwrap();

        let out = series
            .resample(Frequency::Monthly, |s| s.iter().sum())
            .unwrap();
        assert!(out.array.values[0].is_nan());
        assert_eq!(out.array.values[1], 31.0);
        assert_eq!(out.array.values[2], 9.0);
    }

    #[test]
    fn test_zip_with_requires_equal_time_axes() {
        let a = TimeSeries::load(&daily_series(3, vec![1.0; 6])).unwrap();
        let b = TimeSeries::load(&daily_series(4, vec![1.0; 8])).unwrap();

        let err = a.zip_with(&b, |x, y| x - y).unwrap_err();
        assert!(err.to_string().contains("must be equal"));

        let diff = a.zip_with(&a, |x, y| x + y).unwrap();
        assert_eq!(diff.array.values, vec![2.0; 6]);
    }

    #[test]
    fn test_load_requires_time_coordinate() {
        let array = DataArray::new("tas", vec!["lat".into()], vec![2], vec![1.0, 2.0]).unwrap();
        assert!(TimeSeries::load(&LazyArray::from_array(array)).is_err());
    }
}
