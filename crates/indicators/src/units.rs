//! Quantities and the unit conversions the reference indicators need.

use crate::error::{IndicatorError, IndicatorResult};

/// A number with optional units, e.g. `"25.0 degC"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub units: Option<String>,
}

impl Quantity {
    pub fn new(value: f64, units: Option<&str>) -> Self {
        Self {
            value,
            units: units.map(str::to_string),
        }
    }

    /// Parse `"<number>"` or `"<number> <units>"`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (number, units) = match text.split_once(char::is_whitespace) {
            Some((number, units)) => (number, Some(units.trim())),
            None => (text, None),
        };
        let value: f64 = number.parse().ok()?;
        Some(Self::new(value, units.filter(|u| !u.is_empty())))
    }

    /// Value expressed in temperature units `target`. A bare number is
    /// taken to already be in `target`.
    pub fn temperature_in(&self, target: &str) -> IndicatorResult<f64> {
        match &self.units {
            None => Ok(self.value),
            Some(units) => {
                let kelvin = Temperature::parse(units)?.to_kelvin(self.value);
                Ok(Temperature::parse(target)?.kelvin_to(kelvin))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temperature {
    Kelvin,
    Celsius,
    Fahrenheit,
}

impl Temperature {
    fn parse(units: &str) -> IndicatorResult<Self> {
        match units.trim() {
            "K" | "degK" | "kelvin" | "Kelvin" => Ok(Self::Kelvin),
            "degC" | "°C" | "C" | "celsius" | "Celsius" | "deg_C" => Ok(Self::Celsius),
            "degF" | "°F" | "F" | "fahrenheit" | "Fahrenheit" => Ok(Self::Fahrenheit),
            other => Err(IndicatorError::Units(format!(
                "'{}' is not a temperature unit",
                other
            ))),
        }
    }

    fn to_kelvin(self, value: f64) -> f64 {
        match self {
            Self::Kelvin => value,
            Self::Celsius => value + 273.15,
            Self::Fahrenheit => (value - 32.0) * 5.0 / 9.0 + 273.15,
        }
    }

    fn kelvin_to(self, value: f64) -> f64 {
        match self {
            Self::Kelvin => value,
            Self::Celsius => value - 273.15,
            Self::Fahrenheit => (value - 273.15) * 9.0 / 5.0 + 32.0,
        }
    }
}

/// Converter of temperature values from `from` units to `to` units.
pub fn temperature_converter(from: &str, to: &str) -> IndicatorResult<impl Fn(f64) -> f64> {
    let from = Temperature::parse(from)?;
    let to = Temperature::parse(to)?;
    Ok(move |v| to.kelvin_to(from.to_kelvin(v)))
}

/// Factor converting a precipitation flux in `units` to mm/day.
pub fn precipitation_to_mm_per_day(units: &str) -> IndicatorResult<f64> {
    let normalized: String = units.split_whitespace().collect::<Vec<_>>().join(" ");
    match normalized.as_str() {
        "kg m-2 s-1" | "kg m**-2 s**-1" | "kg/m2/s" | "kg/m^2/s" | "mm/s" | "mm s-1" => {
            Ok(86_400.0)
        }
        "mm/d" | "mm/day" | "mm d-1" | "kg m-2 d-1" => Ok(1.0),
        "m/s" | "m s-1" => Ok(86_400_000.0),
        other => Err(IndicatorError::Units(format!(
            "'{}' is not a precipitation flux unit",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(
            Quantity::parse("25 degC"),
            Some(Quantity::new(25.0, Some("degC")))
        );
        assert_eq!(Quantity::parse(" 0.5 "), Some(Quantity::new(0.5, None)));
        assert_eq!(Quantity::parse("warm"), None);
    }

    #[test]
    fn test_temperature_conversion() {
        let q = Quantity::parse("25 degC").unwrap();
        assert!((q.temperature_in("K").unwrap() - 298.15).abs() < 1e-9);
        assert!((q.temperature_in("degF").unwrap() - 77.0).abs() < 1e-9);
        assert!((q.temperature_in("degC").unwrap() - 25.0).abs() < 1e-9);

        let bare = Quantity::parse("300").unwrap();
        assert_eq!(bare.temperature_in("K").unwrap(), 300.0);
    }

    #[test]
    fn test_non_temperature_units_rejected() {
        let q = Quantity::parse("25 mm").unwrap();
        assert!(matches!(q.temperature_in("K"), Err(IndicatorError::Units(_))));
    }

    #[test]
    fn test_temperature_converter() {
        let to_kelvin = temperature_converter("degC", "K").unwrap();
        assert!((to_kelvin(-273.15)).abs() < 1e-9);
        assert!(temperature_converter("mm", "K").is_err());
    }

    #[test]
    fn test_precipitation_factor() {
        assert_eq!(precipitation_to_mm_per_day("kg m-2 s-1").unwrap(), 86_400.0);
        assert_eq!(precipitation_to_mm_per_day("mm/day").unwrap(), 1.0);
        assert!(precipitation_to_mm_per_day("K").is_err());
    }
}
