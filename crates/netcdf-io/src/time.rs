//! CF time coordinates.
//!
//! Time values are offsets from an epoch, e.g. `days since 1950-01-01`,
//! interpreted in the calendar named by the variable's `calendar`
//! attribute. The standard calendar is handled as proleptic Gregorian.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::attrs::{text_attr, Attributes};
use crate::error::{NetCdfError, NetCdfResult};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Supported CF calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    Standard,
    NoLeap,
    AllLeap,
    Day360,
}

impl Calendar {
    /// Parse a `calendar` attribute. A missing attribute means standard.
    pub fn parse(name: Option<&str>) -> NetCdfResult<Self> {
        let name = match name {
            Some(name) => name.trim().to_ascii_lowercase(),
            None => return Ok(Self::Standard),
        };
        match name.as_str() {
            "" | "standard" | "gregorian" | "proleptic_gregorian" => Ok(Self::Standard),
            "noleap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "360_day" => Ok(Self::Day360),
            other => Err(NetCdfError::Time(format!("unsupported calendar: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Day360 => "360_day",
        }
    }

    fn days_in_month(&self, year: i32, month: u32) -> u32 {
        match self {
            Self::Day360 => 30,
            Self::NoLeap => NOLEAP_MONTH_DAYS[(month - 1) as usize],
            Self::AllLeap => {
                if month == 2 {
                    29
                } else {
                    NOLEAP_MONTH_DAYS[(month - 1) as usize]
                }
            }
            Self::Standard => {
                let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
                if month == 2 && leap {
                    29
                } else {
                    NOLEAP_MONTH_DAYS[(month - 1) as usize]
                }
            }
        }
    }

    fn days_in_year(&self) -> i64 {
        match self {
            Self::Day360 => 360,
            Self::NoLeap => 365,
            Self::AllLeap => 366,
            Self::Standard => 365,
        }
    }

    /// Day number of `date` counted from an arbitrary fixed origin.
    fn ordinal(&self, date: &CfDate) -> NetCdfResult<i64> {
        if let Self::Standard = self {
            let naive = NaiveDate::from_ymd_opt(date.year, date.month, date.day)
                .ok_or_else(|| NetCdfError::Time(format!("invalid date {}", date)))?;
            return Ok(naive.num_days_from_ce() as i64);
        }
        if date.month == 0 || date.month > 12 || date.day == 0 {
            return Err(NetCdfError::Time(format!("invalid date {}", date)));
        }
        let before: u32 = (1..date.month)
            .map(|m| self.days_in_month(date.year, m))
            .sum();
        Ok(date.year as i64 * self.days_in_year() + before as i64 + date.day as i64 - 1)
    }

    fn date_of(&self, ordinal: i64) -> NetCdfResult<CfDate> {
        if let Self::Standard = self {
            let days = i32::try_from(ordinal)
                .map_err(|_| NetCdfError::Time(format!("day number out of range: {}", ordinal)))?;
            let naive = NaiveDate::from_num_days_from_ce_opt(days)
                .ok_or_else(|| NetCdfError::Time(format!("day number out of range: {}", ordinal)))?;
            return Ok(CfDate::new(naive.year(), naive.month(), naive.day()));
        }
        let per_year = self.days_in_year();
        let year = ordinal.div_euclid(per_year) as i32;
        let mut remaining = ordinal.rem_euclid(per_year) as u32;
        let mut month = 1;
        while remaining >= self.days_in_month(year, month) {
            remaining -= self.days_in_month(year, month);
            month += 1;
        }
        Ok(CfDate::new(year, month, remaining + 1))
    }
}

const NOLEAP_MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// A calendar date, independent of any particular calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CfDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CfDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    /// `YYYYMMDD`.
    pub fn compact(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

impl fmt::Display for CfDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Parsed `units` and `calendar` of a time coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    /// Seconds per unit step.
    unit_seconds: f64,
    epoch: CfDate,
    /// Seconds past midnight of the epoch.
    epoch_seconds: f64,
    pub calendar: Calendar,
}

impl TimeUnits {
    /// Parse `"<unit> since <date>[ <time>]"`.
    pub fn parse(units: &str, calendar: Calendar) -> NetCdfResult<Self> {
        let (unit, reference) = units
            .split_once(" since ")
            .ok_or_else(|| NetCdfError::Time(format!("no reference date in '{}'", units)))?;

        let unit_seconds = match unit.trim().to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => SECONDS_PER_DAY,
            "hours" | "hour" | "hr" | "h" => 3_600.0,
            "minutes" | "minute" | "min" => 60.0,
            "seconds" | "second" | "sec" | "s" => 1.0,
            other => return Err(NetCdfError::Time(format!("unsupported time unit: {}", other))),
        };

        let mut parts = reference.split_whitespace();
        let date_part = parts
            .next()
            .ok_or_else(|| NetCdfError::Time(format!("no reference date in '{}'", units)))?;
        // ISO form "1950-01-01T00:00:00"
        let (date_part, inline_time) = match date_part.split_once('T') {
            Some((d, t)) => (d, Some(t)),
            None => (date_part, None),
        };
        let epoch = parse_date(date_part)?;
        let epoch_seconds = match inline_time.or_else(|| parts.next()) {
            Some(time) => parse_time_of_day(time)?,
            None => 0.0,
        };

        Ok(Self {
            unit_seconds,
            epoch,
            epoch_seconds,
            calendar,
        })
    }

    /// Read `units` and `calendar` from a coordinate's attributes.
    pub fn from_attrs(attrs: &Attributes) -> NetCdfResult<Self> {
        let units = text_attr(attrs, "units")
            .ok_or_else(|| NetCdfError::Time("time coordinate has no units".to_string()))?;
        let calendar = Calendar::parse(text_attr(attrs, "calendar"))?;
        Self::parse(units, calendar)
    }

    /// Date of a time value. The time of day is dropped.
    pub fn decode(&self, value: f64) -> NetCdfResult<CfDate> {
        if !value.is_finite() {
            return Err(NetCdfError::Time(format!("non-finite time value {}", value)));
        }
        let seconds = value * self.unit_seconds + self.epoch_seconds;
        let days = (seconds / SECONDS_PER_DAY).floor() as i64;
        self.calendar
            .date_of(self.calendar.ordinal(&self.epoch)? + days)
    }

    /// Time value of midnight on `date`.
    pub fn encode(&self, date: &CfDate) -> NetCdfResult<f64> {
        let days = self.calendar.ordinal(date)? - self.calendar.ordinal(&self.epoch)?;
        Ok((days as f64 * SECONDS_PER_DAY - self.epoch_seconds) / self.unit_seconds)
    }

    pub fn decode_all(&self, values: &[f64]) -> NetCdfResult<Vec<CfDate>> {
        values.iter().map(|&v| self.decode(v)).collect()
    }
}

fn parse_date(text: &str) -> NetCdfResult<CfDate> {
    let invalid = || NetCdfError::Time(format!("invalid reference date '{}'", text));

    // A leading '-' belongs to the year.
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text),
    };
    let mut fields = body.split('-');
    let year: i32 = fields
        .next()
        .and_then(|y| y.parse().ok())
        .ok_or_else(invalid)?;
    let month: u32 = match fields.next() {
        Some(m) => m.parse().map_err(|_| invalid())?,
        None => 1,
    };
    let day: u32 = match fields.next() {
        Some(d) => d.parse().map_err(|_| invalid())?,
        None => 1,
    };
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(invalid());
    }
    Ok(CfDate::new(sign * year, month, day))
}

fn parse_time_of_day(text: &str) -> NetCdfResult<f64> {
    let text = text.trim_end_matches('Z');
    let mut seconds = 0.0;
    for (field, scale) in text.split(':').zip([3_600.0, 60.0, 1.0]) {
        let value: f64 = field
            .parse()
            .map_err(|_| NetCdfError::Time(format!("invalid reference time '{}'", text)))?;
        seconds += value * scale;
    }
    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_calendar() {
        assert_eq!(Calendar::parse(None).unwrap(), Calendar::Standard);
        assert_eq!(Calendar::parse(Some("gregorian")).unwrap(), Calendar::Standard);
        assert_eq!(Calendar::parse(Some("365_day")).unwrap(), Calendar::NoLeap);
        assert_eq!(Calendar::parse(Some("360_day")).unwrap(), Calendar::Day360);
        assert!(Calendar::parse(Some("julian")).is_err());
    }

    #[test]
    fn test_decode_days_since_standard() {
        let units = TimeUnits::parse("days since 2000-01-01 00:00:00", Calendar::Standard).unwrap();
        assert_eq!(units.decode(0.0).unwrap(), CfDate::new(2000, 1, 1));
        assert_eq!(units.decode(59.0).unwrap(), CfDate::new(2000, 2, 29));
        assert_eq!(units.decode(366.5).unwrap(), CfDate::new(2001, 1, 1));
        assert_eq!(units.decode(-1.0).unwrap(), CfDate::new(1999, 12, 31));
    }

    #[test]
    fn test_decode_hours_and_reference_time() {
        let units = TimeUnits::parse("hours since 1950-01-01 12:00:00", Calendar::Standard).unwrap();
        assert_eq!(units.decode(11.0).unwrap(), CfDate::new(1950, 1, 1));
        assert_eq!(units.decode(12.0).unwrap(), CfDate::new(1950, 1, 2));
    }

    #[test]
    fn test_noleap_has_no_february_29() {
        let units = TimeUnits::parse("days since 2000-01-01", Calendar::NoLeap).unwrap();
        assert_eq!(units.decode(59.0).unwrap(), CfDate::new(2000, 3, 1));
        assert_eq!(units.decode(365.0).unwrap(), CfDate::new(2001, 1, 1));
    }

    #[test]
    fn test_360_day_months() {
        let units = TimeUnits::parse("days since 2000-01-01", Calendar::Day360).unwrap();
        assert_eq!(units.decode(30.0).unwrap(), CfDate::new(2000, 2, 1));
        assert_eq!(units.decode(359.0).unwrap(), CfDate::new(2000, 12, 30));
    }

    #[test]
    fn test_encode_inverts_decode() {
        let units = TimeUnits::parse("days since 1850-01-01", Calendar::NoLeap).unwrap();
        let date = CfDate::new(2006, 7, 1);
        let value = units.encode(&date).unwrap();
        assert_eq!(units.decode(value).unwrap(), date);
    }

    #[test]
    fn test_iso_reference() {
        let units = TimeUnits::parse("seconds since 1970-01-01T00:00:00Z", Calendar::Standard)
            .unwrap();
        assert_eq!(units.decode(86_400.0).unwrap(), CfDate::new(1970, 1, 2));
    }

    #[test]
    fn test_rejects_bad_units() {
        assert!(TimeUnits::parse("days", Calendar::Standard).is_err());
        assert!(TimeUnits::parse("fortnights since 2000-01-01", Calendar::Standard).is_err());
        assert!(TimeUnits::parse("days since 2000-13-01", Calendar::Standard).is_err());
    }

    #[test]
    fn test_compact_date() {
        assert_eq!(CfDate::new(2006, 1, 1).compact(), "20060101");
        assert_eq!(CfDate::new(2006, 1, 1).to_string(), "2006-01-01");
    }
}
