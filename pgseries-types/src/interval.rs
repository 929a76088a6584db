//! Textual interval steps (`"1 days"`, `"15 minutes"`) used by date and datetime series.
//!
//! A step is accepted only when it is a number, a single space, and one of the
//! [`INTERVAL_UNITS`] names. Each malformed shape maps to its own error variant
//! so callers can tell a bad shape from a bad unit or a bad amount.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use pgseries_result::{Error, Result};
use regex::Regex;

const NANOS_PER_MICROSECOND: i64 = 1_000;
const NANOS_PER_MILLISECOND: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
pub const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;
const DAYS_PER_MONTH: f64 = 30.0;

/// Interval unit names accepted in a textual step.
pub const INTERVAL_UNITS: [&str; 25] = [
    "century",
    "centuries",
    "day",
    "days",
    "decade",
    "decades",
    "hour",
    "hours",
    "microsecond",
    "microseconds",
    "millennium",
    "millennia",
    "millenniums",
    "millisecond",
    "milliseconds",
    "minute",
    "minutes",
    "month",
    "months",
    "second",
    "seconds",
    "week",
    "weeks",
    "year",
    "years",
];

/// Interval value stored as a combination of calendar months, whole days, and nanoseconds.
///
/// Months capture month and year components (12 months == 1 year). Days are
/// whole calendar days and nanoseconds account for sub-day precision, which is
/// how PostgreSQL keeps `interval` values apart so that month arithmetic stays
/// calendar-aware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IntervalValue {
    pub months: i32,
    pub days: i32,
    pub nanos: i64,
}

impl IntervalValue {
    pub const fn new(months: i32, days: i32, nanos: i64) -> Self {
        Self {
            months,
            days,
            nanos,
        }
    }

    pub const fn zero() -> Self {
        Self::new(0, 0, 0)
    }

    pub const fn is_zero(self) -> bool {
        self.months == 0 && self.days == 0 && self.nanos == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntervalUnit {
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
    Decade,
    Century,
    Millennium,
}

impl IntervalUnit {
    /// Look up a unit by one of its recognized spellings (case-sensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let unit = match name {
            "microsecond" | "microseconds" => IntervalUnit::Microsecond,
            "millisecond" | "milliseconds" => IntervalUnit::Millisecond,
            "second" | "seconds" => IntervalUnit::Second,
            "minute" | "minutes" => IntervalUnit::Minute,
            "hour" | "hours" => IntervalUnit::Hour,
            "day" | "days" => IntervalUnit::Day,
            "week" | "weeks" => IntervalUnit::Week,
            "month" | "months" => IntervalUnit::Month,
            "year" | "years" => IntervalUnit::Year,
            "decade" | "decades" => IntervalUnit::Decade,
            "century" | "centuries" => IntervalUnit::Century,
            "millennium" | "millennia" | "millenniums" => IntervalUnit::Millennium,
            _ => return None,
        };
        Some(unit)
    }

    fn months_factor(self) -> Option<f64> {
        match self {
            IntervalUnit::Month => Some(1.0),
            IntervalUnit::Year => Some(12.0),
            IntervalUnit::Decade => Some(120.0),
            IntervalUnit::Century => Some(1_200.0),
            IntervalUnit::Millennium => Some(12_000.0),
            _ => None,
        }
    }

    fn days_factor(self) -> Option<f64> {
        match self {
            IntervalUnit::Day => Some(1.0),
            IntervalUnit::Week => Some(7.0),
            _ => None,
        }
    }

    fn nanos_factor(self) -> Option<i64> {
        match self {
            IntervalUnit::Microsecond => Some(NANOS_PER_MICROSECOND),
            IntervalUnit::Millisecond => Some(NANOS_PER_MILLISECOND),
            IntervalUnit::Second => Some(NANOS_PER_SECOND),
            IntervalUnit::Minute => Some(NANOS_PER_MINUTE),
            IntervalUnit::Hour => Some(NANOS_PER_HOUR),
            _ => None,
        }
    }
}

/// A validated textual interval step such as `"1 days"`.
///
/// The original text is kept verbatim because it is bound as the `interval`
/// parameter of the generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStep {
    text: String,
    amount: f64,
    unit: IntervalUnit,
}

impl IntervalStep {
    pub fn parse(text: &str) -> Result<Self> {
        static SHAPE_RE: OnceLock<Regex> = OnceLock::new();
        static AMOUNT_RE: OnceLock<Regex> = OnceLock::new();
        let shape = SHAPE_RE.get_or_init(|| {
            Regex::new(r"^([^\s]+) ([^\s]+)$").expect("valid interval shape regex")
        });
        let amount_re = AMOUNT_RE.get_or_init(|| {
            Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)$").expect("valid interval amount regex")
        });

        let Some(caps) = shape.captures(text) else {
            return Err(Error::InvalidStepValue(format!(
                "Incorrect number of values for series step string '{text}'. \
                 Should be a numeric value, a space, and an interval type."
            )));
        };
        let amount_text = &caps[1];
        let unit_text = &caps[2];

        if !amount_re.is_match(amount_text) {
            return Err(Error::InvalidIntervalValue(format!(
                "Invalid interval value '{amount_text}'. Must be capable of being converted to a numeric type."
            )));
        }
        let amount = amount_text.parse::<f64>().map_err(|_| {
            Error::InvalidIntervalValue(format!(
                "Invalid interval value '{amount_text}'. Must be capable of being converted to a numeric type."
            ))
        })?;

        let unit = IntervalUnit::from_name(unit_text).ok_or_else(|| {
            Error::InvalidIntervalUnit(format!(
                "'{unit_text}' is not one of the recognized interval units"
            ))
        })?;

        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidIntervalValue(format!(
                "interval amount '{amount_text}' must be greater than zero"
            )));
        }

        Ok(Self {
            text: text.to_string(),
            amount,
            unit,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    /// Convert to months/days/nanoseconds, cascading fractional months into
    /// 30-day days and fractional days into nanoseconds.
    pub fn to_interval_value(&self) -> Result<IntervalValue> {
        let overflow = || Error::InvalidIntervalValue(format!("interval '{}' overflows", self.text));

        if let Some(factor) = self.unit.months_factor() {
            let total_months = self.amount * factor;
            let months = total_months.trunc();
            let total_days = (total_months - months) * DAYS_PER_MONTH;
            let days = total_days.trunc();
            let nanos = ((total_days - days) * NANOS_PER_DAY as f64).round();
            return Ok(IntervalValue::new(
                f64_to_i32(months).ok_or_else(overflow)?,
                f64_to_i32(days).ok_or_else(overflow)?,
                f64_to_i64(nanos).ok_or_else(overflow)?,
            ));
        }

        if let Some(factor) = self.unit.days_factor() {
            let total_days = self.amount * factor;
            let days = total_days.trunc();
            let nanos = ((total_days - days) * NANOS_PER_DAY as f64).round();
            return Ok(IntervalValue::new(
                0,
                f64_to_i32(days).ok_or_else(overflow)?,
                f64_to_i64(nanos).ok_or_else(overflow)?,
            ));
        }

        let factor = self.unit.nanos_factor().ok_or_else(overflow)?;
        let nanos = (self.amount * factor as f64).round();
        Ok(IntervalValue::new(0, 0, f64_to_i64(nanos).ok_or_else(overflow)?))
    }
}

impl FromStr for IntervalStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for IntervalStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn f64_to_i32(value: f64) -> Option<i32> {
    (value >= i32::MIN as f64 && value <= i32::MAX as f64).then_some(value as i32)
}

fn f64_to_i64(value: f64) -> Option<i64> {
    (value >= i64::MIN as f64 && value < i64::MAX as f64).then_some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_unit_is_recognized() {
        for name in INTERVAL_UNITS {
            assert!(
                IntervalUnit::from_name(name).is_some(),
                "{name} should be a recognized unit"
            );
            IntervalStep::parse(&format!("2 {name}")).expect("valid step");
        }
    }

    #[test]
    fn shape_errors_are_distinct_from_unit_errors() {
        for text in ["1days", "1  days", " 1 days", "1 days ago", "", "days"] {
            assert!(
                matches!(IntervalStep::parse(text), Err(Error::InvalidStepValue(_))),
                "{text:?} should be rejected as a malformed step"
            );
        }
        assert!(matches!(
            IntervalStep::parse("1 fortnight"),
            Err(Error::InvalidIntervalUnit(_))
        ));
        assert!(matches!(
            IntervalStep::parse("1 Days"),
            Err(Error::InvalidIntervalUnit(_))
        ));
        assert!(matches!(
            IntervalStep::parse("one days"),
            Err(Error::InvalidIntervalValue(_))
        ));
        assert!(matches!(
            IntervalStep::parse("1e3 days"),
            Err(Error::InvalidIntervalValue(_))
        ));
        assert!(matches!(
            IntervalStep::parse("0 days"),
            Err(Error::InvalidIntervalValue(_))
        ));
    }

    #[test]
    fn converts_to_month_day_nano_components() {
        let step = IntervalStep::parse("1.5 months").unwrap();
        assert_eq!(step.to_interval_value().unwrap(), IntervalValue::new(1, 15, 0));

        let step = IntervalStep::parse("2 weeks").unwrap();
        assert_eq!(step.to_interval_value().unwrap(), IntervalValue::new(0, 14, 0));

        let step = IntervalStep::parse("1.5 days").unwrap();
        assert_eq!(
            step.to_interval_value().unwrap(),
            IntervalValue::new(0, 1, NANOS_PER_DAY / 2)
        );

        let step = IntervalStep::parse("1 century").unwrap();
        assert_eq!(step.to_interval_value().unwrap(), IntervalValue::new(1_200, 0, 0));

        let step = IntervalStep::parse("250 milliseconds").unwrap();
        assert_eq!(
            step.to_interval_value().unwrap(),
            IntervalValue::new(0, 0, 250 * NANOS_PER_MILLISECOND)
        );
    }
}
