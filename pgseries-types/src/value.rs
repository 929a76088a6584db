//! Runtime values supplied as series bounds, steps, spans, and composition elements.
//!
//! [`SeriesValue`] is the dynamically typed input of a series request. Its
//! [`ValueKind`] is what the type registry matches against accepted type
//! sets, so two values are "the same concrete type" exactly when their kinds
//! are equal.

use std::cmp::Ordering;
use std::fmt;

use pgseries_result::{Error, Result};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::decimal::DecimalValue;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATETIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATETIME_MICROS_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");
const DATETIME_TZ_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);
const DATETIME_TZ_MICROS_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6][offset_hour sign:mandatory]:[offset_minute]"
);

/// A value supplied by the caller before it is checked against a column type.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Integer(i64),
    Boolean(bool),
    Float(f64),
    Decimal(DecimalValue),
    Date(Date),
    /// Datetime without a UTC offset.
    DateTime(PrimitiveDateTime),
    /// Datetime carrying a UTC offset.
    DateTimeTz(OffsetDateTime),
    Text(String),
    Bytes(Vec<u8>),
}

/// The concrete runtime type of a [`SeriesValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Boolean,
    Float,
    Decimal,
    Date,
    DateTime,
    DateTimeTz,
    Text,
    Bytes,
}

impl ValueKind {
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Boolean => "boolean",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::DateTimeTz => "datetime with offset",
            ValueKind::Text => "text",
            ValueKind::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! impl_from_for_series_value {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for SeriesValue {
                fn from(v: $t) -> Self {
                    SeriesValue::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_series_value!(Integer, i8, i16, i32, i64, u8, u16, u32);
impl_from_for_series_value!(Float, f32, f64);
impl_from_for_series_value!(Boolean, bool);
impl_from_for_series_value!(Decimal, DecimalValue);
impl_from_for_series_value!(Date, Date);
impl_from_for_series_value!(DateTime, PrimitiveDateTime);
impl_from_for_series_value!(DateTimeTz, OffsetDateTime);
impl_from_for_series_value!(Text, String);
impl_from_for_series_value!(Bytes, Vec<u8>);

impl From<&str> for SeriesValue {
    fn from(v: &str) -> Self {
        SeriesValue::Text(v.to_string())
    }
}

impl SeriesValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            SeriesValue::Integer(_) => ValueKind::Integer,
            SeriesValue::Boolean(_) => ValueKind::Boolean,
            SeriesValue::Float(_) => ValueKind::Float,
            SeriesValue::Decimal(_) => ValueKind::Decimal,
            SeriesValue::Date(_) => ValueKind::Date,
            SeriesValue::DateTime(_) => ValueKind::DateTime,
            SeriesValue::DateTimeTz(_) => ValueKind::DateTimeTz,
            SeriesValue::Text(_) => ValueKind::Text,
            SeriesValue::Bytes(_) => ValueKind::Bytes,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SeriesValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view used when integers and decimals meet in one series.
    pub fn as_decimal(&self) -> Option<DecimalValue> {
        match self {
            SeriesValue::Integer(v) => Some(DecimalValue::from_i64(*v)),
            SeriesValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SeriesValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Order two values the way the database would, or `None` when the kinds
    /// cannot be compared. Integers and decimals compare numerically.
    pub fn compare(&self, other: &SeriesValue) -> Option<Ordering> {
        use SeriesValue::*;
        match (self, other) {
            (Integer(a), Integer(b)) => Some(a.cmp(b)),
            (Integer(_) | Decimal(_), Integer(_) | Decimal(_)) => {
                Some(self.as_decimal()?.cmp(&other.as_decimal()?))
            }
            (Boolean(a), Boolean(b)) => Some(a.cmp(b)),
            (Float(a), Float(b)) => a.partial_cmp(b),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (DateTime(a), DateTime(b)) => Some(a.cmp(b)),
            (DateTimeTz(a), DateTimeTz(b)) => Some(a.cmp(b)),
            (Text(a), Text(b)) => Some(a.cmp(b)),
            (Bytes(a), Bytes(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Whether a numeric value is strictly positive. Non-numeric kinds
    /// return `None`.
    pub fn is_positive_number(&self) -> Option<bool> {
        match self {
            SeriesValue::Integer(v) => Some(*v > 0),
            SeriesValue::Decimal(d) => Some(d.is_positive()),
            SeriesValue::Float(f) => Some(*f > 0.0),
            _ => None,
        }
    }
}

impl fmt::Display for SeriesValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesValue::Integer(v) => write!(f, "{v}"),
            SeriesValue::Boolean(v) => write!(f, "{v}"),
            SeriesValue::Float(v) => write!(f, "{v}"),
            SeriesValue::Decimal(v) => write!(f, "{v}"),
            SeriesValue::Date(v) => f.write_str(&format_date(*v).map_err(|_| fmt::Error)?),
            SeriesValue::DateTime(v) => f.write_str(&format_datetime(*v).map_err(|_| fmt::Error)?),
            SeriesValue::DateTimeTz(v) => {
                f.write_str(&format_datetime_tz(*v).map_err(|_| fmt::Error)?)
            }
            SeriesValue::Text(v) => f.write_str(v),
            SeriesValue::Bytes(v) => {
                f.write_str("\\x")?;
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// Render a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> Result<String> {
    date.format(DATE_FORMAT).map_err(format_error)
}

/// Render a datetime as `YYYY-MM-DD HH:MM:SS[.ffffff]`.
pub fn format_datetime(value: PrimitiveDateTime) -> Result<String> {
    let format = if value.microsecond() == 0 {
        DATETIME_FORMAT
    } else {
        DATETIME_MICROS_FORMAT
    };
    value.format(format).map_err(format_error)
}

/// Render an offset datetime as `YYYY-MM-DD HH:MM:SS[.ffffff]+HH:MM`.
pub fn format_datetime_tz(value: OffsetDateTime) -> Result<String> {
    let format = if value.microsecond() == 0 {
        DATETIME_TZ_FORMAT
    } else {
        DATETIME_TZ_MICROS_FORMAT
    };
    value.format(format).map_err(format_error)
}

fn format_error(err: time::error::Format) -> Error {
    Error::Internal(format!("failed to format temporal value: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn integers_and_decimals_compare_numerically() {
        let one = SeriesValue::Integer(1);
        let one_and_half = SeriesValue::Decimal("1.5".parse().unwrap());
        assert_eq!(one.compare(&one_and_half), Some(Ordering::Less));
        assert_eq!(one_and_half.compare(&one), Some(Ordering::Greater));
    }

    #[test]
    fn naive_and_aware_datetimes_do_not_compare() {
        let naive = SeriesValue::DateTime(datetime!(2024-01-01 00:00));
        let aware = SeriesValue::DateTimeTz(datetime!(2024-01-01 00:00 UTC));
        assert_eq!(naive.compare(&aware), None);
        assert_ne!(naive.kind(), aware.kind());
    }

    #[test]
    fn booleans_keep_their_own_kind() {
        assert_eq!(SeriesValue::from(true).kind(), ValueKind::Boolean);
        assert_eq!(SeriesValue::from(1_i32).kind(), ValueKind::Integer);
    }

    #[test]
    fn formats_temporal_values() {
        assert_eq!(SeriesValue::Date(date!(2024-02-29)).to_string(), "2024-02-29");
        assert_eq!(
            SeriesValue::DateTime(datetime!(2024-01-01 08:30:05.25)).to_string(),
            "2024-01-01 08:30:05.250000"
        );
        assert_eq!(
            SeriesValue::DateTimeTz(datetime!(2024-01-01 08:30 -05:30)).to_string(),
            "2024-01-01 08:30:00-05:30"
        );
        assert_eq!(
            format_datetime_tz(datetime!(1999-12-31 23:59:59.000001 +09:00)).unwrap(),
            "1999-12-31 23:59:59.000001+09:00"
        );
        assert_eq!(format_date(date!(0999-01-02)).unwrap(), "0999-01-02");
    }
}
