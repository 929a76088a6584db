//! Parameterized SQL text.
//!
//! Placeholders use the `%s` "format" paramstyle of PostgreSQL client
//! drivers; a literal percent sign is written `%%`. Parameters are bound in
//! the order their placeholders appear in the text, including placeholders
//! inside `--` comments, which the driver substitutes like any other.

use std::fmt;

use pgseries_result::{Error, Result};
use pgseries_types::{DecimalValue, SeriesValue, value};

/// A single bound parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Value(SeriesValue),
    /// A one-dimensional array, bound as a PostgreSQL array.
    Array(Vec<SeriesValue>),
}

impl From<SeriesValue> for SqlParam {
    fn from(value: SeriesValue) -> Self {
        SqlParam::Value(value)
    }
}

impl From<Option<SeriesValue>> for SqlParam {
    fn from(value: Option<SeriesValue>) -> Self {
        value.map_or(SqlParam::Null, SqlParam::Value)
    }
}

impl SqlParam {
    /// Render as a PostgreSQL literal.
    pub fn to_literal(&self) -> Result<String> {
        match self {
            SqlParam::Null => Ok("NULL".to_string()),
            SqlParam::Value(value) => value_literal(value),
            SqlParam::Array(values) => {
                let items = values
                    .iter()
                    .map(array_element_literal)
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("ARRAY[{}]", items.join(", ")))
            }
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal().map_err(|_| fmt::Error)?)
    }
}

/// SQL text together with the parameters for its placeholders.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl SqlFragment {
    pub fn new(sql: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Fragment without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    /// Number of `%s` placeholders in the text.
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        let mut chars = self.sql.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                continue;
            }
            if chars.next() == Some('s') {
                count += 1;
            }
        }
        count
    }

    /// Append another fragment's text and parameters.
    pub fn push(&mut self, other: SqlFragment) {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params);
    }

    pub fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    /// Substitute every placeholder with its parameter rendered as a literal.
    ///
    /// Fails with [`Error::Internal`] when the number of placeholders and
    /// parameters differ.
    pub fn interpolate(&self) -> Result<String> {
        let expected = self.placeholder_count();
        if expected != self.params.len() {
            return Err(Error::Internal(format!(
                "statement has {expected} placeholders but {} parameters were bound",
                self.params.len()
            )));
        }

        let mut out = String::with_capacity(self.sql.len() + self.params.len() * 8);
        let mut params = self.params.iter();
        let mut chars = self.sql.chars();
        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('s') => {
                    let param = params
                        .next()
                        .ok_or_else(|| Error::Internal("ran out of bound parameters".into()))?;
                    out.push_str(&param.to_literal()?);
                }
                Some('%') => out.push('%'),
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            }
        }
        Ok(out)
    }
}

/// Quote an identifier with double quotes, doubling embedded quotes. A
/// percent sign is escaped so it is not read as a placeholder.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\"").replace('%', "%%"))
}

/// Quote a string literal with single quotes, doubling embedded quotes.
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn value_literal(value: &SeriesValue) -> Result<String> {
    Ok(match value {
        SeriesValue::Integer(v) => v.to_string(),
        SeriesValue::Boolean(true) => "TRUE".to_string(),
        SeriesValue::Boolean(false) => "FALSE".to_string(),
        SeriesValue::Float(v) => float_literal(*v),
        SeriesValue::Decimal(v) => decimal_literal(*v),
        SeriesValue::Date(v) => quote_literal(&value::format_date(*v)?),
        SeriesValue::DateTime(v) => quote_literal(&value::format_datetime(*v)?),
        SeriesValue::DateTimeTz(v) => quote_literal(&value::format_datetime_tz(*v)?),
        SeriesValue::Text(v) => quote_literal(v),
        SeriesValue::Bytes(_) => format!("{}::bytea", quote_literal(&value.to_string())),
    })
}

// Untyped string literals inside ARRAY[...] resolve to text, so temporal
// elements carry an explicit cast.
fn array_element_literal(value: &SeriesValue) -> Result<String> {
    let literal = value_literal(value)?;
    Ok(match value {
        SeriesValue::Date(_) => format!("{literal}::date"),
        SeriesValue::DateTime(_) => format!("{literal}::timestamp"),
        SeriesValue::DateTimeTz(_) => format!("{literal}::timestamptz"),
        _ => literal,
    })
}

fn float_literal(v: f64) -> String {
    if v.is_nan() {
        "'NaN'::float8".to_string()
    } else if v.is_infinite() {
        let sign = if v > 0.0 { "" } else { "-" };
        format!("'{sign}Infinity'::float8")
    } else {
        format!("{v:?}")
    }
}

fn decimal_literal(v: DecimalValue) -> String {
    let text = v.to_string();
    if text.starts_with('-') {
        format!("({text})")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn counts_placeholders_and_skips_escapes() {
        let fragment = SqlFragment::raw("--- %s\nSELECT %s, '100%%', %s");
        assert_eq!(fragment.placeholder_count(), 3);
    }

    #[test]
    fn interpolates_literals_in_order() {
        let fragment = SqlFragment::new(
            "SELECT %s, %s, %s, %s",
            vec![
                SqlParam::Value(SeriesValue::Integer(-4)),
                SqlParam::Value(SeriesValue::from("it's")),
                SqlParam::Null,
                SqlParam::Value(SeriesValue::Date(date!(2024-03-01))),
            ],
        );
        assert_eq!(
            fragment.interpolate().unwrap(),
            "SELECT -4, 'it''s', NULL, '2024-03-01'"
        );
    }

    #[test]
    fn arrays_cast_temporal_elements() {
        let param = SqlParam::Array(vec![
            SeriesValue::Date(date!(2024-01-01)),
            SeriesValue::Date(date!(2024-01-02)),
        ]);
        assert_eq!(
            param.to_literal().unwrap(),
            "ARRAY['2024-01-01'::date, '2024-01-02'::date]"
        );
    }

    #[test]
    fn count_mismatch_is_internal_error() {
        let fragment = SqlFragment::new("SELECT %s, %s", vec![SqlParam::Null]);
        assert!(matches!(fragment.interpolate(), Err(Error::Internal(_))));
    }

    #[test]
    fn negative_decimals_are_parenthesized() {
        let value: DecimalValue = "-1.50".parse().unwrap();
        assert_eq!(SqlParam::Value(value.into()).to_literal().unwrap(), "(-1.50)");
    }

    #[test]
    fn identifiers_double_embedded_quotes() {
        assert_eq!(quote_ident("te\"rm"), "\"te\"\"rm\"");
        assert_eq!(quote_ident("pct%"), "\"pct%%\"");
    }
}
