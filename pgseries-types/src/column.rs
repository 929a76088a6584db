//! Column-type tags for series relations.
//!
//! [`SeriesColumnType`] enumerates the ten column types a generated series can
//! produce as its `term` column. [`ValueColumnType`] covers the `value`
//! column of a composed series and [`AutoFieldKind`] the identity column.

use std::fmt;
use std::str::FromStr;

use pgseries_result::{Error, Result};

/// Whether a series column holds scalar values or native ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
    Scalar,
    Range,
}

/// Underlying element type of a series column, shared by the scalar and
/// range variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseUnit {
    Integer,
    BigInteger,
    Decimal,
    Date,
    DateTime,
}

/// Output column types supported for the `term` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesColumnType {
    Integer,
    BigInteger,
    Decimal,
    Date,
    DateTime,
    IntegerRange,
    BigIntegerRange,
    DecimalRange,
    DateRange,
    DateTimeRange,
}

impl SeriesColumnType {
    pub const ALL: [SeriesColumnType; 10] = [
        SeriesColumnType::Integer,
        SeriesColumnType::BigInteger,
        SeriesColumnType::Decimal,
        SeriesColumnType::Date,
        SeriesColumnType::DateTime,
        SeriesColumnType::IntegerRange,
        SeriesColumnType::BigIntegerRange,
        SeriesColumnType::DecimalRange,
        SeriesColumnType::DateRange,
        SeriesColumnType::DateTimeRange,
    ];

    pub fn kind(self) -> SeriesKind {
        match self {
            SeriesColumnType::Integer
            | SeriesColumnType::BigInteger
            | SeriesColumnType::Decimal
            | SeriesColumnType::Date
            | SeriesColumnType::DateTime => SeriesKind::Scalar,
            _ => SeriesKind::Range,
        }
    }

    pub fn is_range(self) -> bool {
        self.kind() == SeriesKind::Range
    }

    pub fn base_unit(self) -> BaseUnit {
        match self {
            SeriesColumnType::Integer | SeriesColumnType::IntegerRange => BaseUnit::Integer,
            SeriesColumnType::BigInteger | SeriesColumnType::BigIntegerRange => {
                BaseUnit::BigInteger
            }
            SeriesColumnType::Decimal | SeriesColumnType::DecimalRange => BaseUnit::Decimal,
            SeriesColumnType::Date | SeriesColumnType::DateRange => BaseUnit::Date,
            SeriesColumnType::DateTime | SeriesColumnType::DateTimeRange => BaseUnit::DateTime,
        }
    }

    /// Build the column type from its base unit and kind.
    pub fn from_parts(base: BaseUnit, kind: SeriesKind) -> Self {
        match (base, kind) {
            (BaseUnit::Integer, SeriesKind::Scalar) => SeriesColumnType::Integer,
            (BaseUnit::BigInteger, SeriesKind::Scalar) => SeriesColumnType::BigInteger,
            (BaseUnit::Decimal, SeriesKind::Scalar) => SeriesColumnType::Decimal,
            (BaseUnit::Date, SeriesKind::Scalar) => SeriesColumnType::Date,
            (BaseUnit::DateTime, SeriesKind::Scalar) => SeriesColumnType::DateTime,
            (BaseUnit::Integer, SeriesKind::Range) => SeriesColumnType::IntegerRange,
            (BaseUnit::BigInteger, SeriesKind::Range) => SeriesColumnType::BigIntegerRange,
            (BaseUnit::Decimal, SeriesKind::Range) => SeriesColumnType::DecimalRange,
            (BaseUnit::Date, SeriesKind::Range) => SeriesColumnType::DateRange,
            (BaseUnit::DateTime, SeriesKind::Range) => SeriesColumnType::DateTimeRange,
        }
    }

    /// Name used when synthesizing relation names, e.g. `IntegerRange`.
    pub fn name(self) -> &'static str {
        match self {
            SeriesColumnType::Integer => "Integer",
            SeriesColumnType::BigInteger => "BigInteger",
            SeriesColumnType::Decimal => "Decimal",
            SeriesColumnType::Date => "Date",
            SeriesColumnType::DateTime => "DateTime",
            SeriesColumnType::IntegerRange => "IntegerRange",
            SeriesColumnType::BigIntegerRange => "BigIntegerRange",
            SeriesColumnType::DecimalRange => "DecimalRange",
            SeriesColumnType::DateRange => "DateRange",
            SeriesColumnType::DateTimeRange => "DateTimeRange",
        }
    }

    /// Native PostgreSQL type of the column.
    pub fn pg_type(self) -> &'static str {
        match self {
            SeriesColumnType::Integer => "integer",
            SeriesColumnType::BigInteger => "bigint",
            SeriesColumnType::Decimal => "numeric",
            SeriesColumnType::Date => "date",
            SeriesColumnType::DateTime => "timestamp with time zone",
            SeriesColumnType::IntegerRange => "int4range",
            SeriesColumnType::BigIntegerRange => "int8range",
            SeriesColumnType::DecimalRange => "numrange",
            SeriesColumnType::DateRange => "daterange",
            SeriesColumnType::DateTimeRange => "tstzrange",
        }
    }

    /// Continuous range types honor a default-bounds setting; discrete ranges
    /// are always canonicalized to `[)` by the database.
    pub fn supports_default_bounds(self) -> bool {
        matches!(
            self,
            SeriesColumnType::DecimalRange | SeriesColumnType::DateTimeRange
        )
    }
}

impl fmt::Display for SeriesColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SeriesColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        let normalized = normalized.trim_end_matches("field");
        SeriesColumnType::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| Error::UnsupportedType(format!("'{s}' is not a series column type")))
    }
}

/// Identity column flavours, mirroring the primary-key field kinds an ORM
/// model can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AutoFieldKind {
    #[default]
    AutoField,
    BigAutoField,
    SmallAutoField,
    UUIDField,
}

impl AutoFieldKind {
    pub fn name(self) -> &'static str {
        match self {
            AutoFieldKind::AutoField => "AutoField",
            AutoFieldKind::BigAutoField => "BigAutoField",
            AutoFieldKind::SmallAutoField => "SmallAutoField",
            AutoFieldKind::UUIDField => "UUIDField",
        }
    }

    pub fn pg_type(self) -> &'static str {
        match self {
            AutoFieldKind::AutoField => "integer",
            AutoFieldKind::BigAutoField => "bigint",
            AutoFieldKind::SmallAutoField => "smallint",
            AutoFieldKind::UUIDField => "uuid",
        }
    }
}

impl FromStr for AutoFieldKind {
    type Err = Error;

    /// Accepts bare names (`BigAutoField`) and dotted paths ending in one
    /// (`django.db.models.BigAutoField`).
    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().rsplit('.').next().unwrap_or_default();
        match name {
            "AutoField" => Ok(AutoFieldKind::AutoField),
            "BigAutoField" => Ok(AutoFieldKind::BigAutoField),
            "SmallAutoField" => Ok(AutoFieldKind::SmallAutoField),
            "UUIDField" => Ok(AutoFieldKind::UUIDField),
            _ => Err(Error::Config(format!(
                "the default auto field '{s}' could not be resolved; expected one of \
                 AutoField, BigAutoField, SmallAutoField, UUIDField"
            ))),
        }
    }
}

/// Column types of the `value` column produced by composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueColumnType {
    Auto(AutoFieldKind),
    Integer,
    Decimal,
    Date,
    DateTime,
    Char,
    Boolean,
    Float,
    Binary,
}

impl ValueColumnType {
    pub fn name(self) -> &'static str {
        match self {
            ValueColumnType::Auto(kind) => kind.name(),
            ValueColumnType::Integer => "Integer",
            ValueColumnType::Decimal => "Decimal",
            ValueColumnType::Date => "Date",
            ValueColumnType::DateTime => "DateTime",
            ValueColumnType::Char => "Char",
            ValueColumnType::Boolean => "Boolean",
            ValueColumnType::Float => "Float",
            ValueColumnType::Binary => "Binary",
        }
    }

    pub fn pg_type(self) -> &'static str {
        match self {
            ValueColumnType::Auto(kind) => kind.pg_type(),
            ValueColumnType::Integer => "bigint",
            ValueColumnType::Decimal => "numeric",
            ValueColumnType::Date => "date",
            ValueColumnType::DateTime => "timestamp with time zone",
            ValueColumnType::Char => "text",
            ValueColumnType::Boolean => "boolean",
            ValueColumnType::Float => "double precision",
            ValueColumnType::Binary => "bytea",
        }
    }
}

/// Default bounds of a range column, one of the four two-character notations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultBounds {
    /// `[]`
    Inclusive,
    /// `()`
    Exclusive,
    /// `[)`
    LowerInclusive,
    /// `(]`
    UpperInclusive,
}

impl DefaultBounds {
    pub fn as_str(self) -> &'static str {
        match self {
            DefaultBounds::Inclusive => "[]",
            DefaultBounds::Exclusive => "()",
            DefaultBounds::LowerInclusive => "[)",
            DefaultBounds::UpperInclusive => "(]",
        }
    }

    /// Identifier-safe spelling: `I` for an inclusive bracket, `E` for an
    /// exclusive parenthesis.
    pub fn name_code(self) -> &'static str {
        match self {
            DefaultBounds::Inclusive => "II",
            DefaultBounds::Exclusive => "EE",
            DefaultBounds::LowerInclusive => "IE",
            DefaultBounds::UpperInclusive => "EI",
        }
    }
}

impl FromStr for DefaultBounds {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "[]" => Ok(DefaultBounds::Inclusive),
            "()" => Ok(DefaultBounds::Exclusive),
            "[)" => Ok(DefaultBounds::LowerInclusive),
            "(]" => Ok(DefaultBounds::UpperInclusive),
            _ => Err(Error::InvalidArgumentError(format!(
                "Value of default_bounds must be one of: '[]', '()', '[)', '(]' (got '{s}')"
            ))),
        }
    }
}

impl fmt::Display for DefaultBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_types_round_trip_through_parts() {
        for ty in SeriesColumnType::ALL {
            assert_eq!(SeriesColumnType::from_parts(ty.base_unit(), ty.kind()), ty);
        }
    }

    #[test]
    fn column_types_parse_from_field_names() {
        assert_eq!(
            "DateTimeRangeField".parse::<SeriesColumnType>().unwrap(),
            SeriesColumnType::DateTimeRange
        );
        assert_eq!(
            "big_integer".parse::<SeriesColumnType>().unwrap(),
            SeriesColumnType::BigInteger
        );
        assert!(matches!(
            "FloatField".parse::<SeriesColumnType>(),
            Err(Error::UnsupportedType(_))
        ));
    }

    #[test]
    fn auto_field_accepts_dotted_paths() {
        assert_eq!(
            "django.db.models.BigAutoField".parse::<AutoFieldKind>().unwrap(),
            AutoFieldKind::BigAutoField
        );
        assert!(matches!(
            "myapp.fields.SnowflakeField".parse::<AutoFieldKind>(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn default_bounds_only_accept_four_notations() {
        for text in ["[]", "()", "[)", "(]"] {
            let bounds: DefaultBounds = text.parse().unwrap();
            assert_eq!(bounds.as_str(), text);
        }
        assert!(matches!(
            "[[".parse::<DefaultBounds>(),
            Err(Error::InvalidArgumentError(_))
        ));
    }
}
