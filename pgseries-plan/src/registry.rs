//! Static type registry for series column types.
//!
//! Maps each of the ten [`SeriesColumnType`]s to the runtime value kinds it
//! accepts for `start`, `stop`, `step`, and `span`, and provides the inverse
//! lookups used when the caller leaves the output type unspecified.

use pgseries_result::{Error, Result};
use pgseries_types::{
    AutoFieldKind, BaseUnit, SeriesColumnType, SeriesKind, SeriesValue, ValueColumnType, ValueKind,
};

use crate::params::CompositionSource;

const INTEGER_KINDS: &[ValueKind] = &[ValueKind::Integer];
const NUMERIC_KINDS: &[ValueKind] = &[ValueKind::Integer, ValueKind::Decimal];
const DATE_KINDS: &[ValueKind] = &[ValueKind::Date];
const DATETIME_KINDS: &[ValueKind] = &[ValueKind::DateTime, ValueKind::DateTimeTz];
const TEXT_KINDS: &[ValueKind] = &[ValueKind::Text];

/// Accepted runtime kinds for one series column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnTypeDescriptor {
    pub column_type: SeriesColumnType,
    pub start_types: &'static [ValueKind],
    pub stop_types: &'static [ValueKind],
    pub step_types: &'static [ValueKind],
    /// `None` when the column type takes no caller-supplied span. Lookback
    /// ranges accept an interval span but never read it.
    pub span_types: Option<&'static [ValueKind]>,
}

impl ColumnTypeDescriptor {
    const fn new(
        column_type: SeriesColumnType,
        bounds: &'static [ValueKind],
        step: &'static [ValueKind],
        span: Option<&'static [ValueKind]>,
    ) -> Self {
        Self {
            column_type,
            start_types: bounds,
            stop_types: bounds,
            step_types: step,
            span_types: span,
        }
    }

    #[inline]
    pub fn kind(&self) -> SeriesKind {
        self.column_type.kind()
    }

    #[inline]
    pub fn base_unit(&self) -> BaseUnit {
        self.column_type.base_unit()
    }

    #[inline]
    pub fn is_range(&self) -> bool {
        self.column_type.is_range()
    }

    /// Steps for date and datetime series are textual intervals.
    pub fn uses_interval_step(&self) -> bool {
        matches!(self.base_unit(), BaseUnit::Date | BaseUnit::DateTime)
    }
}

static DESCRIPTORS: [ColumnTypeDescriptor; 10] = [
    ColumnTypeDescriptor::new(SeriesColumnType::Integer, INTEGER_KINDS, INTEGER_KINDS, None),
    ColumnTypeDescriptor::new(SeriesColumnType::BigInteger, INTEGER_KINDS, INTEGER_KINDS, None),
    ColumnTypeDescriptor::new(SeriesColumnType::Decimal, NUMERIC_KINDS, NUMERIC_KINDS, None),
    ColumnTypeDescriptor::new(SeriesColumnType::Date, DATE_KINDS, TEXT_KINDS, None),
    ColumnTypeDescriptor::new(SeriesColumnType::DateTime, DATETIME_KINDS, TEXT_KINDS, None),
    ColumnTypeDescriptor::new(
        SeriesColumnType::IntegerRange,
        INTEGER_KINDS,
        INTEGER_KINDS,
        Some(INTEGER_KINDS),
    ),
    ColumnTypeDescriptor::new(
        SeriesColumnType::BigIntegerRange,
        INTEGER_KINDS,
        INTEGER_KINDS,
        Some(INTEGER_KINDS),
    ),
    ColumnTypeDescriptor::new(
        SeriesColumnType::DecimalRange,
        NUMERIC_KINDS,
        NUMERIC_KINDS,
        Some(NUMERIC_KINDS),
    ),
    ColumnTypeDescriptor::new(
        SeriesColumnType::DateRange,
        DATE_KINDS,
        TEXT_KINDS,
        Some(TEXT_KINDS),
    ),
    ColumnTypeDescriptor::new(
        SeriesColumnType::DateTimeRange,
        DATETIME_KINDS,
        TEXT_KINDS,
        Some(TEXT_KINDS),
    ),
];

/// Look up the descriptor of a series column type. Total over the enum.
pub fn resolve(column_type: SeriesColumnType) -> &'static ColumnTypeDescriptor {
    let idx = SeriesColumnType::ALL
        .iter()
        .position(|ty| *ty == column_type)
        .unwrap_or_default();
    &DESCRIPTORS[idx]
}

/// Look up a descriptor by column-type name (`"DateRange"`, `"decimal_range"`,
/// `"IntegerField"`), failing with [`Error::UnsupportedType`] for anything
/// outside the ten registered types.
pub fn resolve_name(name: &str) -> Result<&'static ColumnTypeDescriptor> {
    let column_type: SeriesColumnType = name.parse()?;
    Ok(resolve(column_type))
}

/// Deduce the output column type from the runtime type of `start`. A supplied
/// span selects the range counterpart.
pub fn infer_output_type(start: &SeriesValue, span: Option<&SeriesValue>) -> Result<SeriesColumnType> {
    let kind = if span.is_some() {
        SeriesKind::Range
    } else {
        SeriesKind::Scalar
    };
    let base = match start.kind() {
        ValueKind::Integer => BaseUnit::Integer,
        ValueKind::Decimal => BaseUnit::Decimal,
        ValueKind::Date => BaseUnit::Date,
        ValueKind::DateTime | ValueKind::DateTimeTz => BaseUnit::DateTime,
        ValueKind::Boolean => {
            let family = match kind {
                SeriesKind::Scalar => "standard",
                SeriesKind::Range => "range",
            };
            return Err(Error::UnsupportedType(format!(
                "Boolean is not supported for {family} fields"
            )));
        }
        other => {
            return Err(Error::UnsupportedType(format!(
                "cannot infer a series column type from a {other} start value"
            )));
        }
    };
    Ok(SeriesColumnType::from_parts(base, kind))
}

/// Map a relation's primary-key field kind to the `value` column type.
pub fn value_type_for_primary_key(field_kind: &str) -> Result<ValueColumnType> {
    let kind = match field_kind {
        "AutoField" => AutoFieldKind::AutoField,
        "BigAutoField" => AutoFieldKind::BigAutoField,
        "SmallAutoField" => AutoFieldKind::SmallAutoField,
        "UUIDField" => AutoFieldKind::UUIDField,
        other => {
            return Err(Error::UnsupportedType(format!(
                "primary key field '{other}' cannot be used as a composition value"
            )));
        }
    };
    Ok(ValueColumnType::Auto(kind))
}

/// Map the runtime kind of an iterable element to the `value` column type.
pub fn value_type_for_element(kind: ValueKind) -> ValueColumnType {
    match kind {
        ValueKind::Integer => ValueColumnType::Integer,
        ValueKind::Decimal => ValueColumnType::Decimal,
        ValueKind::Date => ValueColumnType::Date,
        ValueKind::DateTime | ValueKind::DateTimeTz => ValueColumnType::DateTime,
        ValueKind::Text => ValueColumnType::Char,
        ValueKind::Boolean => ValueColumnType::Boolean,
        ValueKind::Float => ValueColumnType::Float,
        ValueKind::Bytes => ValueColumnType::Binary,
    }
}

/// Resolve the `value` column type of a composition source: the relation's
/// primary-key column, or the first element of an iterable.
pub fn infer_composition_value_type(source: &CompositionSource) -> Result<ValueColumnType> {
    match source {
        CompositionSource::Relation(relation) => {
            value_type_for_primary_key(&relation.primary_key().field_kind)
        }
        CompositionSource::Iterable(values) => {
            let first = values.first().ok_or_else(|| {
                Error::InvalidArgumentError(
                    "the iterable used for a Cartesian product must not be empty".into(),
                )
            })?;
            Ok(value_type_for_element(first.kind()))
        }
    }
}
