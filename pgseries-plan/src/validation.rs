#![forbid(unsafe_code)]

use std::cmp::Ordering;

use pgseries_result::{Error, Result};
use pgseries_types::{
    BaseUnit, IntervalStep, MAX_DECIMAL_PRECISION, SeriesColumnType, SeriesValue, ValueKind,
};

use crate::params::{CompositionSource, SeriesParameters};
use crate::registry::ColumnTypeDescriptor;

/// Run every check against `params` for the given column type, failing on
/// the first violation.
///
/// The order is fixed: ordering, identical start/stop types, accepted
/// start/stop types, accepted step type, mandatory step for non-integer
/// series, textual interval shape. The remaining checks (positive step and
/// span, span type, int4 bounds, composition iterable) follow.
pub fn validate(params: &SeriesParameters, descriptor: &ColumnTypeDescriptor) -> Result<()> {
    ensure_ordered(&params.start, &params.stop)?;
    ensure_same_kind(&params.start, &params.stop)?;
    ensure_accepted("Start", &params.start, descriptor.start_types)?;
    ensure_accepted("Stop", &params.stop, descriptor.stop_types)?;
    if let Some(step) = &params.step {
        ensure_accepted("Step", step, descriptor.step_types)?;
    }
    if params.step.is_none() && params.start.kind() != ValueKind::Integer {
        return Err(Error::InvalidArgumentError(
            "Step must be provided for non-integer series".into(),
        ));
    }
    if let Some(SeriesValue::Text(text)) = &params.step {
        IntervalStep::parse(text)?;
    }

    if let Some(step) = &params.step {
        ensure_positive("Step", step)?;
    }
    if let Some(span) = &params.span {
        let Some(span_types) = descriptor.span_types else {
            return Err(Error::InvalidArgumentError(format!(
                "Span is not supported for {} series",
                descriptor.column_type
            )));
        };
        ensure_accepted("Span", span, span_types)?;
        ensure_positive("Span", span)?;
        if let SeriesValue::Text(text) = span {
            IntervalStep::parse(text)?;
        }
    }
    if descriptor.base_unit() == BaseUnit::Integer {
        ensure_int4("start", &params.start)?;
        ensure_int4("stop", &params.stop)?;
        if let Some(step) = &params.step {
            ensure_int4("step", step)?;
        }
        if let Some(span) = &params.span {
            ensure_int4("span", span)?;
        }
    }
    if let Some(CompositionSource::Iterable(values)) = &params.composition {
        ensure_homogeneous_iterable(values)?;
    }
    Ok(())
}

/// Ensure `start <= stop` whenever the two values are comparable.
pub fn ensure_ordered(start: &SeriesValue, stop: &SeriesValue) -> Result<()> {
    if start.compare(stop) == Some(Ordering::Greater) {
        return Err(Error::InvalidArgumentError(
            "Start value must be smaller or equal to stop value".into(),
        ));
    }
    Ok(())
}

pub fn ensure_same_kind(start: &SeriesValue, stop: &SeriesValue) -> Result<()> {
    if start.kind() != stop.kind() {
        return Err(Error::InvalidArgumentError(format!(
            "Start and stop values must be of the same type (got {} and {})",
            start.kind(),
            stop.kind()
        )));
    }
    Ok(())
}

/// Ensure the runtime kind of `value` is one of `accepted`.
pub fn ensure_accepted(label: &str, value: &SeriesValue, accepted: &[ValueKind]) -> Result<()> {
    if !accepted.contains(&value.kind()) {
        let names: Vec<&str> = accepted.iter().map(|kind| kind.name()).collect();
        return Err(Error::InvalidArgumentError(format!(
            "{label} type of [{}] expected, but received type {}",
            names.join(", "),
            value.kind()
        )));
    }
    Ok(())
}

/// Numeric steps and spans must be strictly positive. Textual steps are
/// checked by [`IntervalStep::parse`].
pub fn ensure_positive(label: &str, value: &SeriesValue) -> Result<()> {
    if value.is_positive_number() == Some(false) {
        return Err(Error::InvalidArgumentError(format!(
            "{label} value must be greater than zero (got {value})"
        )));
    }
    Ok(())
}

/// `integer` columns are 32-bit in PostgreSQL.
pub fn ensure_int4(label: &str, value: &SeriesValue) -> Result<()> {
    if let Some(v) = value.as_integer()
        && i32::try_from(v).is_err()
    {
        return Err(Error::InvalidArgumentError(format!(
            "{label} value {v} is out of range for an integer series; use a big integer series"
        )));
    }
    Ok(())
}

/// Composition iterables must be non-empty and hold a single element kind.
pub fn ensure_homogeneous_iterable(values: &[SeriesValue]) -> Result<()> {
    let Some(first) = values.first() else {
        return Err(Error::InvalidArgumentError(
            "the iterable used for a Cartesian product must not be empty".into(),
        ));
    };
    let kind = first.kind();
    if let Some(other) = values.iter().find(|value| value.kind() != kind) {
        return Err(Error::InvalidArgumentError(format!(
            "iterable elements must share one type: found {} after {}",
            other.kind(),
            kind
        )));
    }
    Ok(())
}

/// Precision and scale only apply to decimal column types, and the scale may
/// not exceed the precision.
pub fn ensure_decimal_shape(
    column_type: SeriesColumnType,
    precision: Option<u8>,
    scale: Option<u8>,
) -> Result<()> {
    if precision.is_none() && scale.is_none() {
        return Ok(());
    }
    if column_type.base_unit() != BaseUnit::Decimal {
        return Err(Error::InvalidArgumentError(format!(
            "precision and scale only apply to decimal series, not {column_type}"
        )));
    }
    if let Some(p) = precision
        && (p == 0 || p > MAX_DECIMAL_PRECISION)
    {
        return Err(Error::InvalidArgumentError(format!(
            "precision must be between 1 and {MAX_DECIMAL_PRECISION} (got {p})"
        )));
    }
    if let (Some(p), Some(s)) = (precision, scale)
        && s > p
    {
        return Err(Error::InvalidArgumentError(format!(
            "scale {s} cannot exceed precision {p}"
        )));
    }
    Ok(())
}
