//! In-process evaluation of a series.
//!
//! Produces the rows the database would return for the rendered SQL:
//! inclusive scalar series, `[previous, current)` lookback ranges for dates
//! and datetimes, `[a, a + span)` numeric ranges, 1-based identity ordinals,
//! and the Cartesian product with an iterable.

use std::fmt;

use pgseries_result::{Error, Result};
use pgseries_types::{
    BaseUnit, DecimalValue, IntervalStep, IntervalValue, SeriesColumnType, SeriesValue,
};
use time::{Date, Duration, Month, PrimitiveDateTime};

use crate::params::{CompositionSource, SeriesParameters};
use crate::registry;
use crate::schema::SeriesRelationDescriptor;

/// Upper bound on rows produced locally.
pub const MAX_MATERIALIZED_ROWS: usize = 1_000_000;

/// The `term` of one row.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesTerm {
    Scalar(SeriesValue),
    /// Half-open `[lower, upper)` range.
    Range {
        lower: SeriesValue,
        upper: SeriesValue,
    },
}

impl SeriesTerm {
    pub fn as_scalar(&self) -> Option<&SeriesValue> {
        match self {
            SeriesTerm::Scalar(v) => Some(v),
            SeriesTerm::Range { .. } => None,
        }
    }

    pub fn bounds(&self) -> Option<(&SeriesValue, &SeriesValue)> {
        match self {
            SeriesTerm::Range { lower, upper } => Some((lower, upper)),
            SeriesTerm::Scalar(_) => None,
        }
    }
}

impl fmt::Display for SeriesTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesTerm::Scalar(v) => write!(f, "{v}"),
            SeriesTerm::Range { lower, upper } => write!(f, "[{lower},{upper})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub id: Option<i64>,
    pub term: SeriesTerm,
    pub value: Option<SeriesValue>,
}

impl SeriesParameters {
    /// Evaluate the series locally for the given relation shape.
    pub fn materialize(&self, descriptor: &SeriesRelationDescriptor) -> Result<Vec<SeriesRow>> {
        materialize(descriptor.output_type, self)
    }
}

/// Evaluate `params` as a series of `column_type`.
pub fn materialize(column_type: SeriesColumnType, params: &SeriesParameters) -> Result<Vec<SeriesRow>> {
    let descriptor = registry::resolve(column_type);
    let scalars = scalar_series(column_type.base_unit(), params)?;

    let terms: Vec<SeriesTerm> = match column_type {
        SeriesColumnType::DateRange | SeriesColumnType::DateTimeRange => scalars
            .windows(2)
            .map(|pair| SeriesTerm::Range {
                lower: pair[0].clone(),
                upper: pair[1].clone(),
            })
            .collect(),
        ty if ty.is_range() => {
            let span = params
                .effective_span(descriptor)
                .unwrap_or(SeriesValue::Integer(1));
            scalars
                .into_iter()
                .map(|lower| {
                    let upper = add_numeric(&lower, &span)?;
                    Ok(SeriesTerm::Range { lower, upper })
                })
                .collect::<Result<_>>()?
        }
        _ => scalars.into_iter().map(SeriesTerm::Scalar).collect(),
    };

    let rows = terms.into_iter().enumerate().map(|(idx, term)| SeriesRow {
        id: params.include_id.then_some(idx as i64 + 1),
        term,
        value: None,
    });

    match &params.composition {
        None => Ok(rows.collect()),
        Some(CompositionSource::Iterable(values)) => {
            let rows: Vec<SeriesRow> = rows.collect();
            if rows.len().saturating_mul(values.len()) > MAX_MATERIALIZED_ROWS {
                return Err(too_many_rows());
            }
            Ok(rows
                .iter()
                .flat_map(|row| {
                    values.iter().map(move |value| SeriesRow {
                        value: Some(value.clone()),
                        ..row.clone()
                    })
                })
                .collect())
        }
        Some(CompositionSource::Relation(_)) => Err(Error::InvalidArgumentError(
            "a series composed with a relation can only be evaluated by the database".into(),
        )),
    }
}

fn scalar_series(base: BaseUnit, params: &SeriesParameters) -> Result<Vec<SeriesValue>> {
    match base {
        BaseUnit::Integer | BaseUnit::BigInteger => {
            let (start, stop, step) = integer_args(params)?;
            let mut out = Vec::new();
            let mut current = Some(start);
            while let Some(v) = current
                && v <= stop
            {
                push_checked(&mut out, SeriesValue::Integer(v))?;
                current = v.checked_add(step);
            }
            Ok(out)
        }
        BaseUnit::Decimal => {
            let start = decimal_arg("start", &params.start)?;
            let stop = decimal_arg("stop", &params.stop)?;
            let step = decimal_arg("step", &params.step_or_default())?;
            let mut out = Vec::new();
            let mut current = Some(start);
            while let Some(v) = current
                && v <= stop
            {
                push_checked(&mut out, SeriesValue::Decimal(v))?;
                current = v.checked_add(step).ok();
            }
            Ok(out)
        }
        BaseUnit::Date => {
            let (SeriesValue::Date(start), SeriesValue::Date(stop)) = (&params.start, &params.stop)
            else {
                return Err(mismatch("date"));
            };
            let interval = interval_arg(params)?;
            let stop = stop.midnight();
            let mut out = Vec::new();
            let mut current = Some(start.midnight());
            while let Some(v) = current
                && v <= stop
            {
                push_checked(&mut out, SeriesValue::Date(v.date()))?;
                current = add_interval(v, interval).ok();
            }
            Ok(out)
        }
        BaseUnit::DateTime => {
            let interval = interval_arg(params)?;
            let (start, stop, offset) = match (&params.start, &params.stop) {
                (SeriesValue::DateTime(a), SeriesValue::DateTime(b)) => (*a, *b, None),
                (SeriesValue::DateTimeTz(a), SeriesValue::DateTimeTz(b)) => {
                    let b = b.to_offset(a.offset());
                    (
                        PrimitiveDateTime::new(a.date(), a.time()),
                        PrimitiveDateTime::new(b.date(), b.time()),
                        Some(a.offset()),
                    )
                }
                _ => return Err(mismatch("datetime")),
            };
            let wrap = |v: PrimitiveDateTime| match offset {
                Some(offset) => SeriesValue::DateTimeTz(v.assume_offset(offset)),
                None => SeriesValue::DateTime(v),
            };
            let mut out = Vec::new();
            let mut current = Some(start);
            while let Some(v) = current
                && v <= stop
            {
                push_checked(&mut out, wrap(v))?;
                current = add_interval(v, interval).ok();
            }
            Ok(out)
        }
    }
}

fn integer_args(params: &SeriesParameters) -> Result<(i64, i64, i64)> {
    let start = params.start.as_integer().ok_or_else(|| mismatch("integer"))?;
    let stop = params.stop.as_integer().ok_or_else(|| mismatch("integer"))?;
    let step = params
        .step_or_default()
        .as_integer()
        .ok_or_else(|| mismatch("integer"))?;
    if step <= 0 {
        return Err(Error::InvalidArgumentError(format!(
            "Step value must be greater than zero (got {step})"
        )));
    }
    Ok((start, stop, step))
}

fn decimal_arg(label: &str, value: &SeriesValue) -> Result<DecimalValue> {
    let decimal = value
        .as_decimal()
        .ok_or_else(|| Error::InvalidArgumentError(format!("{label} must be numeric")))?;
    if label == "step" && !decimal.is_positive() {
        return Err(Error::InvalidArgumentError(format!(
            "Step value must be greater than zero (got {decimal})"
        )));
    }
    Ok(decimal)
}

fn interval_arg(params: &SeriesParameters) -> Result<IntervalValue> {
    let text = params
        .step
        .as_ref()
        .and_then(SeriesValue::as_text)
        .ok_or_else(|| {
            Error::InvalidArgumentError("Step must be provided for non-integer series".into())
        })?;
    let interval = IntervalStep::parse(text)?.to_interval_value()?;
    if interval.is_zero() {
        return Err(Error::InvalidIntervalValue(format!(
            "interval '{text}' is too small to advance the series"
        )));
    }
    Ok(interval)
}

fn add_numeric(lower: &SeriesValue, span: &SeriesValue) -> Result<SeriesValue> {
    match (lower, span) {
        (SeriesValue::Integer(a), SeriesValue::Integer(b)) => a
            .checked_add(*b)
            .map(SeriesValue::Integer)
            .ok_or_else(|| Error::InvalidArgumentError("range upper bound overflows".into())),
        _ => {
            let a = decimal_arg("lower bound", lower)?;
            let b = decimal_arg("span", span)?;
            a.checked_add(b)
                .map(SeriesValue::Decimal)
                .map_err(Error::invalid_argument)
        }
    }
}

/// Add a months/days/nanos interval the way PostgreSQL does: calendar months
/// first (clamping the day), then days, then the sub-day remainder.
pub fn add_interval(value: PrimitiveDateTime, interval: IntervalValue) -> Result<PrimitiveDateTime> {
    let date = add_months(value.date(), interval.months)?;
    let shifted = PrimitiveDateTime::new(date, value.time());
    shifted
        .checked_add(Duration::days(i64::from(interval.days)))
        .and_then(|v| v.checked_add(Duration::nanoseconds(interval.nanos)))
        .ok_or_else(|| Error::InvalidArgumentError("datetime overflow while applying interval".into()))
}

fn add_months(date: Date, months_delta: i32) -> Result<Date> {
    if months_delta == 0 {
        return Ok(date);
    }
    let base_index = i64::from(date.year()) * 12 + i64::from(date.month() as u8) - 1;
    let target_index = base_index + i64::from(months_delta);
    let new_year = i32::try_from(target_index.div_euclid(12)).map_err(|_| {
        Error::InvalidArgumentError("resulting date year out of range after month arithmetic".into())
    })?;
    let new_month = Month::try_from(target_index.rem_euclid(12) as u8 + 1)
        .map_err(|err| Error::Internal(format!("invalid month after month arithmetic: {err}")))?;
    let new_day = date.day().min(new_month.length(new_year));
    Date::from_calendar_date(new_year, new_month, new_day).map_err(|err| {
        Error::InvalidArgumentError(format!(
            "resulting date is invalid after month arithmetic: {err}"
        ))
    })
}

fn push_checked(out: &mut Vec<SeriesValue>, value: SeriesValue) -> Result<()> {
    if out.len() >= MAX_MATERIALIZED_ROWS {
        return Err(too_many_rows());
    }
    out.push(value);
    Ok(())
}

fn too_many_rows() -> Error {
    Error::InvalidArgumentError(format!(
        "series exceeds {MAX_MATERIALIZED_ROWS} rows and cannot be evaluated locally"
    ))
}

fn mismatch(expected: &str) -> Error {
    Error::InvalidArgumentError(format!("start and stop must both be {expected} values"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn month_arithmetic_clamps_to_month_end() {
        assert_eq!(add_months(date!(2024-01-31), 1).unwrap(), date!(2024-02-29));
        assert_eq!(add_months(date!(2023-01-31), 1).unwrap(), date!(2023-02-28));
        assert_eq!(add_months(date!(2024-11-15), 3).unwrap(), date!(2025-02-15));
    }

    #[test]
    fn intervals_apply_months_then_days_then_nanos() {
        let step = IntervalStep::parse("1.5 days").unwrap().to_interval_value().unwrap();
        assert_eq!(
            add_interval(datetime!(2024-01-01 0:00), step).unwrap(),
            datetime!(2024-01-02 12:00)
        );
        let step = IntervalStep::parse("1 months").unwrap().to_interval_value().unwrap();
        assert_eq!(
            add_interval(datetime!(2024-01-31 6:00), step).unwrap(),
            datetime!(2024-02-29 6:00)
        );
    }

    #[test]
    fn repeated_month_steps_drift_like_the_database() {
        let params = SeriesParameters::new(
            SeriesValue::Date(date!(2024-01-31)),
            SeriesValue::Date(date!(2024-04-30)),
        )
        .with_step("1 months");
        let rows = materialize(SeriesColumnType::Date, &params).unwrap();
        let terms: Vec<String> = rows.iter().map(|r| r.term.to_string()).collect();
        assert_eq!(terms, ["2024-01-31", "2024-02-29", "2024-03-29", "2024-04-29"]);
    }

    #[test]
    fn relation_composition_cannot_be_materialized() {
        #[derive(Debug)]
        struct Keys;
        impl crate::params::SourceRelation for Keys {
            fn primary_key(&self) -> crate::params::SourceKey {
                crate::params::SourceKey {
                    name: "id".into(),
                    field_kind: "AutoField".into(),
                }
            }
            fn compile_primary_keys(&self) -> Result<crate::fragment::SqlFragment> {
                Ok(crate::fragment::SqlFragment::raw("SELECT 1"))
            }
        }
        let params = SeriesParameters::new(0, 3)
            .with_composition(CompositionSource::Relation(std::sync::Arc::new(Keys)));
        assert!(matches!(
            materialize(SeriesColumnType::Integer, &params),
            Err(Error::InvalidArgumentError(_))
        ));
    }
}
