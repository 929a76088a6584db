//! Runtime input of a single series request.

use std::fmt;
use std::sync::Arc;

use pgseries_result::Result;
use pgseries_types::SeriesValue;

use crate::fragment::{SqlFragment, SqlParam};
use crate::registry::ColumnTypeDescriptor;

/// Primary-key column of a composition relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceKey {
    pub name: String,
    /// Field kind of the key column, e.g. `BigAutoField`.
    pub field_kind: String,
}

/// A relation that can act as the second arm of a Cartesian product.
///
/// Implementors compile a single-column `SELECT` of their primary key,
/// honoring whatever filters they carry.
pub trait SourceRelation: fmt::Debug + Send + Sync {
    fn primary_key(&self) -> SourceKey;

    fn compile_primary_keys(&self) -> Result<SqlFragment>;
}

/// Second arm of a composed series.
#[derive(Debug, Clone)]
pub enum CompositionSource {
    Relation(Arc<dyn SourceRelation>),
    Iterable(Vec<SeriesValue>),
}

impl CompositionSource {
    pub fn is_iterable(&self) -> bool {
        matches!(self, CompositionSource::Iterable(_))
    }
}

/// Validated arguments of one series request. Built once, never mutated.
#[derive(Debug, Clone)]
pub struct SeriesParameters {
    pub start: SeriesValue,
    pub stop: SeriesValue,
    pub step: Option<SeriesValue>,
    /// Span as supplied by the caller.
    pub span: Option<SeriesValue>,
    pub include_id: bool,
    pub composition: Option<CompositionSource>,
}

impl SeriesParameters {
    pub fn new(start: impl Into<SeriesValue>, stop: impl Into<SeriesValue>) -> Self {
        Self {
            start: start.into(),
            stop: stop.into(),
            step: None,
            span: None,
            include_id: false,
            composition: None,
        }
    }

    pub fn with_step(mut self, step: impl Into<SeriesValue>) -> Self {
        self.step = Some(step.into());
        self
    }

    pub fn with_span(mut self, span: impl Into<SeriesValue>) -> Self {
        self.span = Some(span.into());
        self
    }

    pub fn with_include_id(mut self, include_id: bool) -> Self {
        self.include_id = include_id;
        self
    }

    pub fn with_composition(mut self, source: CompositionSource) -> Self {
        self.composition = Some(source);
        self
    }

    /// The step, or integer `1` when none was supplied.
    pub fn step_or_default(&self) -> SeriesValue {
        self.step.clone().unwrap_or(SeriesValue::Integer(1))
    }

    /// The span actually bound: the caller's span, else step-or-1 for range
    /// types, else nothing.
    pub fn effective_span(&self, descriptor: &ColumnTypeDescriptor) -> Option<SeriesValue> {
        match &self.span {
            Some(span) => Some(span.clone()),
            None if descriptor.is_range() => Some(self.step_or_default()),
            None => None,
        }
    }

    /// Parameters the series fragment binds ahead of everything else:
    /// span, start, stop, step-or-1, and the iterable when composing with one.
    pub fn series_params(&self, descriptor: &ColumnTypeDescriptor) -> Vec<SqlParam> {
        let mut params = vec![
            SqlParam::from(self.effective_span(descriptor)),
            SqlParam::Value(self.start.clone()),
            SqlParam::Value(self.stop.clone()),
            SqlParam::Value(self.step_or_default()),
        ];
        if let Some(CompositionSource::Iterable(values)) = &self.composition {
            params.push(SqlParam::Array(values.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::resolve;
    use pgseries_types::SeriesColumnType;

    #[test]
    fn span_defaults_to_step_for_ranges_only() {
        let params = SeriesParameters::new(0, 10).with_step(2);
        assert_eq!(
            params.effective_span(resolve(SeriesColumnType::IntegerRange)),
            Some(SeriesValue::Integer(2))
        );
        assert_eq!(params.effective_span(resolve(SeriesColumnType::Integer)), None);

        let params = SeriesParameters::new(0, 10);
        assert_eq!(
            params.effective_span(resolve(SeriesColumnType::BigIntegerRange)),
            Some(SeriesValue::Integer(1))
        );
    }

    #[test]
    fn series_params_follow_placeholder_order() {
        let params = SeriesParameters::new(1, 3)
            .with_composition(CompositionSource::Iterable(vec!["a".into()]));
        let bound = params.series_params(resolve(SeriesColumnType::Integer));
        assert_eq!(
            bound,
            vec![
                SqlParam::Null,
                SqlParam::Value(SeriesValue::Integer(1)),
                SqlParam::Value(SeriesValue::Integer(3)),
                SqlParam::Value(SeriesValue::Integer(1)),
                SqlParam::Array(vec!["a".into()]),
            ]
        );
    }
}
