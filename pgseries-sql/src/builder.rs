//! Entry point for building series relations.

use std::sync::Arc;

use pgseries_plan::{
    CompositionSource, SeriesParameters, SeriesShapeKey, SourceRelation, get_or_create, registry,
    validation,
};
use pgseries_result::{Error, Result};
use pgseries_types::{DefaultBounds, SeriesColumnType, SeriesValue};
use tracing::debug;

use crate::relation::SeriesRelation;

#[derive(Debug, Clone, Default)]
enum OutputType {
    #[default]
    Inferred,
    Typed(SeriesColumnType),
    Named(String),
}

/// Arguments of one `generate_series` call. Nothing is checked until
/// [`GenerateSeries::build`].
#[derive(Debug, Clone)]
pub struct GenerateSeries {
    start: SeriesValue,
    stop: SeriesValue,
    step: Option<SeriesValue>,
    span: Option<SeriesValue>,
    output_type: OutputType,
    include_id: bool,
    precision: Option<u8>,
    scale: Option<u8>,
    default_bounds: Option<String>,
    relation: Option<Arc<dyn SourceRelation>>,
    iterable: Option<Vec<SeriesValue>>,
}

/// Start a series from `start` to `stop`, both inclusive.
pub fn generate_series(start: impl Into<SeriesValue>, stop: impl Into<SeriesValue>) -> GenerateSeries {
    GenerateSeries {
        start: start.into(),
        stop: stop.into(),
        step: None,
        span: None,
        output_type: OutputType::Inferred,
        include_id: false,
        precision: None,
        scale: None,
        default_bounds: None,
        relation: None,
        iterable: None,
    }
}

impl GenerateSeries {
    /// A number, or interval text such as `"3 days"`.
    pub fn step(mut self, step: impl Into<SeriesValue>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Width of each range. Also selects a range output type when none is
    /// given explicitly.
    pub fn span(mut self, span: impl Into<SeriesValue>) -> Self {
        self.span = Some(span.into());
        self
    }

    pub fn output_type(mut self, output_type: SeriesColumnType) -> Self {
        self.output_type = OutputType::Typed(output_type);
        self
    }

    /// Output type by name, e.g. `"DateRange"` or `"BigIntegerField"`.
    pub fn output_type_name(mut self, name: &str) -> Self {
        self.output_type = OutputType::Named(name.to_string());
        self
    }

    pub fn include_id(mut self, include_id: bool) -> Self {
        self.include_id = include_id;
        self
    }

    pub fn precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn default_bounds(mut self, bounds: &str) -> Self {
        self.default_bounds = Some(bounds.to_string());
        self
    }

    /// Cross the series with the primary keys of `relation`.
    pub fn relation(mut self, relation: Arc<dyn SourceRelation>) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Cross the series with a list of values.
    pub fn iterable(mut self, values: Vec<SeriesValue>) -> Self {
        self.iterable = Some(values);
        self
    }

    pub fn build(self) -> Result<SeriesRelation> {
        let composition = match (self.relation, self.iterable) {
            (Some(_), Some(_)) => {
                return Err(Error::InvalidArgumentError(
                    "Cannot provide both a queryset and an iterable for Cartesian product".into(),
                ));
            }
            (Some(relation), None) => Some(CompositionSource::Relation(relation)),
            (None, Some(values)) => Some(CompositionSource::Iterable(values)),
            (None, None) => None,
        };

        let output_type = match &self.output_type {
            OutputType::Typed(ty) => *ty,
            OutputType::Named(name) => registry::resolve_name(name)?.column_type,
            OutputType::Inferred => registry::infer_output_type(&self.start, self.span.as_ref())?,
        };

        let default_bounds = self
            .default_bounds
            .as_deref()
            .map(str::parse::<DefaultBounds>)
            .transpose()?;

        let key = SeriesShapeKey::new(
            output_type,
            self.include_id,
            self.precision,
            self.scale,
            default_bounds,
            composition.as_ref(),
        )?;

        let params = SeriesParameters {
            start: self.start,
            stop: self.stop,
            step: self.step,
            span: self.span,
            include_id: self.include_id,
            composition,
        };
        validation::validate(&params, registry::resolve(output_type))?;

        // Only valid requests reach the process-wide cache.
        let descriptor = get_or_create(&key)?;

        debug!(relation = %descriptor.name, "built series relation");
        Ok(SeriesRelation::new(descriptor, output_type, params))
    }
}
