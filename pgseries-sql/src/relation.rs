//! Read-only relation over a generated series.

use std::fmt;
use std::sync::Arc;

use pgseries_plan::fragment::quote_ident;
use pgseries_plan::schema::TERM_COLUMN;
use pgseries_plan::{SeriesParameters, SeriesRelationDescriptor, SeriesRow, SqlFragment};
use pgseries_result::{Error, Result};
use pgseries_types::SeriesColumnType;

use crate::compiler::{
    FromClauseCompiler, OrderBy, QueryState, SelectCompiler, SelectList, SeriesFromClause,
    SeriesSource, TableFrom,
};
use crate::predicate::{ColumnCatalog, Predicate};

/// Aggregate functions a series relation can compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Min,
    Max,
    Avg,
    Count,
}

impl Aggregate {
    fn function(self) -> &'static str {
        match self {
            Aggregate::Sum => "SUM",
            Aggregate::Min => "MIN",
            Aggregate::Max => "MAX",
            Aggregate::Avg => "AVG",
            Aggregate::Count => "COUNT",
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Aggregate::Sum => "sum",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Avg => "avg",
            Aggregate::Count => "count",
        }
    }
}

/// A queryable series.
///
/// Every operation returns a new relation; there are no inserts, updates or
/// deletes. Each compile renders the series fragment afresh, so one relation
/// can be compiled for a count and then for a fetch with the right
/// parameters both times.
#[derive(Clone)]
pub struct SeriesRelation {
    descriptor: Arc<SeriesRelationDescriptor>,
    from: SeriesFromClause,
    state: QueryState,
}

impl fmt::Debug for SeriesRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesRelation")
            .field("name", &self.descriptor.name)
            .field("state", &self.state)
            .finish()
    }
}

impl SeriesRelation {
    pub(crate) fn new(
        descriptor: Arc<SeriesRelationDescriptor>,
        column_type: SeriesColumnType,
        params: SeriesParameters,
    ) -> Self {
        let from = SeriesFromClause::new(
            TableFrom::new(descriptor.alias.clone()),
            Arc::new(SeriesSource {
                column_type,
                params,
            }),
        );
        Self {
            descriptor,
            from,
            state: QueryState::default(),
        }
    }

    pub fn descriptor(&self) -> &Arc<SeriesRelationDescriptor> {
        &self.descriptor
    }

    pub fn params(&self) -> &SeriesParameters {
        &self.from.source().params
    }

    pub fn output_type(&self) -> SeriesColumnType {
        self.from.source().column_type
    }

    pub fn alias(&self) -> &str {
        self.from.alias()
    }

    pub fn state(&self) -> &QueryState {
        &self.state
    }

    pub fn filter(&self, predicate: Predicate) -> Self {
        let mut next = self.clone();
        next.state.filters.push(predicate);
        next
    }

    pub fn exclude(&self, predicate: Predicate) -> Self {
        self.filter(Predicate::Not(Box::new(predicate)))
    }

    /// Replace the ordering. A leading `-` sorts descending.
    pub fn order_by<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self> {
        let ordering: Vec<OrderBy> = columns.iter().map(|c| OrderBy::parse(c.as_ref())).collect();
        for order in &ordering {
            self.ensure_column(&order.column)?;
        }
        let mut next = self.clone();
        next.state.ordering = ordering;
        Ok(next)
    }

    /// Restrict the selected columns.
    pub fn values<S: AsRef<str>>(&self, columns: &[S]) -> Result<Self> {
        let mut projection = Vec::with_capacity(columns.len());
        for column in columns {
            let column = self.ensure_column(column.as_ref())?;
            projection.push(column);
        }
        let mut next = self.clone();
        next.state.projection = Some(projection);
        Ok(next)
    }

    /// Keep rows `offset..offset + limit`. Slicing a sliced relation narrows
    /// the existing window.
    pub fn slice(&self, offset: u64, limit: Option<u64>) -> Self {
        let mut next = self.clone();
        let base = next.state.offset.unwrap_or(0);
        let start = base.saturating_add(offset);
        let remaining = next.state.limit.map(|l| l.saturating_sub(offset));
        next.state.offset = (start > 0).then_some(start);
        next.state.limit = match (remaining, limit) {
            (Some(r), Some(l)) => Some(r.min(l)),
            (r, l) => r.or(l),
        };
        next
    }

    /// Compile the row-fetching statement.
    pub fn compile(&self) -> Result<SqlFragment> {
        let columns = match &self.state.projection {
            Some(projection) => projection.clone(),
            None => self.descriptor.column_names().map(str::to_string).collect(),
        };
        self.compiler().compile(&SelectList::Columns(columns), true)
    }

    /// `SELECT COUNT(*)`, wrapping the sliced statement when a window is set.
    pub fn count(&self) -> Result<SqlFragment> {
        let select = SelectList::Raw(SqlFragment::raw("COUNT(*) AS \"__count\""));
        if !self.state.is_sliced() {
            return self.compiler().compile(&select, false);
        }
        let inner = self.compile()?;
        Ok(SqlFragment::new(
            format!("SELECT COUNT(*) AS \"__count\" FROM ({}) subquery", inner.sql),
            inner.params,
        ))
    }

    /// Compute `function(column)` for each requested pair, aliased
    /// `<column>__<function>`.
    pub fn aggregate(&self, requests: &[(&str, Aggregate)]) -> Result<SqlFragment> {
        if requests.is_empty() {
            return Err(Error::InvalidArgumentError(
                "aggregate() requires at least one expression".into(),
            ));
        }
        let mut resolved = Vec::with_capacity(requests.len());
        for (column, function) in requests {
            let name = self.ensure_column(column)?;
            let is_range = self
                .descriptor
                .column_by_name(&name)
                .is_some_and(|c| c.is_range());
            if is_range && matches!(function, Aggregate::Sum | Aggregate::Avg) {
                return Err(Error::InvalidArgumentError(format!(
                    "{}() is not defined for range column '{name}'",
                    function.function()
                )));
            }
            resolved.push((name, *function));
        }

        let render = |target: &dyn Fn(&str) -> String| {
            resolved
                .iter()
                .map(|(name, function)| {
                    format!(
                        "{}({}) AS {}",
                        function.function(),
                        target(name),
                        quote_ident(&format!("{name}__{}", function.suffix()))
                    )
                })
                .collect::<Vec<_>>()
                .join(", ")
        };

        if !self.state.is_sliced() {
            let compiler = self.compiler();
            let select = SelectList::Raw(SqlFragment::raw(render(&|c| compiler.qualify(c))));
            return compiler.compile(&select, false);
        }
        let inner = self.compile()?;
        let outer = render(&|c| format!("subquery.{}", quote_ident(c)));
        Ok(SqlFragment::new(
            format!("SELECT {outer} FROM ({}) subquery", inner.sql),
            inner.params,
        ))
    }

    /// `SELECT 1 ... LIMIT 1`.
    pub fn exists(&self) -> Result<SqlFragment> {
        let mut state = self.state.clone();
        state.limit = Some(state.limit.map_or(1, |l| l.min(1)));
        let compiler = SelectCompiler::new(&self.from, self.descriptor.as_ref(), &state);
        compiler.compile(&SelectList::Raw(SqlFragment::raw("1 AS \"a\"")), false)
    }

    /// A single-column statement for use inside another relation's
    /// `IN (...)` filter.
    pub fn as_subquery(&self, column: &str) -> Result<SqlFragment> {
        self.values(&[column])?.compile()
    }

    /// Evaluate the unfiltered series in process.
    pub fn materialize(&self) -> Result<Vec<SeriesRow>> {
        if !self.state.filters.is_empty() || self.state.is_sliced() {
            return Err(Error::InvalidArgumentError(
                "only an unfiltered, unsliced series can be materialized locally".into(),
            ));
        }
        self.params().materialize(&self.descriptor)
    }

    /// Shorthand for `as_subquery("term")`.
    pub fn terms(&self) -> Result<SqlFragment> {
        self.as_subquery(TERM_COLUMN)
    }

    /// Precision and scale declared on the `term` column.
    pub fn term_precision(&self) -> (Option<u8>, Option<u8>) {
        self.descriptor
            .term()
            .map_or((None, None), |term| (term.precision, term.scale))
    }

    fn compiler(&self) -> SelectCompiler<'_> {
        SelectCompiler::new(&self.from, self.descriptor.as_ref(), &self.state)
    }

    fn ensure_column(&self, name: &str) -> Result<String> {
        match self.descriptor.column_by_name(name) {
            Some(column) => Ok(column.name.clone()),
            None => Err(Error::UnknownColumn(format!(
                "Cannot resolve keyword '{name}' into field. Choices are: {}",
                ColumnCatalog::column_names(self.descriptor.as_ref()).join(", ")
            ))),
        }
    }
}
