//! Statement compilation.
//!
//! [`FromClauseCompiler`] is the seam where a series takes over the FROM
//! clause: [`SeriesFromClause`] wraps the plain [`TableFrom`] compiler and, on
//! every compilation, renders the series fragment in place of the table name.
//! [`SelectCompiler`] assembles the full statement, binding parameters in
//! clause order: select list, FROM, WHERE.

use std::fmt;
use std::sync::Arc;

use pgseries_plan::fragment::quote_ident;
use pgseries_plan::template::series_fragment;
use pgseries_plan::{SeriesParameters, SqlFragment};
use pgseries_result::Result;
use pgseries_types::SeriesColumnType;
use tracing::trace;

use crate::predicate::{ColumnCatalog, Predicate};

/// Strategy producing the FROM clause of a statement.
pub trait FromClauseCompiler: fmt::Debug + Send + Sync {
    fn compile_from(&self) -> Result<SqlFragment>;

    /// Alias every column reference is qualified with.
    fn alias(&self) -> &str;
}

/// `FROM "table"` for a plain table.
#[derive(Debug, Clone)]
pub struct TableFrom {
    table: String,
}

impl TableFrom {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

impl FromClauseCompiler for TableFrom {
    fn compile_from(&self) -> Result<SqlFragment> {
        Ok(SqlFragment::raw(quote_ident(&self.table)))
    }

    fn alias(&self) -> &str {
        &self.table
    }
}

/// Everything needed to render a series fragment.
#[derive(Debug, Clone)]
pub struct SeriesSource {
    pub column_type: SeriesColumnType,
    pub params: SeriesParameters,
}

/// FROM-clause interceptor for series relations.
///
/// Delegates to `fallback` for the table-level clause, then replaces its text
/// with `(<fragment>) AS <alias>` and binds the fragment's parameters ahead of
/// whatever the fallback contributed.
#[derive(Debug, Clone)]
pub struct SeriesFromClause<F: FromClauseCompiler = TableFrom> {
    fallback: F,
    source: Arc<SeriesSource>,
}

impl<F: FromClauseCompiler> SeriesFromClause<F> {
    pub fn new(fallback: F, source: Arc<SeriesSource>) -> Self {
        Self { fallback, source }
    }

    pub fn source(&self) -> &SeriesSource {
        &self.source
    }
}

impl<F: FromClauseCompiler> FromClauseCompiler for SeriesFromClause<F> {
    fn compile_from(&self) -> Result<SqlFragment> {
        let fallback = self.fallback.compile_from()?;
        let series = series_fragment(self.source.column_type, &self.source.params)?;

        let mut params = series.params;
        params.extend(fallback.params);
        Ok(SqlFragment::new(
            format!("({}\n) AS {}", series.sql, quote_ident(self.fallback.alias())),
            params,
        ))
    }

    fn alias(&self) -> &str {
        self.fallback.alias()
    }
}

/// Ordering on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

impl OrderBy {
    /// Parse `"term"` or `"-term"` (descending).
    pub fn parse(text: &str) -> Self {
        match text.strip_prefix('-') {
            Some(column) => Self {
                column: column.to_string(),
                descending: true,
            },
            None => Self {
                column: text.to_string(),
                descending: false,
            },
        }
    }
}

/// What a statement selects.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    /// Qualified columns, in order.
    Columns(Vec<String>),
    /// A pre-rendered expression list such as `COUNT(*) AS "__count"`.
    Raw(SqlFragment),
}

/// Filtering, ordering, projection, and slicing shared by relations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub filters: Vec<Predicate>,
    pub ordering: Vec<OrderBy>,
    pub projection: Option<Vec<String>>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl QueryState {
    pub fn is_sliced(&self) -> bool {
        self.offset.is_some() || self.limit.is_some()
    }
}

/// Assembles `SELECT ... FROM ... WHERE ... ORDER BY ... LIMIT ... OFFSET ...`.
pub struct SelectCompiler<'a> {
    from: &'a dyn FromClauseCompiler,
    columns: &'a dyn ColumnCatalog,
    state: &'a QueryState,
}

impl<'a> SelectCompiler<'a> {
    pub fn new(
        from: &'a dyn FromClauseCompiler,
        columns: &'a dyn ColumnCatalog,
        state: &'a QueryState,
    ) -> Self {
        Self {
            from,
            columns,
            state,
        }
    }

    /// Quote `column` qualified by the relation alias.
    pub fn qualify(&self, column: &str) -> String {
        format!("{}.{}", quote_ident(self.from.alias()), quote_ident(column))
    }

    pub fn compile(&self, select: &SelectList, with_ordering: bool) -> Result<SqlFragment> {
        let mut statement = SqlFragment::raw("SELECT ");
        match select {
            SelectList::Columns(columns) => {
                let rendered: Vec<String> = columns.iter().map(|c| self.qualify(c)).collect();
                statement.push_sql(&rendered.join(", "));
            }
            SelectList::Raw(fragment) => statement.push(fragment.clone()),
        }

        statement.push_sql(" FROM ");
        statement.push(self.from.compile_from()?);

        if !self.state.filters.is_empty() {
            statement.push_sql(" WHERE ");
            for (idx, predicate) in self.state.filters.iter().enumerate() {
                if idx > 0 {
                    statement.push_sql(" AND ");
                }
                statement.push(predicate.to_sql(self.from.alias(), self.columns)?);
            }
        }

        if with_ordering && !self.state.ordering.is_empty() {
            let rendered: Vec<String> = self
                .state
                .ordering
                .iter()
                .map(|order| {
                    let direction = if order.descending { "DESC" } else { "ASC" };
                    format!("{} {direction}", self.qualify(&order.column))
                })
                .collect();
            statement.push_sql(" ORDER BY ");
            statement.push_sql(&rendered.join(", "));
        }

        if let Some(limit) = self.state.limit {
            statement.push_sql(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.state.offset {
            statement.push_sql(&format!(" OFFSET {offset}"));
        }

        trace!(sql = %statement.sql, params = statement.params.len(), "compiled statement");
        Ok(statement)
    }
}
