//! Filter predicates over relation columns.

use pgseries_plan::fragment::quote_ident;
use pgseries_plan::schema::{SeriesColumnKind, SeriesRelationDescriptor};
use pgseries_plan::{SqlFragment, SqlParam};
use pgseries_result::{Error, Result};
use pgseries_types::{SeriesColumnType, SeriesKind, SeriesValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    pub fn as_sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: SeriesValue,
    },
    /// `column IN (subquery)`
    InSubquery {
        column: String,
        subquery: SqlFragment,
    },
    /// Range containment of a single element, `column @> value`.
    Contains { column: String, value: SeriesValue },
    IsNull { column: String, is_null: bool },
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn eq(column: &str, value: impl Into<SeriesValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    pub fn lt(column: &str, value: impl Into<SeriesValue>) -> Self {
        Self::compare(column, CompareOp::Lt, value)
    }

    pub fn lte(column: &str, value: impl Into<SeriesValue>) -> Self {
        Self::compare(column, CompareOp::Lte, value)
    }

    pub fn gt(column: &str, value: impl Into<SeriesValue>) -> Self {
        Self::compare(column, CompareOp::Gt, value)
    }

    pub fn gte(column: &str, value: impl Into<SeriesValue>) -> Self {
        Self::compare(column, CompareOp::Gte, value)
    }

    pub fn compare(column: &str, op: CompareOp, value: impl Into<SeriesValue>) -> Self {
        Predicate::Compare {
            column: column.to_string(),
            op,
            value: value.into(),
        }
    }

    pub fn in_subquery(column: &str, subquery: SqlFragment) -> Self {
        Predicate::InSubquery {
            column: column.to_string(),
            subquery,
        }
    }

    pub fn contains(column: &str, value: impl Into<SeriesValue>) -> Self {
        Predicate::Contains {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn is_null(column: &str, is_null: bool) -> Self {
        Predicate::IsNull {
            column: column.to_string(),
            is_null,
        }
    }

    /// Name of the column the predicate tests.
    pub fn column(&self) -> &str {
        match self {
            Predicate::Compare { column, .. }
            | Predicate::InSubquery { column, .. }
            | Predicate::Contains { column, .. }
            | Predicate::IsNull { column, .. } => column,
            Predicate::Not(inner) => inner.column(),
        }
    }

    /// Render against the relation aliased `alias`.
    pub fn to_sql(&self, alias: &str, columns: &dyn ColumnCatalog) -> Result<SqlFragment> {
        let column = self.column();
        if !columns.has_column(column) {
            return Err(Error::UnknownColumn(format!(
                "Cannot resolve keyword '{column}' into field. Choices are: {}",
                columns.column_names().join(", ")
            )));
        }
        let target = format!("{}.{}", quote_ident(alias), quote_ident(column));
        match self {
            Predicate::Compare { op, value, .. } => Ok(SqlFragment::new(
                format!("{target} {} %s", op.as_sql()),
                vec![SqlParam::Value(value.clone())],
            )),
            Predicate::InSubquery { subquery, .. } => Ok(SqlFragment::new(
                format!("{target} IN ({})", subquery.sql),
                subquery.params.clone(),
            )),
            Predicate::Contains { value, .. } => {
                let element = columns.range_element_type(column).ok_or_else(|| {
                    Error::InvalidArgumentError(format!(
                        "containment requires a range column, '{column}' is not one"
                    ))
                })?;
                Ok(SqlFragment::new(
                    format!("{target} @> %s::{element}"),
                    vec![SqlParam::Value(value.clone())],
                ))
            }
            Predicate::IsNull { is_null, .. } => {
                let test = if *is_null { "IS NULL" } else { "IS NOT NULL" };
                Ok(SqlFragment::raw(format!("{target} {test}")))
            }
            Predicate::Not(inner) => {
                let inner = inner.to_sql(alias, columns)?;
                Ok(SqlFragment::new(format!("NOT ({})", inner.sql), inner.params))
            }
        }
    }
}

/// Column metadata needed to compile predicates and projections.
pub trait ColumnCatalog {
    fn column_names(&self) -> Vec<String>;

    fn has_column(&self, name: &str) -> bool {
        self.column_names().iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    /// Element type of a range column, `None` for scalar columns.
    fn range_element_type(&self, _name: &str) -> Option<&'static str> {
        None
    }
}

impl ColumnCatalog for SeriesRelationDescriptor {
    fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    fn has_column(&self, name: &str) -> bool {
        self.column_by_name(name).is_some()
    }

    fn range_element_type(&self, name: &str) -> Option<&'static str> {
        match self.column_by_name(name)?.kind {
            SeriesColumnKind::Term(ty) if ty.is_range() => {
                Some(SeriesColumnType::from_parts(ty.base_unit(), SeriesKind::Scalar).pg_type())
            }
            _ => None,
        }
    }
}
