//! Concrete tables.
//!
//! A [`TableRelation`] stands in for an ordinary model table. It filters the
//! same way a series does and can serve as the relation arm of a series
//! Cartesian product.

use pgseries_plan::{SourceKey, SourceRelation, SqlFragment};
use pgseries_result::{Error, Result};

use crate::compiler::{QueryState, SelectCompiler, SelectList, TableFrom};
use crate::predicate::{ColumnCatalog, Predicate};

#[derive(Debug, Clone)]
pub struct TableRelation {
    from: TableFrom,
    pk_name: String,
    pk_field_kind: String,
    columns: Vec<String>,
    state: QueryState,
}

impl TableRelation {
    /// A table whose primary key `pk_name` is a field of kind
    /// `pk_field_kind` (`"AutoField"`, `"BigAutoField"`, ...).
    pub fn new(name: &str, pk_name: &str, pk_field_kind: &str) -> Self {
        Self {
            from: TableFrom::new(name),
            pk_name: pk_name.to_string(),
            pk_field_kind: pk_field_kind.to_string(),
            columns: vec![pk_name.to_string()],
            state: QueryState::default(),
        }
    }

    /// Declare the non-key columns.
    pub fn with_columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        for column in columns {
            let column = column.as_ref();
            if !self.columns.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                self.columns.push(column.to_string());
            }
        }
        self
    }

    pub fn filter(&self, predicate: Predicate) -> Self {
        let mut next = self.clone();
        next.state.filters.push(predicate);
        next
    }

    pub fn exclude(&self, predicate: Predicate) -> Self {
        self.filter(Predicate::Not(Box::new(predicate)))
    }

    pub fn compile(&self) -> Result<SqlFragment> {
        let columns = match &self.state.projection {
            Some(projection) => projection.clone(),
            None => self.columns.clone(),
        };
        SelectCompiler::new(&self.from, self, &self.state)
            .compile(&SelectList::Columns(columns), true)
    }

    /// A single-column statement for use inside another relation's
    /// `IN (...)` filter.
    pub fn as_subquery(&self, column: &str) -> Result<SqlFragment> {
        let Some(column) = self
            .columns
            .iter()
            .find(|c| c.eq_ignore_ascii_case(column))
            .cloned()
        else {
            return Err(Error::UnknownColumn(format!(
                "Cannot resolve keyword '{column}' into field. Choices are: {}",
                self.columns.join(", ")
            )));
        };
        let mut next = self.clone();
        next.state.projection = Some(vec![column]);
        next.state.ordering.clear();
        next.compile()
    }
}

impl ColumnCatalog for TableRelation {
    fn column_names(&self) -> Vec<String> {
        self.columns.clone()
    }
}

impl SourceRelation for TableRelation {
    fn primary_key(&self) -> SourceKey {
        SourceKey {
            name: self.pk_name.clone(),
            field_kind: self.pk_field_kind.clone(),
        }
    }

    fn compile_primary_keys(&self) -> Result<SqlFragment> {
        self.as_subquery(&self.pk_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgseries_plan::SqlParam;
    use pgseries_types::SeriesValue;

    fn shops() -> TableRelation {
        TableRelation::new("core_shop", "id", "BigAutoField").with_columns(&["name", "id"])
    }

    #[test]
    fn key_column_is_declared_once() {
        assert_eq!(shops().column_names(), vec!["id", "name"]);
    }

    #[test]
    fn primary_key_subquery_honors_filters() {
        let fragment = shops()
            .filter(Predicate::eq("name", "north"))
            .compile_primary_keys()
            .unwrap();
        assert_eq!(
            fragment.sql,
            "SELECT \"core_shop\".\"id\" FROM \"core_shop\" WHERE \"core_shop\".\"name\" = %s"
        );
        assert_eq!(fragment.params, vec![SqlParam::Value(SeriesValue::from("north"))]);
    }

    #[test]
    fn unknown_subquery_column_is_rejected() {
        assert!(matches!(
            shops().as_subquery("owner"),
            Err(Error::UnknownColumn(_))
        ));
    }
}
