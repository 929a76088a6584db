//! Queryable relations over `generate_series`.
//!
//! [`generate_series`] validates a request and returns a [`SeriesRelation`]:
//! a read-only relation whose FROM clause is replaced, at every compilation,
//! by the series fragment. [`TableRelation`] models an ordinary table that
//! can filter on a series or feed one as a Cartesian-product source.

pub mod builder;
pub mod compiler;
pub mod predicate;
pub mod relation;
pub mod table;

pub use builder::{GenerateSeries, generate_series};
pub use compiler::{FromClauseCompiler, SeriesFromClause, TableFrom};
pub use predicate::{ColumnCatalog, CompareOp, Predicate};
pub use relation::{Aggregate, SeriesRelation};
pub use table::TableRelation;
