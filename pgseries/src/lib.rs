//! pgseries: `generate_series` Relations for PostgreSQL
//!
//! This crate is the primary entrypoint for the pgseries toolkit. It
//! re-exports the series builder, the queryable relations, and the error
//! types from the underlying `pgseries-*` crates.
//!
//! # Quick Start
//!
//! Build a series, filter it, and compile it to SQL:
//!
//! ```rust
//! use pgseries::{Predicate, generate_series};
//!
//! let evens = generate_series(0, 9).step(2).include_id(true).build().unwrap();
//! let statement = evens.filter(Predicate::gte("term", 4)).compile().unwrap();
//! assert_eq!(statement.placeholder_count(), statement.params.len());
//! println!("{}", statement.interpolate().unwrap());
//! ```
//!
//! # Architecture
//!
//! pgseries is organized as a layered workspace:
//!
//! - **SQL Interface** (`pgseries-sql`): The `generate_series` builder, FROM-clause interception, and statement compilation.
//! - **Planning** (`pgseries-plan`): Type registry, validation, templates, and the memoizing relation factory.
//! - **Types** (`pgseries-types`): Runtime values, decimals, and interval steps.
//! - **Errors** (`pgseries-result`): The shared `Error` and `Result` types.
//!
//! # Re-exports
//!
//! - [`generate_series`]: The main entry point.
//! - [`plan`]: Descriptors, parameters, and the factory.
//! - [`types`]: Value and column-type enums.

pub use pgseries_sql::{
    Aggregate, ColumnCatalog, CompareOp, FromClauseCompiler, GenerateSeries, Predicate,
    SeriesFromClause, SeriesRelation, TableFrom, TableRelation, generate_series,
};

pub use pgseries_result::{Error, Result};

pub mod plan {
    //! Series planning: descriptors, parameters, SQL fragments, and the
    //! process-wide relation factory.

    pub use pgseries_plan::{
        ColumnTypeDescriptor, CompositionSource, SeriesColumn, SeriesColumnKind,
        SeriesParameters, SeriesRelationDescriptor, SeriesRelationFactory, SeriesRow,
        SeriesSettings, SeriesShapeKey, SeriesTerm, SourceKey, SourceRelation, SqlFragment,
        SqlParam, get_or_create, quote_ident, settings,
    };
}

pub mod types {
    //! Runtime values and column-type enums.

    pub use pgseries_types::{
        AutoFieldKind, DecimalValue, DefaultBounds, IntervalStep, IntervalUnit, SeriesColumnType,
        SeriesKind, SeriesValue, ValueColumnType, ValueKind,
    };
}
