//! Planning layer for `generate_series` relations.
//!
//! A series request flows through this crate in a fixed order: the
//! [`registry`] resolves or infers the output column type, [`validation`]
//! checks the [`SeriesParameters`] against the column type, the [`factory`]
//! returns the memoized [`SeriesRelationDescriptor`] for the request's shape,
//! and [`template`] renders the raw SQL fragment with its bound parameters.
//! The SQL layer splices that fragment into compiled statements.

pub mod factory;
pub mod fragment;
pub mod materialize;
pub mod params;
pub mod registry;
pub mod schema;
pub mod settings;
pub mod template;
pub mod validation;

pub use factory::{CompositionKey, SeriesRelationFactory, SeriesShapeKey, get_or_create};
pub use fragment::{SqlFragment, SqlParam, quote_ident};
pub use materialize::{SeriesRow, SeriesTerm};
pub use params::{CompositionSource, SeriesParameters, SourceKey, SourceRelation};
pub use registry::ColumnTypeDescriptor;
pub use schema::{SeriesColumn, SeriesColumnKind, SeriesRelationDescriptor};
pub use settings::{SeriesSettings, settings};
