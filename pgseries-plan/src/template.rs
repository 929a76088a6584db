//! Raw SQL templates for each series column type.
//!
//! Every template binds its placeholders in the same order: span, start,
//! stop, step. Templates whose body never uses the span open with a
//! `--- %s` line comment so the span placeholder is still consumed and the
//! bound parameter list stays uniform across all ten column types.

use indoc::indoc;
use pgseries_result::Result;
use pgseries_types::SeriesColumnType;
use tracing::debug;

use crate::fragment::{SqlFragment, quote_ident};
use crate::params::{CompositionSource, SeriesParameters};
use crate::registry;

const SPAN_COMMENT: &str = "--- %s\n";

const GENERIC_TEMPLATE: &str = indoc! {"
    --- %s
    SELECT generate_series(%s, %s, %s) term"};

const DATE_TEMPLATE: &str = indoc! {"
    --- %s
    SELECT generate_series(date %s, date %s, interval %s)::date term"};

const DATETIME_TEMPLATE: &str = indoc! {"
    --- %s
    SELECT generate_series(timestamptz %s, timestamptz %s, interval %s)::timestamptz term"};

const INTEGER_RANGE_TEMPLATE: &str = indoc! {"
    SELECT int4range(a, a + %s)::int4range AS term
    FROM generate_series(%s, %s, %s) a"};

const BIG_INTEGER_RANGE_TEMPLATE: &str = indoc! {"
    SELECT int8range(a, a + %s)::int8range AS term
    FROM generate_series(%s, %s, %s) a"};

const DECIMAL_RANGE_TEMPLATE: &str = indoc! {"
    SELECT numrange(a, a + %s) AS term
    FROM generate_series(%s, %s, %s) a"};

const DATE_RANGE_TEMPLATE: &str = indoc! {"
    --- %s
    SELECT daterange((lag(a.n) OVER()), a.n, '[)') AS term
    FROM (
        SELECT generate_series(date %s, date %s, interval %s)::date AS n
    ) AS a
    OFFSET 1"};

const DATETIME_RANGE_TEMPLATE: &str = indoc! {"
    --- %s
    SELECT tstzrange((lag(a) OVER()), a, '[)') AS term
    FROM generate_series(timestamptz %s, timestamptz %s, interval %s) AS a
    OFFSET 1"};

/// How the series is composed with a second relation, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionTemplate<'a> {
    None,
    /// `UNNEST` of an array bound after the series parameters.
    Iterable,
    /// Primary keys selected by an already compiled subquery.
    Relation {
        key_column: &'a str,
        subquery_sql: &'a str,
    },
}

/// The base template of a column type, without identity or composition.
pub fn base_template(column_type: SeriesColumnType) -> &'static str {
    match column_type {
        SeriesColumnType::Integer | SeriesColumnType::BigInteger | SeriesColumnType::Decimal => {
            GENERIC_TEMPLATE
        }
        SeriesColumnType::Date => DATE_TEMPLATE,
        SeriesColumnType::DateTime => DATETIME_TEMPLATE,
        SeriesColumnType::IntegerRange => INTEGER_RANGE_TEMPLATE,
        SeriesColumnType::BigIntegerRange => BIG_INTEGER_RANGE_TEMPLATE,
        SeriesColumnType::DecimalRange => DECIMAL_RANGE_TEMPLATE,
        SeriesColumnType::DateRange => DATE_RANGE_TEMPLATE,
        SeriesColumnType::DateTimeRange => DATETIME_RANGE_TEMPLATE,
    }
}

/// Render the raw SQL text of a series.
pub fn render(
    column_type: SeriesColumnType,
    include_id: bool,
    composition: CompositionTemplate<'_>,
) -> String {
    let base = base_template(column_type);
    let series = if include_id {
        wrap_with_identity(base)
    } else {
        base.to_string()
    };

    match composition {
        CompositionTemplate::None => series,
        CompositionTemplate::Iterable => {
            let id = if include_id { "series.id, " } else { "" };
            format!(
                "WITH series AS (\n{}\n),\niterable AS (\n    SELECT UNNEST(%s) AS value\n)\n\
                 SELECT {id}series.term, iterable.value\nFROM series, iterable",
                indent(&series)
            )
        }
        CompositionTemplate::Relation {
            key_column,
            subquery_sql,
        } => {
            let id = if include_id { "series.id, " } else { "" };
            format!(
                "WITH series AS (\n{}\n),\nqueryset_pks AS (\n{}\n)\n\
                 SELECT {id}series.term, queryset_pks.{} as value\nFROM series, queryset_pks",
                indent(&series),
                indent(subquery_sql),
                quote_ident(key_column)
            )
        }
    }
}

/// Render the series of `params` as a fragment whose parameters are bound in
/// placeholder order: span, start, stop, step-or-1, then the iterable array
/// or the composition subquery's own parameters.
pub fn series_fragment(column_type: SeriesColumnType, params: &SeriesParameters) -> Result<SqlFragment> {
    let descriptor = registry::resolve(column_type);
    let mut bound = params.series_params(descriptor);

    let sql = match &params.composition {
        None => render(column_type, params.include_id, CompositionTemplate::None),
        Some(CompositionSource::Iterable(_)) => {
            render(column_type, params.include_id, CompositionTemplate::Iterable)
        }
        Some(CompositionSource::Relation(relation)) => {
            let key = relation.primary_key();
            let subquery = relation.compile_primary_keys()?;
            let sql = render(
                column_type,
                params.include_id,
                CompositionTemplate::Relation {
                    key_column: &key.name,
                    subquery_sql: &subquery.sql,
                },
            );
            bound.extend(subquery.params);
            sql
        }
    };

    debug!("Generated raw query:\n{}", sql);
    Ok(SqlFragment::new(sql, bound))
}

fn wrap_with_identity(base: &str) -> String {
    let (comment, body) = match base.strip_prefix(SPAN_COMMENT) {
        Some(body) => (SPAN_COMMENT, body),
        None => ("", base),
    };
    format!(
        "{comment}SELECT row_number() over () as id, \"term\"\nFROM (\n{}\n) AS seriesquery",
        indent(body)
    )
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::SqlFragment;

    #[test]
    fn every_template_has_four_placeholders() {
        for ty in SeriesColumnType::ALL {
            for include_id in [false, true] {
                let sql = render(ty, include_id, CompositionTemplate::None);
                assert_eq!(
                    SqlFragment::raw(sql.clone()).placeholder_count(),
                    4,
                    "{ty} include_id={include_id}:\n{sql}"
                );
            }
        }
    }

    #[test]
    fn span_comment_stays_first_under_identity() {
        let sql = render(SeriesColumnType::Date, true, CompositionTemplate::None);
        assert!(sql.starts_with("--- %s\nSELECT row_number() over () as id"));
        assert!(sql.ends_with(") AS seriesquery"));
    }

    #[test]
    fn numeric_ranges_use_the_span() {
        let sql = render(SeriesColumnType::IntegerRange, false, CompositionTemplate::None);
        assert!(sql.starts_with("SELECT int4range(a, a + %s)::int4range AS term"));
        let sql = render(SeriesColumnType::DecimalRange, false, CompositionTemplate::None);
        assert!(sql.contains("numrange(a, a + %s)"));
    }

    #[test]
    fn lookback_ranges_drop_the_first_row() {
        for ty in [SeriesColumnType::DateRange, SeriesColumnType::DateTimeRange] {
            let sql = render(ty, false, CompositionTemplate::None);
            assert!(sql.contains("lag("), "{ty}");
            assert!(sql.ends_with("OFFSET 1"), "{ty}");
        }
    }

    #[test]
    fn iterable_composition_adds_one_placeholder() {
        let sql = render(SeriesColumnType::Integer, false, CompositionTemplate::Iterable);
        assert_eq!(SqlFragment::raw(sql.clone()).placeholder_count(), 5);
        assert!(sql.contains("SELECT UNNEST(%s) AS value"));
        assert!(sql.ends_with("SELECT series.term, iterable.value\nFROM series, iterable"));
    }

    #[test]
    fn relation_composition_projects_the_key() {
        let sql = render(
            SeriesColumnType::Integer,
            true,
            CompositionTemplate::Relation {
                key_column: "id",
                subquery_sql: "SELECT \"shop\".\"id\" FROM \"shop\" WHERE \"shop\".\"id\" > %s",
            },
        );
        assert!(sql.contains("queryset_pks AS (\n    SELECT \"shop\".\"id\""));
        assert!(sql.contains("SELECT series.id, series.term, queryset_pks.\"id\" as value"));
        assert_eq!(SqlFragment::raw(sql).placeholder_count(), 5);
    }
}
