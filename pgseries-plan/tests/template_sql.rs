use pgseries_plan::template::series_fragment;
use pgseries_plan::{CompositionSource, SeriesParameters, SqlParam};
use pgseries_test_utils::init_tracing_for_tests;
use pgseries_types::{DecimalValue, SeriesColumnType, SeriesValue};
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;
use time::macros::date;

fn dec(text: &str) -> SeriesValue {
    SeriesValue::Decimal(text.parse::<DecimalValue>().expect("decimal literal"))
}

fn assert_parses(sql: &str) {
    let statements = Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .unwrap_or_else(|err| panic!("failed to parse:\n{sql}\n{err}"));
    assert_eq!(statements.len(), 1, "{sql}");
}

fn cases() -> Vec<(SeriesColumnType, SeriesParameters)> {
    let dates = || {
        SeriesParameters::new(
            SeriesValue::Date(date!(2024-01-01)),
            SeriesValue::Date(date!(2024-01-10)),
        )
        .with_step("1 days")
    };
    vec![
        (SeriesColumnType::Integer, SeriesParameters::new(0, 9)),
        (SeriesColumnType::BigInteger, SeriesParameters::new(0, 9).with_step(3)),
        (
            SeriesColumnType::Decimal,
            SeriesParameters::new(dec("-1.50"), dec("9.00")).with_step(dec("1.00")),
        ),
        (SeriesColumnType::IntegerRange, SeriesParameters::new(0, 9).with_span(2)),
        (SeriesColumnType::BigIntegerRange, SeriesParameters::new(0, 9)),
        (
            SeriesColumnType::DecimalRange,
            SeriesParameters::new(dec("0.00"), dec("9.00")).with_step(dec("0.50")),
        ),
        (SeriesColumnType::Date, dates()),
        (SeriesColumnType::DateRange, dates()),
    ]
}

#[test]
fn interpolated_templates_are_valid_postgres() {
    init_tracing_for_tests();
    for (ty, params) in cases() {
        for include_id in [false, true] {
            let params = params.clone().with_include_id(include_id);
            let fragment = series_fragment(ty, &params).expect("render");
            assert_eq!(fragment.placeholder_count(), fragment.params.len(), "{ty}");
            assert_parses(&fragment.interpolate().expect("interpolate"));
        }
    }
}

#[test]
fn iterable_composition_is_valid_postgres() {
    let params = SeriesParameters::new(1, 3).with_composition(CompositionSource::Iterable(vec![
        SeriesValue::from("north"),
        SeriesValue::from("south"),
    ]));
    let fragment = series_fragment(SeriesColumnType::Integer, &params).unwrap();
    assert_eq!(
        fragment.params.last(),
        Some(&SqlParam::Array(vec!["north".into(), "south".into()]))
    );
    let sql = fragment.interpolate().unwrap();
    assert!(sql.contains("UNNEST(ARRAY['north', 'south'])"));
    assert_parses(&sql);
}

#[test]
fn span_is_bound_first_even_when_unused() {
    let params = SeriesParameters::new(0, 9);
    let fragment = series_fragment(SeriesColumnType::Integer, &params).unwrap();
    assert_eq!(
        fragment.params,
        vec![
            SqlParam::Null,
            SqlParam::Value(SeriesValue::Integer(0)),
            SqlParam::Value(SeriesValue::Integer(9)),
            SqlParam::Value(SeriesValue::Integer(1)),
        ]
    );
    assert!(fragment.interpolate().unwrap().starts_with("--- NULL\n"));
}

#[test]
fn date_range_span_defaults_to_the_step() {
    let params = SeriesParameters::new(
        SeriesValue::Date(date!(2024-01-01)),
        SeriesValue::Date(date!(2024-01-10)),
    )
    .with_step("1 days");
    let fragment = series_fragment(SeriesColumnType::DateRange, &params).unwrap();
    assert_eq!(fragment.params[0], SqlParam::Value(SeriesValue::from("1 days")));
    assert!(
        fragment
            .interpolate()
            .unwrap()
            .contains("generate_series(date '2024-01-01', date '2024-01-10', interval '1 days')")
    );
}
