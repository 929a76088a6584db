use pgseries_plan::materialize::materialize;
use pgseries_plan::{CompositionSource, SeriesParameters, SeriesTerm};
use pgseries_test_utils::{init_tracing_for_tests, random_date_range, random_datetime_range};
use pgseries_types::{DecimalValue, SeriesColumnType, SeriesValue};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use time::Duration;
use time::macros::{date, datetime};

fn dec(text: &str) -> SeriesValue {
    SeriesValue::Decimal(text.parse::<DecimalValue>().expect("decimal literal"))
}

#[test]
fn equal_bounds_yield_one_scalar_row() {
    init_tracing_for_tests();
    let cases = [
        (SeriesColumnType::Integer, SeriesParameters::new(4, 4)),
        (SeriesColumnType::BigInteger, SeriesParameters::new(4, 4)),
        (
            SeriesColumnType::Decimal,
            SeriesParameters::new(dec("1.5"), dec("1.5")).with_step(dec("0.5")),
        ),
        (
            SeriesColumnType::Date,
            SeriesParameters::new(
                SeriesValue::Date(date!(2024-05-01)),
                SeriesValue::Date(date!(2024-05-01)),
            )
            .with_step("1 days"),
        ),
    ];
    for (ty, params) in cases {
        let rows = materialize(ty, &params).expect("materialize");
        assert_eq!(rows.len(), 1, "{ty}");
        assert_eq!(rows[0].term, SeriesTerm::Scalar(params.start.clone()), "{ty}");
    }
}

#[test]
fn equal_bounds_yield_no_lookback_ranges() {
    init_tracing_for_tests();
    let day = SeriesValue::Date(date!(2024-05-01));
    let params = SeriesParameters::new(day.clone(), day).with_step("1 days");
    assert!(materialize(SeriesColumnType::DateRange, &params).unwrap().is_empty());

    for instant in [
        SeriesValue::DateTime(datetime!(2024-05-01 12:30)),
        SeriesValue::DateTimeTz(datetime!(2024-05-01 12:30 +02:00)),
    ] {
        let params = SeriesParameters::new(instant.clone(), instant)
            .with_step("1 hours")
            .with_span("1 hours");
        assert!(materialize(SeriesColumnType::DateTimeRange, &params).unwrap().is_empty());
    }
}

#[test]
fn zero_to_nine_sums_to_forty_five() {
    let rows = materialize(SeriesColumnType::Integer, &SeriesParameters::new(0, 9)).unwrap();
    assert_eq!(rows.len(), 10);
    let sum: i64 = rows
        .iter()
        .filter_map(|row| row.term.as_scalar().and_then(SeriesValue::as_integer))
        .sum();
    assert_eq!(sum, 45);
}

#[test]
fn identity_ordinals_follow_generation_order() {
    let params = SeriesParameters::new(0, 9).with_step(2).with_include_id(true);
    let rows = materialize(SeriesColumnType::Integer, &params).unwrap();
    assert_eq!(rows.len(), 5);
    let fifth = rows.iter().find(|row| row.id == Some(5)).expect("id 5");
    assert_eq!(fifth.term, SeriesTerm::Scalar(SeriesValue::Integer(8)));
}

#[test]
fn ten_day_date_range_has_nine_rows() {
    let d0 = date!(2024-02-20);
    let params = SeriesParameters::new(
        SeriesValue::Date(d0),
        SeriesValue::Date(d0 + Duration::days(9)),
    )
    .with_step("1 days");
    let rows = materialize(SeriesColumnType::DateRange, &params).unwrap();
    assert_eq!(rows.len(), 9);
    let (first_lower, _) = rows[0].term.bounds().expect("range");
    let (_, last_upper) = rows[8].term.bounds().expect("range");
    assert_eq!(*first_lower, SeriesValue::Date(d0));
    assert_eq!(*last_upper, SeriesValue::Date(d0 + Duration::days(9)));
}

#[test]
fn integer_ranges_have_width_span() {
    for ty in [SeriesColumnType::IntegerRange, SeriesColumnType::BigIntegerRange] {
        let params = SeriesParameters::new(0, 20).with_step(5).with_span(3);
        let rows = materialize(ty, &params).unwrap();
        assert_eq!(rows.len(), 5);
        for row in rows {
            let (lower, upper) = row.term.bounds().expect("range");
            assert_eq!(upper.as_integer().unwrap() - lower.as_integer().unwrap(), 3);
        }
    }
}

#[test]
fn decimal_ranges_default_span_to_step() {
    let params = SeriesParameters::new(dec("0.00"), dec("1.00")).with_step(dec("0.25"));
    let rows = materialize(SeriesColumnType::DecimalRange, &params).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[1].term.to_string(), "[0.25,0.50)");
}

#[test]
fn iterable_composition_is_a_full_cartesian_product() {
    let letters: Vec<SeriesValue> = ["a", "b", "c"].into_iter().map(SeriesValue::from).collect();
    let params = SeriesParameters::new(1, 4)
        .with_composition(CompositionSource::Iterable(letters.clone()));
    let rows = materialize(SeriesColumnType::Integer, &params).unwrap();
    assert_eq!(rows.len(), 4 * 3);
    for term in 1..=4 {
        for letter in &letters {
            assert!(
                rows.iter().any(|row| row.term == SeriesTerm::Scalar(SeriesValue::Integer(term))
                    && row.value.as_ref() == Some(letter)),
                "missing ({term}, {letter})"
            );
        }
    }
}

#[test]
fn randomized_scalar_counts_match_divisible_spans() {
    init_tracing_for_tests();
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let start: i64 = rng.random_range(-1_000..1_000);
        let step: i64 = rng.random_range(1..50);
        let steps: i64 = rng.random_range(0..40);
        let stop = start + step * steps;
        let params = SeriesParameters::new(start, stop).with_step(step);
        let rows = materialize(SeriesColumnType::BigInteger, &params).unwrap();
        assert_eq!(rows.len() as i64, (stop - start) / step + 1);
    }
}

#[test]
fn randomized_lookback_ranges_lose_one_row() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let (start, stop) = random_date_range(&mut rng, 60);
        let params = SeriesParameters::new(SeriesValue::Date(start), SeriesValue::Date(stop))
            .with_step("1 days");
        let scalar = materialize(SeriesColumnType::Date, &params).unwrap();
        let ranged = materialize(SeriesColumnType::DateRange, &params).unwrap();
        assert_eq!(scalar.len() as i64, (stop - start).whole_days() + 1);
        assert_eq!(ranged.len(), scalar.len() - 1);

        let (start, stop) = random_datetime_range(&mut rng);
        let params = SeriesParameters::new(SeriesValue::DateTime(start), SeriesValue::DateTime(stop))
            .with_step("15 minutes");
        let scalar = materialize(SeriesColumnType::DateTime, &params).unwrap();
        let ranged = materialize(SeriesColumnType::DateTimeRange, &params).unwrap();
        assert_eq!(
            scalar.len() as i64,
            (stop - start).whole_minutes() / 15 + 1
        );
        assert_eq!(ranged.len(), scalar.len() - 1);
    }
}
