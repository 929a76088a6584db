use std::sync::Once;

use rand::Rng;
use time::{Date, Duration, PrimitiveDateTime};

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        // Another harness may already own the global subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(feature = "auto-init")]
mod auto {
    // Use ctor to run at binary init time to avoid having to call init in every test.
    use ctor::ctor;

    #[ctor]
    fn init() {
        super::init_tracing_for_tests();
    }
}

/// A random datetime within January 2020, at whole-second resolution.
pub fn random_datetime<R: Rng>(rng: &mut R) -> PrimitiveDateTime {
    let start = time::macros::datetime!(2020-01-01 0:00);
    let seconds_in_month = 31 * 24 * 60 * 60;
    start + Duration::seconds(rng.random_range(0..seconds_in_month))
}

pub fn random_date<R: Rng>(rng: &mut R) -> Date {
    random_datetime(rng).date()
}

/// A random `(start, stop)` pair at most fourteen hours apart.
pub fn random_datetime_range<R: Rng>(rng: &mut R) -> (PrimitiveDateTime, PrimitiveDateTime) {
    let start = random_datetime(rng);
    let stop = start + Duration::seconds(rng.random_range(0..14 * 60 * 60));
    (start, stop)
}

/// A random `(start, stop)` pair of dates at most `max_days` apart.
pub fn random_date_range<R: Rng>(rng: &mut R, max_days: i64) -> (Date, Date) {
    let start = random_date(rng);
    let stop = start + Duration::days(rng.random_range(0..=max_days));
    (start, stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_values_stay_in_january_2020() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let value = random_datetime(&mut rng);
            assert_eq!(value.year(), 2020);
            assert_eq!(value.month(), time::Month::January);
            let (start, stop) = random_date_range(&mut rng, 30);
            assert!(start <= stop);
        }
    }
}
