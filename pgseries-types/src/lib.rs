//! Value, decimal, interval, and column-type definitions shared by the
//! pgseries crates.

pub mod column;
pub mod decimal;
pub mod interval;
pub mod value;

pub use column::{
    AutoFieldKind, BaseUnit, DefaultBounds, SeriesColumnType, SeriesKind, ValueColumnType,
};
pub use decimal::{DecimalError, DecimalValue, MAX_DECIMAL_PRECISION};
pub use interval::{INTERVAL_UNITS, IntervalStep, IntervalUnit, IntervalValue};
pub use value::{SeriesValue, ValueKind};
