use crate::error::Error;

/// Result type alias used throughout pgseries.
///
/// Shorthand for `std::result::Result<T, Error>`; every fallible pgseries
/// operation returns this type.
pub type Result<T> = std::result::Result<T, Error>;
