use std::fmt;
use thiserror::Error;

/// Unified error type for all pgseries operations.
///
/// Each variant carries a message describing what the caller supplied and what
/// was expected. Callers that need to react programmatically (for example to
/// distinguish a malformed interval step from an unknown interval unit) match
/// on the variant rather than the message.
///
/// # Thread Safety
///
/// `Error` implements `Send` and `Sync`, so relations can be built on one thread
/// and their failures reported on another.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested or inferred column type has no registered descriptor.
    ///
    /// Raised when:
    /// - A start value's runtime type cannot be mapped to a series column type
    ///   (booleans, floats, text, bytes)
    /// - A composition source yields values with no value-column mapping
    /// - A column type outside the ten series types is used as an output type
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// Invalid caller-supplied parameter.
    ///
    /// This is the validation family:
    /// - `start` greater than `stop`
    /// - `start` and `stop` of different runtime types
    /// - A value outside the accepted type set of the output column type
    /// - A missing step for a non-integer series
    /// - Both a composition relation and a composition iterable supplied
    /// - An unrecognized default-bounds notation
    ///
    /// # Recovery
    ///
    /// Fix the arguments and build the relation again.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// A textual step is not shaped as a number, a single space, and a unit.
    #[error("invalid step value: {0}")]
    InvalidStepValue(String),

    /// A textual step uses an interval unit outside the recognized set.
    #[error("invalid interval unit: {0}")]
    InvalidIntervalUnit(String),

    /// The numeric part of a textual step cannot be parsed, or is not a
    /// finite positive amount.
    #[error("invalid interval value: {0}")]
    InvalidIntervalValue(String),

    /// Settings could not be honored (the counterpart of an improperly
    /// configured application).
    #[error("configuration error: {0}")]
    Config(String),

    /// A filter, ordering, or projection referenced a column the relation does
    /// not have.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// Placeholder/parameter count mismatches detected while interpolating a
    /// compiled statement surface here. They indicate a template and its
    /// bound parameters drifted apart.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an invalid-argument error from any displayable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use pgseries_result::Error;
    ///
    /// let err = Error::invalid_argument("Start value must be smaller or equal to stop value");
    /// assert!(matches!(err, Error::InvalidArgumentError(msg) if msg.starts_with("Start")));
    /// ```
    #[inline]
    pub fn invalid_argument<E: fmt::Display>(err: E) -> Self {
        Error::InvalidArgumentError(err.to_string())
    }

    /// Create an unsupported-type error from any displayable value.
    #[inline]
    pub fn unsupported_type<E: fmt::Display>(err: E) -> Self {
        Error::UnsupportedType(err.to_string())
    }

    /// Returns `true` for the validation family of errors, the ones a caller
    /// fixes by changing the series arguments.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidArgumentError(_)
                | Error::InvalidStepValue(_)
                | Error::InvalidIntervalUnit(_)
                | Error::InvalidIntervalValue(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_errors_are_validation_errors() {
        assert!(Error::InvalidStepValue("1days".into()).is_validation());
        assert!(Error::InvalidIntervalUnit("fortnight".into()).is_validation());
        assert!(Error::InvalidIntervalValue("x".into()).is_validation());
        assert!(!Error::UnsupportedType("bool".into()).is_validation());
        assert!(!Error::Internal("mismatch".into()).is_validation());
    }

    #[test]
    fn display_includes_context() {
        let err = Error::unsupported_type("Boolean is not supported for standard fields");
        assert_eq!(
            err.to_string(),
            "unsupported type: Boolean is not supported for standard fields"
        );
    }
}
