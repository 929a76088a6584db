//! Error types and result definitions for the pgseries workspace.
//!
//! Every pgseries crate returns [`Result<T>`], whose error variant is the single
//! [`Error`] enum defined here. Failures in this workspace are configuration
//! mistakes made by the caller (wrong value types, malformed interval steps,
//! unsupported column types), so nothing is retried: errors surface immediately
//! at relation-construction time.
//!
//! # Error Categories
//!
//! - **Unsupported types** ([`Error::UnsupportedType`]): no registered column type
//! - **Invalid arguments** ([`Error::InvalidArgumentError`]): ordering, type mismatch, missing step
//! - **Interval steps** ([`Error::InvalidStepValue`], [`Error::InvalidIntervalUnit`],
//!   [`Error::InvalidIntervalValue`]): malformed textual steps
//! - **Configuration** ([`Error::Config`]): settings that cannot be honored
//! - **Column references** ([`Error::UnknownColumn`]): filters against missing columns
//! - **Internal errors** ([`Error::Internal`]): broken invariants

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
