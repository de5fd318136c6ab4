//! Configuration Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, matching the other crates in this workspace.

use derive_more::{Display, Error};

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration source could not be read or holds values of the wrong shape.
    #[display("invalid configuration: {_0}")]
    Invalid(#[error(not(source))] String),
    /// A value parsed fine but is not acceptable (e.g. an empty document name).
    #[display("unacceptable configuration value for `{_0}`")]
    Unacceptable(#[error(not(source))] &'static str),
}
