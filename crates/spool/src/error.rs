//! Spool Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A spooler error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for spooler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No printer matches the reference (index out of range, or unknown name).
    #[display("printer not found: {_0}")]
    PrinterNotFound(#[error(not(source))] String),
    /// A spooler tool is not installed.
    #[display("print spooler unavailable: `{_0}` could not be started")]
    Unavailable(#[error(not(source))] String),
    /// The spooler refused the request; carries its message.
    #[display("{_0}")]
    Rejected(#[error(not(source))] String),
    /// The spooler answered with output that could not be understood.
    #[display("unexpected spooler output: {_0}")]
    UnexpectedOutput(#[error(not(source))] String),
    #[display("I/O error")]
    Io,
}
