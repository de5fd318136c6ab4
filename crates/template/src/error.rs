//! Template Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A template error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for template and ingestion operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// Template directory, template source, options file or data file is missing.
    #[display("file not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Template name is empty or is not a single path component.
    #[display("invalid template name: \"{_0}\"")]
    InvalidName(#[error(not(source))] String),
    /// `options.json` is not a JSON object.
    #[display("invalid template options: {}", _0.display())]
    Options(#[error(not(source))] PathBuf),
    /// The template source does not compile.
    #[display("template syntax error in {}", _0.display())]
    Syntax(#[error(not(source))] PathBuf),
    /// Substituting a record into the template failed (e.g. a field holding
    /// an object is printed directly).
    #[display("could not render template \"{template}\": {reason}")]
    Render { template: String, reason: String },
    /// Record data is not valid JSON.
    #[display("data is not valid JSON")]
    InvalidJson,
    /// Record data is not valid CSV.
    #[display("data is not valid CSV")]
    InvalidCsv,
    /// Record data is valid but is not an object or an array of objects.
    #[display("data must be an object or an array of objects")]
    InvalidShape,
    /// No parser exists for the declared input kind.
    #[display("Invalid input format: \"{_0}\"")]
    UnsupportedInput(#[error(not(source))] String),
    /// Underlying I/O error
    #[display("I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Maps a failed filesystem read to [`NotFound`](Self::NotFound) when the
    /// file is absent, and [`Io`](Self::Io) otherwise.
    pub(crate) fn from_io(err: &std::io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.into()),
            _ => Self::Io(path.into()),
        }
    }
}
