//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("chrome/chromium not detected on your system")]
    ChromeNotFound,
    #[display("chrome did not finish rendering within {_0} ms")]
    ChromeTimeout(#[error(not(source))] u128),
    /// Chrome exited with a non-zero exit code; carries what it printed to stderr.
    #[display("Chrome exited with code {code}: {stderr}")]
    ChromeFailed { code: i32, stderr: String },
    /// Chrome was killed by a signal (or crashed) before exiting.
    #[display("Chrome was terminated before exiting")]
    ChromeKilled,
    /// Chrome exited successfully but did not write a document.
    #[display("Chrome produced an empty document")]
    EmptyDocument,
    /// Asset was not loadable (either file or builtin).
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    /// A rendering option has the wrong type or an unsupported value.
    #[display("invalid rendering option `{_0}`")]
    InvalidOption(#[error(not(source))] String),
    #[display("I/O error")]
    Io,
}
