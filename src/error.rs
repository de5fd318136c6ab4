//! Command Error Types
//!
//! Errors from every crate are classified here into the handful of categories
//! the command surface reports, keeping the originating crate's `Exn` frame as
//! a child so the full tree is still available in debug logs.

use derive_more::{Display, Error};
use plastic_config::error::{Error as ConfigError, ErrorKind as ConfigErrorKind};
use plastic_render::error::{Error as RenderError, ErrorKind as RenderErrorKind};
use plastic_spool::error::{Error as SpoolError, ErrorKind as SpoolErrorKind};
use plastic_template::error::{Error as TemplateError, ErrorKind as TemplateErrorKind};

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for command operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Every variant carries the one-line message shown to the user.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A template, data file or printer is absent.
    #[display("{_0}")]
    NotFound(#[error(not(source))] String),
    /// Malformed JSON, CSV, template options or configuration.
    #[display("{_0}")]
    Parse(#[error(not(source))] String),
    /// Unsupported input kind, or a request that cannot be honoured as given.
    #[display("{_0}")]
    InvalidInput(#[error(not(source))] String),
    /// The templating engine, PDF renderer or print spooler failed.
    #[display("{_0}")]
    Engine(#[error(not(source))] String),
}

impl ErrorKind {
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m) | Self::Parse(m) | Self::InvalidInput(m) | Self::Engine(m) => m,
        }
    }

    #[track_caller]
    pub fn template(err: TemplateError) -> Error {
        let message = (*err).to_string();
        let kind = match &*err {
            TemplateErrorKind::NotFound(_) => Self::NotFound(message),
            TemplateErrorKind::Options(_)
            | TemplateErrorKind::Syntax(_)
            | TemplateErrorKind::InvalidJson
            | TemplateErrorKind::InvalidCsv => Self::Parse(message),
            TemplateErrorKind::InvalidName(_) | TemplateErrorKind::InvalidShape | TemplateErrorKind::UnsupportedInput(_) => {
                Self::InvalidInput(message)
            },
            TemplateErrorKind::Render { .. } | TemplateErrorKind::Io(_) => Self::Engine(message),
        };
        err.raise(kind)
    }

    #[track_caller]
    pub fn render(err: RenderError) -> Error {
        let message = (*err).to_string();
        let kind = match &*err {
            RenderErrorKind::AssetNotFound(_) => Self::NotFound(message),
            RenderErrorKind::InvalidOption(_) => Self::Parse(message),
            _ => Self::Engine(message),
        };
        err.raise(kind)
    }

    #[track_caller]
    pub fn spool(err: SpoolError) -> Error {
        let message = (*err).to_string();
        let kind = match &*err {
            SpoolErrorKind::PrinterNotFound(_) => Self::NotFound(message),
            _ => Self::Engine(message),
        };
        err.raise(kind)
    }

    #[track_caller]
    pub fn config(err: ConfigError) -> Error {
        let message = (*err).to_string();
        let kind = match &*err {
            ConfigErrorKind::Invalid(_) => Self::Parse(message),
            ConfigErrorKind::Unacceptable(_) => Self::InvalidInput(message),
        };
        err.raise(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_classifies_template_errors() {
        let err = ErrorKind::template(exn::Exn::new(TemplateErrorKind::NotFound(PathBuf::from("cards/options.json"))));
        assert_eq!(*err, ErrorKind::NotFound("file not found: cards/options.json".into()));

        let err = ErrorKind::template(exn::Exn::new(TemplateErrorKind::UnsupportedInput("xml".into())));
        assert_eq!(err.message(), "Invalid input format: \"xml\"");
        assert!(matches!(*err, ErrorKind::InvalidInput(_)));

        let err = ErrorKind::template(exn::Exn::new(TemplateErrorKind::InvalidCsv));
        assert!(matches!(*err, ErrorKind::Parse(_)));
    }

    #[test]
    fn test_classifies_render_errors() {
        let stderr = "Failed to open file".to_string();
        let err = ErrorKind::render(exn::Exn::new(RenderErrorKind::ChromeFailed { code: 21, stderr }));
        assert_eq!(*err, ErrorKind::Engine("Chrome exited with code 21: Failed to open file".into()));
        let err = ErrorKind::render(exn::Exn::new(RenderErrorKind::InvalidOption("format".into())));
        assert!(matches!(*err, ErrorKind::Parse(_)));
    }

    #[test]
    fn test_classifies_spool_errors() {
        let err = ErrorKind::spool(exn::Exn::new(SpoolErrorKind::PrinterNotFound("#4".into())));
        assert_eq!(*err, ErrorKind::NotFound("printer not found: #4".into()));
        let err = ErrorKind::spool(exn::Exn::new(SpoolErrorKind::Rejected("paper jam".into())));
        assert_eq!(err.message(), "paper jam");
    }
}
