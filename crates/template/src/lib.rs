//! Template loading and data ingestion.
//!
//! [`Template::load`] turns a named template directory into a compiled
//! template plus its rendering options; [`InputKind::ingest`] turns the raw
//! command-line data argument into one or many [`Record`]s.

pub mod error;
mod ingest;
mod record;
mod template;

pub use crate::ingest::{InputKind, parse_csv, parse_json};
pub use crate::record::{Payload, Record};
pub use crate::template::{BASE_OPTION, OPTIONS_FILE, Options, SOURCE_FILES, Template};
