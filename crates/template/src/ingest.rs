//! Record ingestion from the command-line data argument.
//!
//! JSON input is the argument itself. CSV input is a path to a file whose rows
//! map positionally onto `{firstname, lastname}`; there is no header detection.

use crate::error::{Error, ErrorKind, Result};
use crate::record::{Payload, Record};
use exn::ResultExt;
use serde_json::Value;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

/// Declared kind of the data argument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputKind {
    #[default]
    Json,
    Csv,
}
impl FromStr for InputKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => exn::bail!(ErrorKind::UnsupportedInput(s.to_string())),
        }
    }
}
impl Display for InputKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Json => "json",
            Self::Csv => "csv",
        })
    }
}

impl InputKind {
    /// Turns the raw data argument into records.
    #[instrument(skip(raw), fields(kind = %self))]
    pub async fn ingest(&self, raw: &str) -> Result<Payload> {
        let payload = match self {
            Self::Json => parse_json(raw)?,
            Self::Csv => {
                let path = Path::new(raw);
                let bytes = match tokio::fs::read(path).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let kind = ErrorKind::from_io(&e, path);
                        return Err(e).or_raise(|| kind);
                    },
                };
                parse_csv(&bytes)?
            },
        };
        tracing::debug!(records = payload.len(), batch = payload.is_batch(), "Data ingested");
        Ok(payload)
    }
}

pub fn parse_json(raw: &str) -> Result<Payload> {
    let value: Value = serde_json::from_str(raw).or_raise(|| ErrorKind::InvalidJson)?;
    match value {
        Value::Object(map) => Ok(Payload::Single(Record::from(map))),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(Record::from(map)),
                _ => exn::bail!(ErrorKind::InvalidShape),
            })
            .collect::<Result<Vec<_>>>()
            .map(Payload::Batch),
        _ => exn::bail!(ErrorKind::InvalidShape),
    }
}

/// CSV input always yields a [`Payload::Batch`], even for a single row.
pub fn parse_csv(bytes: &[u8]) -> Result<Payload> {
    let mut reader = csv::ReaderBuilder::new().has_headers(false).flexible(true).from_reader(bytes);
    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.or_raise(|| ErrorKind::InvalidCsv)?;
        records.push(
            Record::new()
                .with("firstname", row.get(0).unwrap_or_default())
                .with("lastname", row.get(1).unwrap_or_default()),
        );
    }
    Ok(Payload::Batch(records))
}
