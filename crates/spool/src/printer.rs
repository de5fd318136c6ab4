use crate::error::{ErrorKind, Result};
use serde::Serialize;
use std::convert::Infallible;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// What the spooler last reported a printer to be doing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrinterState {
    Idle,
    Printing,
    Disabled,
    #[default]
    Unknown,
}

/// One entry of the spooler's printer enumeration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Printer {
    /// System-assigned queue name; the only stable identity a printer has.
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub state: PrinterState,
    pub default: bool,
}
impl Printer {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

/// How a user refers to a printer on the command line.
///
/// Decided once when parsing: anything that parses as a non-negative integer
/// is an index into the current enumeration, everything else is a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrinterRef {
    ByIndex(usize),
    ByName(String),
}
impl FromStr for PrinterRef {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.parse::<usize>() {
            Ok(index) => Self::ByIndex(index),
            Err(_) => Self::ByName(s.to_string()),
        })
    }
}
impl Display for PrinterRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::ByIndex(index) => write!(f, "#{index}"),
            Self::ByName(name) => write!(f, "\"{name}\""),
        }
    }
}
impl PrinterRef {
    /// Picks the referenced printer out of an enumeration snapshot.
    pub fn select(&self, printers: Vec<Printer>) -> Result<Printer> {
        let found = match self {
            Self::ByIndex(index) => printers.into_iter().nth(*index),
            Self::ByName(name) => printers.into_iter().find(|p| &p.name == name),
        };
        match found {
            Some(printer) => Ok(printer),
            None => exn::bail!(ErrorKind::PrinterNotFound(self.to_string())),
        }
    }
}
