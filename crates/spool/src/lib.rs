//! Printer registry and print job submission.
//!
//! [`Spooler::printers`] enumerates the system printers, [`Spooler::resolve`]
//! turns a [`PrinterRef`] (index or name) into one of them, and
//! [`Spooler::submit`] queues a raw [`PrintJob`].

pub mod error;
mod printer;
mod spooler;

pub use crate::printer::{Printer, PrinterRef, PrinterState};
#[cfg(feature = "mock")]
pub use crate::spooler::MockSpooler;
pub use crate::spooler::{Cups, JobId, PrintJob, Spooler};
use std::sync::Arc;

pub type SpoolerHandle = Arc<dyn Spooler>;
