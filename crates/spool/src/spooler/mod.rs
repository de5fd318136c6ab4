//! Print spooler trait and implementations.
//!
//! A [`Spooler`] is a read-only view of the system's printers plus a way to
//! submit one-shot [`PrintJob`]s. Enumeration is never cached: every call
//! asks the operating system again, so indices refer to the snapshot taken by
//! that very call.

mod cups;
#[cfg(feature = "mock")]
mod mock;

pub use self::cups::Cups;
#[cfg(feature = "mock")]
pub use self::mock::MockSpooler;
use crate::error::Result;
use crate::printer::{Printer, PrinterRef};
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// One submission of a rendered document to a named printer.
///
/// Created at dispatch time and consumed by [`Spooler::submit`]; there is no
/// retry, persistence or cancellation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrintJob {
    pub printer: String,
    pub docname: String,
    pub data: Vec<u8>,
}

/// Spooler-assigned identifier of a submitted job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JobId(pub String);
impl Display for JobId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Unified interface for print spoolers.
#[async_trait]
pub trait Spooler: Send + Sync {
    /// Name of the spooler implementation (used for logging only).
    fn name(&self) -> &str;

    /// Fresh snapshot of the printers the spooler knows about.
    async fn printers(&self) -> Result<Vec<Printer>>;

    /// Hands a job to the spooler, resolving once it has been queued.
    async fn submit(&self, job: PrintJob) -> Result<JobId>;

    /// Resolves a reference against a fresh [`printers()`](Self::printers) snapshot.
    async fn resolve(&self, reference: &PrinterRef) -> Result<Printer> {
        reference.select(self.printers().await?)
    }
}
