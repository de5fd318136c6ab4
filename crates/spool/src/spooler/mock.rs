//! In-memory spooler for testing.

use crate::error::{ErrorKind, Result};
use crate::printer::Printer;
use crate::spooler::{JobId, PrintJob, Spooler};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory spooler for testing.
///
/// Submitted jobs are kept behind a [`RwLock`] so they can be inspected
/// afterwards. Printers marked with [`failing()`](Self::failing) reject every
/// job sent to them.
///
/// # Examples
///
/// ```
/// use plastic_spool::{MockSpooler, PrintJob, Spooler};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let spooler = MockSpooler::with_printers(["Office", "Label"]).failing("Label");
/// let job = PrintJob { printer: "Office".into(), docname: "card".into(), data: b"%PDF-".to_vec() };
/// assert_eq!(spooler.submit(job).await.unwrap().to_string(), "Office-1");
/// assert_eq!(spooler.jobs().await.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockSpooler {
    printers: Vec<Printer>,
    failing: HashSet<String>,
    jobs: RwLock<Vec<PrintJob>>,
    sequence: AtomicUsize,
}

impl MockSpooler {
    pub fn with_printers(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { printers: names.into_iter().map(Printer::new).collect(), ..Self::default() }
    }

    /// Makes every job sent to `name` fail.
    pub fn failing(mut self, name: impl Into<String>) -> Self {
        self.failing.insert(name.into());
        self
    }

    /// Jobs accepted so far, in submission order.
    pub async fn jobs(&self) -> Vec<PrintJob> {
        self.jobs.read().await.clone()
    }
}

#[async_trait]
impl Spooler for MockSpooler {
    fn name(&self) -> &str {
        "mock"
    }

    async fn printers(&self) -> Result<Vec<Printer>> {
        Ok(self.printers.clone())
    }

    async fn submit(&self, job: PrintJob) -> Result<JobId> {
        if !self.printers.iter().any(|p| p.name == job.printer) {
            exn::bail!(ErrorKind::PrinterNotFound(job.printer));
        }
        if self.failing.contains(&job.printer) {
            exn::bail!(ErrorKind::Rejected(format!("printer {} is jammed", job.printer)));
        }
        let id = JobId(format!("{}-{}", job.printer, self.sequence.fetch_add(1, Ordering::SeqCst) + 1));
        self.jobs.write().await.push(job);
        Ok(id)
    }
}
