//! Sending rendered documents to a printer, a file or standard output.

use crate::error::{ErrorKind, Result};
use async_stream::stream;
use exn::ResultExt;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use plastic_render::{Output, Renderer};
use plastic_spool::{JobId, PrintJob, PrinterRef, SpoolerHandle};
use plastic_template::{Payload, Record, Template};
use std::path::PathBuf;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::instrument;

/// Where a single document goes. A printer wins over a file; with neither,
/// the document is written to standard output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Printer(PrinterRef),
    File(PathBuf),
    Stdout,
}
impl Target {
    pub fn select(printer: Option<PrinterRef>, output: Option<PathBuf>) -> Self {
        match (printer, output) {
            (Some(printer), _) => Self::Printer(printer),
            (None, Some(path)) => Self::File(path),
            (None, None) => Self::Stdout,
        }
    }
}

/// A validated pairing of records and their destination.
#[derive(Debug, PartialEq)]
pub enum Plan {
    Print(Record, PrinterRef),
    PrintBatch(Vec<Record>, PrinterRef),
    Export(Record, PathBuf),
    Stdout(Record),
}
impl Plan {
    /// Batches may only be printed; checked before anything is rendered.
    pub fn new(target: Target, payload: Payload) -> Result<Self> {
        match (target, payload) {
            (_, Payload::Batch(records)) if records.is_empty() => {
                exn::bail!(ErrorKind::InvalidInput("no records to print".into()))
            },
            (Target::Printer(printer), Payload::Batch(records)) => Ok(Self::PrintBatch(records, printer)),
            (_, Payload::Batch(_)) => exn::bail!(ErrorKind::InvalidInput(
                "Multiple documents can only be sent to the print queue. File output is not supported.".into()
            )),
            (Target::Printer(printer), Payload::Single(record)) => Ok(Self::Print(record, printer)),
            (Target::File(path), Payload::Single(record)) => Ok(Self::Export(record, path)),
            (Target::Stdout, Payload::Single(record)) => Ok(Self::Stdout(record)),
        }
    }
}

/// Everything needed to turn records into documents and send them somewhere.
pub struct Dispatcher {
    pub template: Template,
    pub renderer: Renderer,
    pub spooler: SpoolerHandle,
    pub docname: String,
}

impl Dispatcher {
    async fn document(&self, record: &Record) -> Result<Output> {
        let html = self.template.render(record).map_err(ErrorKind::template)?;
        self.renderer.render(&html, self.template.options()).await.map_err(ErrorKind::render)
    }

    /// Renders one record and submits it as a raw print job.
    ///
    /// The printer is resolved against a fresh enumeration after rendering.
    #[instrument(skip(self, record))]
    pub async fn print(&self, record: &Record, printer: &PrinterRef) -> Result<JobId> {
        let output = self.document(record).await?;
        // The spooler takes the document as a single buffer.
        let data = output.bytes().await.map_err(ErrorKind::render)?;
        let printer = self.spooler.resolve(printer).await.map_err(ErrorKind::spool)?;
        let job = PrintJob { printer: printer.name, docname: self.docname.clone(), data };
        self.spooler.submit(job).await.map_err(ErrorKind::spool)
    }

    /// Renders and prints every record concurrently, yielding each record's
    /// index and outcome in completion order.
    ///
    /// Failures are isolated: one record failing neither stops the others nor
    /// withdraws jobs that were already queued.
    pub fn print_batch<'a>(
        &'a self,
        records: Vec<Record>,
        printer: &'a PrinterRef,
    ) -> impl Stream<Item = (usize, Result<JobId>)> + 'a {
        stream! {
            let mut pending: FuturesUnordered<_> = records
                .into_iter()
                .enumerate()
                .map(|(index, record)| async move { (index, self.print(&record, printer).await) })
                .collect();
            tracing::debug!(records = pending.len(), "Batch dispatched");
            while let Some(completed) = pending.next().await {
                yield completed;
            }
        }
    }

    /// Renders one record straight to a file.
    #[instrument(skip(self, record))]
    pub async fn export(&self, record: &Record, path: PathBuf) -> Result<()> {
        let html = self.template.render(record).map_err(ErrorKind::template)?;
        self.renderer.render_to(&html, self.template.options(), path).await.map_err(ErrorKind::render)?;
        Ok(())
    }

    /// Renders one record and streams the document into `writer`.
    pub async fn write<W: AsyncWrite + Unpin>(&self, record: &Record, writer: &mut W) -> Result<u64> {
        let output = self.document(record).await?;
        let mut document = output.open().await.map_err(ErrorKind::render)?;
        let copied = match tokio::io::copy(&mut document, writer).await {
            Ok(copied) => copied,
            Err(e) => return Err(e).or_raise(|| ErrorKind::Engine("could not write document".into())),
        };
        writer.flush().await.or_raise(|| ErrorKind::Engine("could not write document".into()))?;
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("0"), Some("out.pdf"), Target::Printer(PrinterRef::ByIndex(0)))]
    #[case(Some("Office"), None, Target::Printer(PrinterRef::ByName("Office".into())))]
    #[case(None, Some("out.pdf"), Target::File(PathBuf::from("out.pdf")))]
    #[case(None, None, Target::Stdout)]
    fn test_select_target(#[case] printer: Option<&str>, #[case] output: Option<&str>, #[case] expected: Target) {
        let printer = printer.map(|p| p.parse().unwrap());
        assert_eq!(Target::select(printer, output.map(PathBuf::from)), expected);
    }

    #[test]
    fn test_batches_need_a_printer() {
        let batch = || Payload::Batch(vec![Record::new(), Record::new()]);
        let printer = PrinterRef::ByIndex(0);
        assert!(matches!(Plan::new(Target::Printer(printer.clone()), batch()).unwrap(), Plan::PrintBatch(r, _) if r.len() == 2));
        let err = Plan::new(Target::File("out.pdf".into()), batch()).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidInput(_)));
        assert!(matches!(*Plan::new(Target::Stdout, batch()).unwrap_err(), ErrorKind::InvalidInput(_)));
        assert!(Plan::new(Target::Printer(printer), Payload::Batch(vec![])).is_err());
    }

    #[rstest]
    #[case(Target::Printer(PrinterRef::ByIndex(2)), Plan::Print(Record::new(), PrinterRef::ByIndex(2)))]
    #[case(Target::File("out.pdf".into()), Plan::Export(Record::new(), "out.pdf".into()))]
    #[case(Target::Stdout, Plan::Stdout(Record::new()))]
    fn test_single_record_plans(#[case] target: Target, #[case] expected: Plan) {
        assert_eq!(Plan::new(target, Payload::Single(Record::new())).unwrap(), expected);
    }

    #[cfg(unix)]
    mod stubbed {
        use super::*;
        use plastic_spool::{MockSpooler, Spooler};
        use std::collections::HashMap;
        use std::os::unix::fs::PermissionsExt;
        use std::sync::Arc;
        use tempfile::TempDir;

        const CHROME: &str = r#"#!/bin/sh
for arg in "$@"; do
  case "$arg" in
    --print-to-pdf=*) out="${arg#--print-to-pdf=}" ;;
    file://*) input="${arg#file://}" ;;
  esac
done
printf '%%PDF-1.4\n' > "$out"
cat "$input" >> "$out"
"#;

        async fn dispatcher(dir: &TempDir, spooler: Arc<MockSpooler>) -> Dispatcher {
            let templates = dir.path().join("templates");
            std::fs::create_dir_all(templates.join("cards")).unwrap();
            std::fs::write(templates.join("cards/template.html"), "<p>{{ firstname }} {{ lastname }}</p>").unwrap();
            std::fs::write(templates.join("cards/options.json"), r#"{"format": "A5"}"#).unwrap();
            let chrome = dir.path().join("chrome");
            std::fs::write(&chrome, CHROME).unwrap();
            std::fs::set_permissions(&chrome, std::fs::Permissions::from_mode(0o755)).unwrap();
            Dispatcher {
                template: Template::load(&templates, "cards").await.unwrap(),
                renderer: Renderer::with_executable(&chrome).unwrap(),
                spooler,
                docname: "plastic-print".into(),
            }
        }

        fn person(first: &str, last: &str) -> Record {
            Record::new().with("firstname", first).with("lastname", last)
        }

        #[tokio::test]
        async fn test_print_single() {
            let dir = TempDir::new().unwrap();
            let spooler = Arc::new(MockSpooler::with_printers(["Office", "Label"]));
            let dispatcher = dispatcher(&dir, spooler.clone()).await;

            let id = dispatcher.print(&person("Jane", "Doe"), &PrinterRef::ByIndex(1)).await.unwrap();
            assert_eq!(id, JobId("Label-1".into()));
            let jobs = spooler.jobs().await;
            assert_eq!(jobs.len(), 1);
            assert_eq!(jobs[0].printer, "Label");
            assert_eq!(jobs[0].docname, "plastic-print");
            assert!(jobs[0].data.starts_with(b"%PDF-"));
            assert!(String::from_utf8_lossy(&jobs[0].data).contains("<p>Jane Doe</p>"));
        }

        #[tokio::test]
        async fn test_print_to_unknown_printer() {
            let dir = TempDir::new().unwrap();
            let spooler = Arc::new(MockSpooler::with_printers(["Office"]));
            let dispatcher = dispatcher(&dir, spooler.clone()).await;

            let err = dispatcher.print(&person("Jane", "Doe"), &PrinterRef::ByIndex(1)).await.unwrap_err();
            assert!(matches!(*err, ErrorKind::NotFound(_)));
            assert!(spooler.jobs().await.is_empty());
        }

        #[tokio::test]
        async fn test_batch_reports_every_record() {
            let dir = TempDir::new().unwrap();
            let spooler = Arc::new(MockSpooler::with_printers(["Office"]));
            let dispatcher = dispatcher(&dir, spooler.clone()).await;
            let records = vec![person("Jane", "Doe"), person("John", "Smith"), person("Ada", "Lovelace")];
            let printer = PrinterRef::ByName("Office".into());

            let results: HashMap<usize, Result<JobId>> = dispatcher.print_batch(records, &printer).collect().await;
            assert_eq!(results.len(), 3);
            assert!(results.values().all(|r| r.is_ok()));
            assert_eq!(spooler.jobs().await.len(), 3);
        }

        #[tokio::test]
        async fn test_batch_failures_are_isolated() {
            let dir = TempDir::new().unwrap();
            let spooler = Arc::new(MockSpooler::with_printers(["Office"]));
            let dispatcher = dispatcher(&dir, spooler.clone()).await;
            // An object cannot be written into the markup.
            let unprintable = Record::new().with("firstname", "John").with("lastname", serde_json::json!({ "family": "Smith" }));
            let records = vec![person("Jane", "Doe"), unprintable, person("Ada", "Lovelace")];
            let printer = PrinterRef::ByName("Office".into());

            let results: HashMap<usize, Result<JobId>> = dispatcher.print_batch(records, &printer).collect().await;
            assert!(results[&0].is_ok());
            assert!(matches!(&**results[&1].as_ref().unwrap_err(), ErrorKind::Engine(message) if message.contains("lastname")));
            assert!(results[&2].is_ok());
            assert_eq!(spooler.jobs().await.len(), 2);
        }

        #[tokio::test]
        async fn test_rejected_jobs_reported() {
            let dir = TempDir::new().unwrap();
            let spooler = Arc::new(MockSpooler::with_printers(["Office"]).failing("Office"));
            let dispatcher = dispatcher(&dir, spooler.clone()).await;

            let err = dispatcher.print(&person("Jane", "Doe"), &PrinterRef::ByIndex(0)).await.unwrap_err();
            assert_eq!(err.message(), "printer Office is jammed");
            assert_eq!(spooler.printers().await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_export_and_write() {
            let dir = TempDir::new().unwrap();
            let dispatcher = dispatcher(&dir, Arc::new(MockSpooler::default())).await;

            let path = dir.path().join("out.pdf");
            dispatcher.export(&person("Jane", "Doe"), path.clone()).await.unwrap();
            assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF-"));

            let mut buffer = Vec::new();
            let copied = dispatcher.write(&person("Jane", "Doe"), &mut buffer).await.unwrap();
            assert_eq!(copied as usize, buffer.len());
            assert!(buffer.starts_with(b"%PDF-"));
        }
    }
}
