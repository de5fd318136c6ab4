//! Reporting results and errors on standard output.
//!
//! Everything a command reports (success or failure) goes through a
//! [`Reporter`] in the selected [`OutputFormat`]; logs go to stderr instead.

use crate::error::Error;
use plastic_config::OutputFormat;
use plastic_spool::{JobId, Printer};
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use unicode_width::UnicodeWidthStr;

pub struct Reporter<W: Write> {
    format: OutputFormat,
    out: W,
    failed: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out, failed: false }
    }

    /// `true` once any error has been reported.
    pub fn failed(&self) -> bool {
        self.failed
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn printers(&mut self, printers: &[Printer]) {
        match self.format {
            OutputFormat::Json => self.json(&printers),
            OutputFormat::Log => {
                let rows = printers.iter().enumerate().map(|(i, p)| [i.to_string(), p.name.clone()]).collect();
                let table = table(["ID", "Name"], rows);
                self.line(&table);
            },
        }
    }

    pub fn job(&mut self, id: &JobId) {
        match self.format {
            OutputFormat::Json => self.json(&json!({ "job": id })),
            OutputFormat::Log => self.line(&format!("job {id}")),
        }
    }

    /// One completed record of a batch, reported as soon as it resolves.
    pub fn batch(&mut self, record: usize, result: &Result<JobId, Error>) {
        match (result, self.format) {
            (Ok(id), OutputFormat::Json) => self.json(&json!({ "record": record, "job": id })),
            (Ok(id), OutputFormat::Log) => self.line(&format!("record {record}: job {id}")),
            (Err(err), OutputFormat::Json) => {
                self.failed = true;
                self.json(&json!({ "record": record, "error": err.message() }))
            },
            (Err(err), OutputFormat::Log) => {
                self.failed = true;
                self.line(&format!("record {record}: {}", err.message()))
            },
        }
    }

    pub fn error(&mut self, err: &Error) {
        self.failed = true;
        tracing::debug!("{err:?}");
        match self.format {
            OutputFormat::Json => self.json(&json!({ "error": err.message() })),
            OutputFormat::Log => self.line(&format!("error: {}", err.message())),
        }
    }

    fn json(&mut self, value: &impl Serialize) {
        match serde_json::to_string_pretty(value) {
            Ok(s) => self.line(&s),
            Err(e) => tracing::error!(error = %e, "Could not serialize output"),
        }
    }

    fn line(&mut self, s: &str) {
        if let Err(e) = writeln!(self.out, "{s}").and_then(|()| self.out.flush()) {
            tracing::warn!(error = %e, "Could not write to standard output");
        }
    }
}

/// Renders a bordered table with box-drawing characters:
///
/// ```text
/// ╔════╤══════════════╗
/// ║ ID │ Name         ║
/// ╟────┼──────────────╢
/// ║ 0  │ Office_Laser ║
/// ╚════╧══════════════╝
/// ```
fn table<const N: usize>(head: [&str; N], rows: Vec<[String; N]>) -> String {
    let mut widths: [usize; N] = head.map(UnicodeWidthStr::width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }
    let rule = |left: char, fill: char, mid: char, right: char| {
        let segments: Vec<String> = widths.iter().map(|w| fill.to_string().repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(&mid.to_string()))
    };
    let line = |cells: Vec<&str>| {
        let padded: Vec<String> =
            cells.iter().zip(&widths).map(|(c, w)| format!(" {c}{} ", " ".repeat(w - c.width()))).collect();
        format!("║{}║", padded.join("│"))
    };

    let mut lines = vec![rule('╔', '═', '╤', '╗'), line(head.to_vec())];
    for row in &rows {
        lines.push(rule('╟', '─', '┼', '╢'));
        lines.push(line(row.iter().map(String::as_str).collect()));
    }
    lines.push(rule('╚', '═', '╧', '╝'));
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn reporter(format: OutputFormat) -> Reporter<Vec<u8>> {
        Reporter::new(format, Vec::new())
    }

    fn written(reporter: Reporter<Vec<u8>>) -> String {
        String::from_utf8(reporter.into_inner()).unwrap()
    }

    #[test]
    fn test_table() {
        let rows = vec![["0".to_string(), "Office_Laser".to_string()], ["1".to_string(), "Étiquette".to_string()]];
        let expected = "\
╔════╤══════════════╗
║ ID │ Name         ║
╟────┼──────────────╢
║ 0  │ Office_Laser ║
╟────┼──────────────╢
║ 1  │ Étiquette    ║
╚════╧══════════════╝";
        assert_eq!(table(["ID", "Name"], rows), expected);
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(table(["ID", "Name"], vec![]), "╔════╤══════╗\n║ ID │ Name ║\n╚════╧══════╝");
    }

    #[test]
    fn test_printers_as_json() {
        let mut out = reporter(OutputFormat::Json);
        out.printers(&[Printer::new("Office"), Printer::new("Label")]);
        let value: serde_json::Value = serde_json::from_str(&written(out)).unwrap();
        let names: Vec<_> = value.as_array().unwrap().iter().map(|p| p["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["Office", "Label"]);
    }

    #[test]
    fn test_error_as_json() {
        let mut out = reporter(OutputFormat::Json);
        out.error(&exn::Exn::new(ErrorKind::NotFound("printer not found: #3".into())));
        assert!(out.failed());
        assert_eq!(written(out), "{\n  \"error\": \"printer not found: #3\"\n}\n");
    }

    #[test]
    fn test_error_as_log() {
        let mut out = reporter(OutputFormat::Log);
        out.error(&exn::Exn::new(ErrorKind::Engine("paper jam".into())));
        assert_eq!(written(out), "error: paper jam\n");
    }

    #[test]
    fn test_batch_reports_each_record() {
        let mut out = reporter(OutputFormat::Log);
        out.batch(1, &Ok(JobId("Office-2".into())));
        assert!(!out.failed());
        out.batch(0, &Err(exn::Exn::new(ErrorKind::Engine("paper jam".into()))));
        assert!(out.failed());
        assert_eq!(written(out), "record 1: job Office-2\nrecord 0: paper jam\n");
    }

    #[test]
    fn test_job_as_json() {
        let mut out = reporter(OutputFormat::Json);
        out.job(&JobId("Office-9".into()));
        assert_eq!(written(out), "{\n  \"job\": \"Office-9\"\n}\n");
    }
}
