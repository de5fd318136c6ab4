//! CUPS spooler, driven through its command-line tools.
//!
//! - `lpstat -l -p` enumerates printers with their description and location;
//! - `lpstat -d` names the default destination;
//! - `lp -d <printer> -t <docname> -o raw` queues the document read from stdin.
//!
//! Every command runs with `LC_ALL=C` so the output can be parsed.

use crate::error::{ErrorKind, Result};
use crate::printer::{Printer, PrinterState};
use crate::spooler::{JobId, PrintJob, Spooler};
use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use regex::Regex;
use std::ffi::OsString;
use std::process::{Output, Stdio};
use std::sync::LazyLock;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::instrument;

static REQUEST_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"request id is (\S+)").expect("valid regex"));
const NO_DESTINATIONS: &str = "No destinations added";

#[derive(Clone, Debug)]
pub struct Cups {
    lpstat: OsString,
    lp: OsString,
}
impl Default for Cups {
    fn default() -> Self {
        Self { lpstat: "lpstat".into(), lp: "lp".into() }
    }
}
impl Cups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses specific `lpstat` and `lp` executables instead of those on `PATH`.
    pub fn with_commands(lpstat: impl Into<OsString>, lp: impl Into<OsString>) -> Self {
        Self { lpstat: lpstat.into(), lp: lp.into() }
    }

    fn command(program: &OsString) -> Command {
        let mut command = Command::new(program);
        command.env("LC_ALL", "C").env("LANG", "C").stdout(Stdio::piped()).stderr(Stdio::piped());
        command
    }

    async fn lpstat(&self, args: &[&str]) -> Result<String> {
        let output = Self::command(&self.lpstat)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .or_raise(|| ErrorKind::Unavailable(self.lpstat.to_string_lossy().into_owned()))?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        // An empty printer list is reported as a failure by some CUPS versions.
        if stderr.contains(NO_DESTINATIONS) {
            return Ok(stdout);
        }
        if !output.status.success() {
            exn::bail!(ErrorKind::Rejected(stderr.trim().to_string()));
        }
        Ok(stdout)
    }
}

#[async_trait]
impl Spooler for Cups {
    fn name(&self) -> &str {
        "cups"
    }

    #[instrument(skip(self))]
    async fn printers(&self) -> Result<Vec<Printer>> {
        let mut printers = parse_printers(&self.lpstat(&["-l", "-p"]).await?);
        // Missing default destination is normal; an unreadable one is not worth failing over.
        match self.lpstat(&["-d"]).await {
            Ok(output) => {
                if let Some(default) = parse_default(&output) {
                    printers.iter_mut().filter(|p| p.name == default).for_each(|p| p.default = true);
                }
            },
            Err(e) => {
                let message = (*e).to_string();
                tracing::debug!(error = %message, "Could not determine default destination");
            },
        }
        tracing::debug!(count = printers.len(), "Enumerated printers");
        Ok(printers)
    }

    #[instrument(skip_all, fields(printer = %job.printer, bytes = job.data.len()))]
    async fn submit(&self, job: PrintJob) -> Result<JobId> {
        let mut child = Self::command(&self.lp)
            .args(["-d", &job.printer, "-t", &job.docname, "-o", "raw"])
            .stdin(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .or_raise(|| ErrorKind::Unavailable(self.lp.to_string_lossy().into_owned()))?;
        let mut stdin = child.stdin.take().ok_or_raise(|| ErrorKind::Io)?;
        stdin.write_all(&job.data).await.or_raise(|| ErrorKind::Io)?;
        // Closing stdin tells `lp` the document is complete.
        drop(stdin);
        let output = child.wait_with_output().await.or_raise(|| ErrorKind::Io)?;
        let id = parse_submission(&output)?;
        tracing::info!(job = %id, "Print job queued");
        Ok(id)
    }
}

fn parse_printers(output: &str) -> Vec<Printer> {
    let mut printers: Vec<Printer> = Vec::new();
    for line in output.lines() {
        if let Some(rest) = line.strip_prefix("printer ") {
            let mut parts = rest.splitn(2, ' ');
            let Some(name) = parts.next().filter(|n| !n.is_empty()) else { continue };
            let status = parts.next().unwrap_or_default();
            let state = if status.starts_with("is idle") {
                PrinterState::Idle
            } else if status.contains("now printing") {
                PrinterState::Printing
            } else if status.starts_with("disabled") {
                PrinterState::Disabled
            } else {
                PrinterState::Unknown
            };
            printers.push(Printer { state, ..Printer::new(name) });
            continue;
        }
        let Some(current) = printers.last_mut() else { continue };
        let detail = line.trim();
        if let Some(description) = detail.strip_prefix("Description:") {
            current.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
        } else if let Some(location) = detail.strip_prefix("Location:") {
            current.location = Some(location.trim().to_string()).filter(|l| !l.is_empty());
        }
    }
    printers
}

fn parse_default(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("system default destination:"))
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
}

fn parse_submission(output: &Output) -> Result<JobId> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.trim().trim_start_matches("lp:").trim();
        exn::bail!(ErrorKind::Rejected(if message.is_empty() { format!("lp exited with {}", output.status) } else { message.to_string() }));
    }
    REQUEST_ID
        .captures(&stdout)
        .and_then(|c| c.get(1))
        .map(|m| JobId(m.as_str().to_string()))
        .ok_or_raise(|| ErrorKind::UnexpectedOutput(stdout.trim().to_string()))
}
