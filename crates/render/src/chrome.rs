use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::{Command as SyncCommand, Stdio};
use std::time::Duration;
use tokio::process::Command;

const EXECUTABLES: [&str; 5] = ["google-chrome", "google-chrome-stable", "chromium", "chromium-browser", "chrome"];
const FLATPAK_APPS: [&str; 2] = ["com.google.Chrome", "org.chromium.Chromium"];

/// How Chrome/Chromium gets started.
#[derive(Clone, Debug)]
pub(crate) enum Chrome {
    Binary { path: PathBuf },
    /// Run through `flatpak run` with host filesystem access.
    Flatpak { app_id: String },
}
impl Chrome {
    /// Searches `PATH` first, then installed Flatpak applications.
    pub(crate) fn discover() -> Result<Self> {
        // TODO: Probe the standard install locations on Windows and macOS.
        if let Some(path) = EXECUTABLES.iter().find_map(|name| which::which(name).ok()) {
            tracing::debug!(chrome = %path.display(), "Using Chrome from PATH");
            return Ok(Self::Binary { path });
        }
        match Self::flatpak() {
            Some(chrome) => Ok(chrome),
            None => exn::bail!(ErrorKind::ChromeNotFound),
        }
    }

    fn flatpak() -> Option<Self> {
        let Ok(flatpak) = which::which("flatpak") else {
            tracing::debug!("No Chrome on PATH and no flatpak binary");
            return None;
        };
        let installed = FLATPAK_APPS.into_iter().find(|app_id| {
            SyncCommand::new(&flatpak)
                .args(["info", *app_id])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .is_ok_and(|status| status.success())
        })?;
        tracing::debug!(app_id = installed, "Using Chrome from Flatpak");
        Some(Self::Flatpak { app_id: installed.to_string() })
    }

    /// Uses an explicitly configured executable instead of searching for one.
    pub(crate) fn at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        match which::which(&path) {
            Ok(path) => Ok(Self::Binary { path }),
            Err(e) => {
                tracing::warn!(chrome = %path.display(), "Configured Chrome executable is not runnable");
                Err(e).or_raise(|| ErrorKind::ChromeNotFound)
            },
        }
    }

    fn command(&self) -> Command {
        match self {
            Self::Binary { path } => Command::new(path),
            Self::Flatpak { app_id } => {
                let mut command = Command::new("flatpak");
                // The sandbox has to reach both the temporary files and the template assets.
                command.args(["run", "--filesystem=host", app_id]);
                command
            },
        }
    }

    /// Prints the HTML document at `input` to a PDF at `output`, killing
    /// Chrome if it runs for longer than `timeout`.
    pub(crate) async fn execute(&self, input: &Path, output: &Path, sandbox: bool, timeout: Duration) -> Result<()> {
        let mut command = self.command();
        command
            .args([
                "--headless",
                "--disable-gpu",
                "--disable-extensions",
                "--allow-file-access-from-files",
                "--run-all-compositor-stages-before-draw",
                "--no-pdf-header-footer",
                "--print-to-pdf-no-header",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if !sandbox {
            command.arg("--no-sandbox");
        }
        command.arg(format!("--print-to-pdf={}", output.display())).arg(format!("file://{}", input.display()));

        tracing::debug!(input = %input.display(), output = %output.display(), "Executing Chrome");
        let child = command.spawn().or_raise(|| ErrorKind::Io)?;
        let result = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.or_raise(|| ErrorKind::Io)?,
            // Dropping the future drops the child, which kills it.
            Err(elapsed) => return Err(elapsed).or_raise(|| ErrorKind::ChromeTimeout(timeout.as_millis())),
        };
        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            tracing::warn!(status = %result.status, stderr = %stderr, "Chrome did not exit cleanly");
            match result.status.code() {
                Some(code) => {
                    let stderr = if stderr.is_empty() { "no output".to_string() } else { stderr };
                    exn::bail!(ErrorKind::ChromeFailed { code, stderr })
                },
                None => exn::bail!(ErrorKind::ChromeKilled),
            }
        }

        let written = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            exn::bail!(ErrorKind::EmptyDocument);
        }
        tracing::debug!(bytes = written, "Chrome wrote document");
        Ok(())
    }
}
