//! PDF rendering through headless Chrome/Chromium.
//!
//! Markup is written to a temporary HTML file with a `<base href>` and the
//! page setup stylesheets injected into its head, then printed with
//! `--print-to-pdf`.

mod chrome;
pub mod error;
mod page;
mod render;
mod style;

use crate::chrome::Chrome;
use crate::error::Result;
pub use crate::page::PageSetup;
pub use crate::render::Output;
pub use crate::style::StyleConfig;
use std::path::PathBuf;
use std::time::Duration;

pub type TempFile = tempfile::NamedTempFile;

/// Render timeout used when neither the caller nor the template sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Renderer {
    chrome: Chrome,
    timeout: Duration,
    sandbox: bool,
}
impl Renderer {
    /// Uses the first Chrome/Chromium found on `PATH` or installed through Flatpak.
    pub fn new() -> Result<Self> {
        Ok(Self::with_chrome(Chrome::discover()?))
    }

    /// Uses a specific Chrome/Chromium executable.
    pub fn with_executable(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::with_chrome(Chrome::at(path)?))
    }

    fn with_chrome(chrome: Chrome) -> Self {
        Self { chrome, timeout: DEFAULT_TIMEOUT, sandbox: true }
    }

    /// How long Chrome may run before it is killed, unless a template's
    /// `timeout` option says otherwise.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Chrome refuses to start sandboxed as root (e.g. inside containers).
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }
}
