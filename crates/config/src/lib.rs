//! Layered configuration for `plastic`.
//!
//! Values are merged with [`figment`] from (lowest to highest precedence):
//!
//! 1. built-in defaults ([`Config::default`]);
//! 2. a `config.toml` or `config.json` in the platform configuration directory,
//!    or the single file named by the `PLASTIC_CONFIG` environment variable;
//! 3. `PLASTIC_*` environment variables (`PLASTIC_TEMPLATE_PATH`, `PLASTIC_CHROME`, ...).
//!
//! Command-line flags are applied last by the binary through
//! [`Config::with_overrides`].

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_PREFIX: &str = "PLASTIC_";
pub const ENV_CONFIG_FILE: &str = "PLASTIC_CONFIG";
pub const DEFAULT_DOCNAME: &str = "plastic-print";

/// How results (and errors) are written to standard output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Machine-readable, pretty-printed JSON.
    Json,
    /// Human-readable text.
    #[default]
    Log,
}
impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown output format \"{other}\" (expected json or log)")),
        }
    }
}
impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Json => "json",
            Self::Log => "log",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory containing one sub-directory per template. Relative paths,
    /// including the default `templates`, resolve against the working directory.
    pub template_path: PathBuf,
    pub format: OutputFormat,
    /// Document name reported to the print spooler.
    pub docname: String,
    /// Render timeout in seconds, used when a template's options don't set one.
    pub timeout: u64,
    /// Explicit Chrome/Chromium executable; discovered on `PATH` when unset.
    pub chrome: Option<PathBuf>,
    /// Disable to run Chrome with `--no-sandbox` (required when running as root).
    pub sandbox: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("templates"),
            format: OutputFormat::default(),
            docname: DEFAULT_DOCNAME.to_string(),
            timeout: 30,
            chrome: None,
            sandbox: true,
        }
    }
}

/// Command-line values that take precedence over every other source.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub template_path: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub docname: Option<String>,
}

impl Config {
    /// Loads defaults, the user configuration file(s) and the environment.
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment())
    }

    /// The figment used by [`load()`](Self::load), exposed so callers (and
    /// tests) can merge further providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match std::env::var_os(ENV_CONFIG_FILE) {
            Some(path) => {
                let path = PathBuf::from(path);
                tracing::debug!(path = %path.display(), "Using configuration file from environment");
                figment = match path.extension().and_then(|e| e.to_str()) {
                    Some("json") => figment.merge(Json::file(path)),
                    _ => figment.merge(Toml::file(path)),
                };
            },
            None => {
                if let Some(dirs) = ProjectDirs::from("", "", "plastic") {
                    let dir = dirs.config_dir();
                    tracing::trace!(dir = %dir.display(), "Searching for configuration files");
                    figment = figment.merge(Toml::file(dir.join("config.toml"))).merge(Json::file(dir.join("config.json")));
                }
            },
        }
        figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config", "log"]))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Invalid("could not extract configuration".into()))?;
        config.validate()
    }

    /// Applies command-line values on top of the loaded configuration.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self> {
        if let Some(path) = overrides.template_path {
            self.template_path = path;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if let Some(docname) = overrides.docname {
            self.docname = docname;
        }
        self.validate()
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    fn validate(self) -> Result<Self> {
        if self.docname.trim().is_empty() {
            exn::bail!(ErrorKind::Unacceptable("docname"));
        }
        if self.timeout == 0 {
            exn::bail!(ErrorKind::Unacceptable("timeout"));
        }
        if self.template_path.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Unacceptable("template_path"));
        }
        Ok(self)
    }
}
