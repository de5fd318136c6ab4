//! Stylesheets injected into the `<head>` of a document before printing.
//!
//! A template's `stylesheets` option names either styles bundled from
//! `assets/styles` or files linked relative to the template directory. Page setup CSS is added as raw content.

mod assets;

use crate::error::{ErrorKind, Result};
use crate::style::assets::Builtins;
use std::borrow::Cow;
use std::io::Write;

enum Style {
    Builtin(String),
    Content(String),
    /// A `<link>` whose `href` resolves against the injected `<base>`.
    Link(String),
}
impl Style {
    fn write_all_to(&self, w: &mut impl Write) -> std::io::Result<()> {
        let content = match self {
            Self::Builtin(name) => match Builtins::load(name) {
                Ok(content) => content,
                Err(_) => return Err(std::io::Error::other(format!("builtin style {name} disappeared"))),
            },
            Self::Content(content) => Cow::Borrowed(content.as_bytes()),
            Self::Link(href) => {
                return writeln!(w, "<link rel=\"stylesheet\" href=\"{}\">", href.replace('"', "&quot;"));
            },
        };
        w.write_all(b"<style>")?;
        w.write_all(&content)?;
        w.write_all(b"</style>\n")
    }
}

/// Stylesheets for one document, in the order they are injected.
///
/// Styles are applied in insertion order; later styles override earlier ones.
///
/// # Example
///
/// ```
/// use plastic_render::StyleConfig;
/// # use plastic_render::error::Result;
///
/// # fn get_styles() -> Result<StyleConfig> {
/// let styles = StyleConfig::new()
///     .with_builtin("print.css")?
///     .with_stylesheet("card.css")?
///     .with_content("body { color: navy; }");
/// # Ok(styles)
/// # }
/// ```
#[derive(Default)]
pub struct StyleConfig {
    styles: Vec<Style>,
}
impl StyleConfig {
    /// Creates an empty style configuration with no stylesheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a builtin stylesheet by name.
    pub fn with_builtin(mut self, name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref();
        if !Builtins::exists(name) {
            exn::bail!(ErrorKind::AssetNotFound(Builtins::identifier(name)));
        }
        self.styles.push(Style::Builtin(name.trim().trim_start_matches("builtin:").to_string()));
        Ok(self)
    }

    /// Appends a stylesheet named in a template's options: a builtin when one
    /// matches (or the name is prefixed with `builtin:`), otherwise a link
    /// relative to the template directory.
    pub fn with_stylesheet(self, name: impl AsRef<str>) -> Result<Self> {
        let name = name.as_ref().trim();
        if name.starts_with("builtin:") || Builtins::exists(name) {
            return self.with_builtin(name);
        }
        if name.is_empty() {
            exn::bail!(ErrorKind::AssetNotFound(String::new()));
        }
        Ok(self.with_link(name))
    }

    fn with_link(mut self, href: impl Into<String>) -> Self {
        self.styles.push(Style::Link(href.into()));
        self
    }

    /// Appends raw CSS content as a stylesheet. This is infallible since no
    /// I/O is involved.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.styles.push(Style::Content(content.into()));
        self
    }

    pub(crate) fn write_all_to(&self, w: &mut impl Write) -> std::io::Result<usize> {
        for style in &self.styles {
            style.write_all_to(w)?;
        }
        Ok(self.styles.len())
    }
}
