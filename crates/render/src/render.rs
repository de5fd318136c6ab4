use crate::error::{ErrorKind, Result};
use crate::page::PageSetup;
use crate::{Renderer, StyleConfig, TempFile};
use exn::ResultExt;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Option key holding the URL relative assets resolve against.
const BASE_OPTION: &str = "base";

/// A rendered PDF on disk.
pub enum Output {
    /// Written to a path chosen by the caller.
    Persisted(PathBuf),
    /// Written to a temporary file, deleted when dropped.
    Temporary(TempFile),
}

impl Output {
    pub fn path(&self) -> &Path {
        match self {
            Self::Persisted(path) => path,
            Self::Temporary(file) => file.path(),
        }
    }

    /// Reads the whole document into memory.
    pub async fn bytes(&self) -> Result<Vec<u8>> {
        tokio::fs::read(self.path()).await.or_raise(|| ErrorKind::Io)
    }

    /// Opens the document for streaming.
    pub async fn open(&self) -> Result<tokio::fs::File> {
        tokio::fs::File::open(self.path()).await.or_raise(|| ErrorKind::Io)
    }
}

impl Renderer {
    /// Renders markup to a temporary PDF.
    pub async fn render(&self, html: &str, options: &Map<String, Value>) -> Result<Output> {
        let output = tempfile::Builder::new().prefix("plastic-").suffix(".pdf").tempfile().or_raise(|| ErrorKind::Io)?;
        self.render_to(html, options, output.path()).await?;
        Ok(Output::Temporary(output))
    }

    /// Renders markup to a PDF at `save_to`.
    ///
    /// `options` are a template's rendering options; see [`PageSetup`] for the
    /// keys that shape the page. A `base` option becomes the document's
    /// `<base href>` so relative assets resolve against it.
    #[instrument(skip_all)]
    pub async fn render_to(
        &self,
        html: &str,
        options: &Map<String, Value>,
        save_to: impl Into<PathBuf>,
    ) -> Result<Output> {
        let save_to = std::path::absolute(save_to.into()).or_raise(|| ErrorKind::Io)?;
        let setup = PageSetup::from_options(options)?;
        let styles = Self::styles(&setup)?;
        let base = options.get(BASE_OPTION).and_then(Value::as_str);
        let input = self.persist_html(html, base, &styles)?;
        let timeout = setup.timeout.unwrap_or(self.timeout);
        self.chrome.execute(input.path(), &save_to, self.sandbox, timeout).await?;
        Ok(Output::Persisted(save_to))
    }

    fn styles(setup: &PageSetup) -> Result<StyleConfig> {
        let mut styles = StyleConfig::new().with_builtin("print.css")?;
        if let Some(css) = setup.css() {
            styles = styles.with_content(css);
        }
        for stylesheet in &setup.stylesheets {
            styles = styles.with_stylesheet(stylesheet)?;
        }
        Ok(styles)
    }

    fn persist_html(&self, html: &str, base: Option<&str>, styles: &StyleConfig) -> Result<TempFile> {
        let leading = base.map(|b| format!("<base href=\"{}\">\n", b.replace('"', "&quot;"))).unwrap_or_default();
        let mut trailing = Vec::new();
        let blocks = styles.write_all_to(&mut trailing).or_raise(|| ErrorKind::Io)?;
        let trailing = String::from_utf8_lossy(&trailing);
        let document = inject(html, &leading, &trailing);
        tracing::debug!(blocks = blocks, base = base.is_some(), "Stylesheets injected into HTML");

        let mut tmp = tempfile::Builder::new().prefix("plastic-").suffix(".html").tempfile().or_raise(|| ErrorKind::Io)?;
        tmp.write_all(document.as_bytes()).or_raise(|| ErrorKind::Io)?;
        tmp.flush().or_raise(|| ErrorKind::Io)?;
        Ok(tmp)
    }
}

/// Places `leading` directly after the opening `<head>` tag (so `<base>`
/// precedes every relative URL) and `trailing` before `</head>`. Documents
/// without a head get one.
fn inject(html: &str, leading: &str, trailing: &str) -> String {
    // ASCII lowercasing keeps byte offsets identical to `html`.
    let lower = html.to_ascii_lowercase();
    let mut out = String::with_capacity(html.len() + leading.len() + trailing.len() + 16);
    if let Some(start) = find_tag(&lower, "<head") {
        let open_end = lower[start..].find('>').map_or(html.len(), |i| start + i + 1);
        out.push_str(&html[..open_end]);
        out.push_str(leading);
        match lower[open_end..].find("</head").map(|i| open_end + i) {
            Some(close) => {
                out.push_str(&html[open_end..close]);
                out.push_str(trailing);
                out.push_str(&html[close..]);
            },
            None => {
                out.push_str(trailing);
                out.push_str(&html[open_end..]);
            },
        }
        return out;
    }
    tracing::warn!("Document has no head element; adding one");
    let insert_at = find_tag(&lower, "<html").and_then(|start| lower[start..].find('>').map(|i| start + i + 1));
    let insert_at = insert_at.unwrap_or(0);
    out.push_str(&html[..insert_at]);
    out.push_str("<head>");
    out.push_str(leading);
    out.push_str(trailing);
    out.push_str("</head>");
    out.push_str(&html[insert_at..]);
    out
}

/// Byte offset of the first `tag` that is a whole tag name (so `<head` does
/// not match `<header>`).
fn find_tag(lower: &str, tag: &str) -> Option<usize> {
    lower.match_indices(tag).map(|(i, _)| i).find(|&i| {
        lower.as_bytes().get(i + tag.len()).is_none_or(|b| matches!(b, b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r'))
    })
}
