//! Template loading and rendering.
//!
//! A template is a directory named after the template, holding a source file
//! and an `options.json` file:
//!
//! ```text
//! templates/
//! └── cards/
//!     ├── template.html   (or template.hbs / template.htm)
//!     ├── options.json
//!     └── logo.png        (relative assets resolve against the directory)
//! ```
//!
//! The source uses [upon]'s Mustache-like syntax (`{{ firstname }}`,
//! `{{ name|upper }}`, `{% if title %}...{% endif %}`), extended with:
//!
//! - **`upper`** / **`lower`**: change the case of a string.
//! - **`initial`**: the first character of a string (`{{ firstname|initial }}.`).
//! - **`slug`**: a lowercase, hyphenated form of a string (`{{ lastname|slug }}`).
//! - **`truncate`**: truncate a string to a maximum byte length at a
//!   character boundary, as `truncate(value, n)` or `{{ value|truncate: n }}`.
//!
//! Every value is HTML-escaped as it is written into the markup. A field the
//! record does not define renders as an empty string and is false in
//! `{% if %}` blocks.

use crate::error::{ErrorKind, Result};
use crate::record::Record;
use exn::ResultExt;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use tracing::instrument;
use upon::{Engine, ValueAccess, ValueMember};

/// Source file names, in order of preference.
pub const SOURCE_FILES: [&str; 3] = ["template.html", "template.hbs", "template.htm"];
pub const OPTIONS_FILE: &str = "options.json";
/// Option key holding the URL relative assets resolve against.
pub const BASE_OPTION: &str = "base";

/// Arbitrary rendering options read from `options.json`.
pub type Options = Map<String, Value>;

/// A compiled template together with its rendering options.
///
/// Construction either succeeds completely or leaves nothing behind; a loaded
/// template is immutable and can render any number of records.
pub struct Template {
    name: String,
    engine: Engine<'static>,
    template: upon::Template<'static>,
    options: Options,
}

impl Template {
    /// Resolves `<dir>/<name>/`, reads the template source and `options.json`,
    /// and compiles the source.
    ///
    /// The returned options carry a computed [`BASE_OPTION`] pointing at the
    /// template directory, unless `options.json` sets one itself.
    #[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
    pub async fn load(dir: impl AsRef<Path>, name: &str) -> Result<Self> {
        validate_name(name)?;
        let requested = dir.as_ref().join(name);
        let directory = match tokio::fs::canonicalize(&requested).await {
            Ok(path) => path,
            Err(e) => {
                let kind = ErrorKind::from_io(&e, &requested);
                return Err(e).or_raise(|| kind);
            },
        };
        if !directory.is_dir() {
            exn::bail!(ErrorKind::NotFound(requested));
        }

        let source_path = find_source(&directory).await?;
        let source = read(&source_path).await?;
        let options_path = directory.join(OPTIONS_FILE);
        let options = read(&options_path).await?;
        let mut options = match serde_json::from_str::<Value>(&options) {
            Ok(Value::Object(map)) => map,
            Ok(_) => exn::bail!(ErrorKind::Options(options_path)),
            Err(e) => return Err(e).or_raise(|| ErrorKind::Options(options_path)),
        };
        if !options.contains_key(BASE_OPTION) {
            options.insert(BASE_OPTION.to_string(), Value::String(base_url(&directory)));
        }

        let mut engine = Engine::new();
        addons::configure(&mut engine);
        // Compile now so syntax errors surface before any record is rendered.
        let template = engine.compile(source).or_raise(|| ErrorKind::Syntax(source_path.clone()))?;
        tracing::debug!(source = %source_path.display(), options = options.len(), "Template loaded");

        Ok(Self { name: name.to_string(), engine, template, options })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// The `file://` URL that relative assets inside the template resolve against.
    pub fn base_url(&self) -> &str {
        self.options.get(BASE_OPTION).and_then(Value::as_str).unwrap_or_default()
    }

    /// Substitutes a record into the template, producing markup.
    pub fn render(&self, record: &Record) -> Result<String> {
        let globals = match upon::to_value(record) {
            Ok(value) => value,
            Err(e) => {
                let kind = self.render_error(&e);
                return Err(e).or_raise(|| kind);
            },
        };
        match self.template.render_from_fn(&self.engine, move |path| Ok(lookup(&globals, path))).to_string() {
            Ok(markup) => Ok(markup),
            Err(e) => {
                let kind = self.render_error(&e);
                Err(e).or_raise(|| kind)
            },
        }
    }

    fn render_error(&self, err: &upon::Error) -> ErrorKind {
        ErrorKind::Render { template: self.name.clone(), reason: describe(err) }
    }
}

/// Resolves a field path against the record, yielding `None` for anything
/// the record does not define.
fn lookup(globals: &upon::Value, path: &[ValueMember<'_>]) -> upon::Value {
    let mut value = globals;
    for member in path {
        let next = match (value, &member.access) {
            (upon::Value::Map(map), ValueAccess::Key(key)) => map.get(*key),
            (upon::Value::List(items), ValueAccess::Index(index)) => items.get(*index),
            _ => None,
        };
        match next {
            Some(next) => value = next,
            None => return upon::Value::None,
        }
    }
    value.clone()
}

/// The engine's message, followed by the expression it points at when the
/// error carries a source location.
fn describe(err: &upon::Error) -> String {
    let pretty = format!("{err:#}");
    let lines: Vec<&str> = pretty.lines().collect();
    let expression = lines.windows(2).find_map(|pair| {
        let (_, text) = pair[0].split_once(" | ")?;
        let (_, marks) = pair[1].split_once(" | ")?;
        let start = marks.find('^')?;
        let width = marks[start..].chars().take_while(|&c| c == '^').count();
        let expression: String = text.chars().skip(start).take(width).collect();
        Some(expression.trim().to_string()).filter(|e| !e.is_empty())
    });
    match expression {
        Some(expression) => format!("{err} in `{expression}`"),
        None => err.to_string(),
    }
}

fn validate_name(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => exn::bail!(ErrorKind::InvalidName(name.to_string())),
    }
}

async fn find_source(directory: &Path) -> Result<PathBuf> {
    for candidate in SOURCE_FILES {
        let path = directory.join(candidate);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(path);
        }
    }
    exn::bail!(ErrorKind::NotFound(directory.join(SOURCE_FILES[0])));
}

async fn read(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) => {
            let kind = ErrorKind::from_io(&e, path);
            Err(e).or_raise(|| kind)
        },
    }
}

fn base_url(directory: &Path) -> String {
    let path = directory.to_string_lossy().replace('\\', "/");
    format!("file://{}/", path.trim_end_matches('/'))
}

/// Custom [`upon`] extensions for formatting record values.
mod addons {
    use rslug::slugify;
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// Writes strings HTML-escaped and everything else as-is.
    fn escape(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => f.write_str(&escape_html(s))?,
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    fn transform(f: &mut upon_fmt::Formatter<'_>, value: &Value, op: impl Fn(&str) -> String) -> upon_fmt::Result {
        match value {
            Value::String(s) => f.write_str(&escape_html(&op(s)))?,
            v => escape(f, v)?,
        };
        Ok(())
    }

    fn upper(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        transform(f, value, str::to_uppercase)
    }

    fn lower(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        transform(f, value, str::to_lowercase)
    }

    /// First character of a string.
    fn initial(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        transform(f, value, |s| s.chars().take(1).collect())
    }

    fn slug(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        transform(f, value, |s| slugify!(s))
    }

    /// Truncates a string to a maximum byte length at a character boundary.
    fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> String {
        s[..s.floor_char_boundary(max_bytes)].to_string()
    }

    pub(crate) fn escape_html(s: &str) -> String {
        let mut escaped = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#x27;"),
                '`' => escaped.push_str("&#x60;"),
                '=' => escaped.push_str("&#x3D;"),
                c => escaped.push(c),
            }
        }
        escaped
    }

    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.set_default_formatter(&escape);
        engine.add_formatter("upper", upper);
        engine.add_formatter("lower", lower);
        engine.add_formatter("initial", initial);
        engine.add_formatter("slug", slug);
        engine.add_function("truncate", truncate_to_char_boundary);
    }

}
