//! Page setup derived from a template's rendering options.
//!
//! Recognised keys follow the conventions of `html-pdf` style option files:
//!
//! | Key           | Type                                   | Example                     |
//! |---------------|----------------------------------------|-----------------------------|
//! | `format`      | `A3`, `A4`, `A5`, `Legal`, `Letter`, `Tabloid` | `"A4"`              |
//! | `orientation` | `portrait` or `landscape`              | `"landscape"`               |
//! | `width`       | CSS length (number means pixels)       | `"85.6mm"`                  |
//! | `height`      | CSS length (number means pixels)       | `"53.98mm"`                 |
//! | `border`      | CSS length, or `{top,right,bottom,left}` | `"2mm"`                   |
//! | `zoomFactor`  | number                                 | `"1.5"`                     |
//! | `timeout`     | milliseconds                           | `10000`                     |
//! | `stylesheets` | builtin names or relative URLs         | `["card.css", "extra.css"]` |
//!
//! Any other key (including `base`) is ignored here.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageSetup {
    /// Value of the `@page` `size` descriptor.
    pub size: Option<String>,
    /// Value of the `@page` `margin` descriptor.
    pub margin: Option<String>,
    pub zoom: Option<f64>,
    pub timeout: Option<Duration>,
    pub stylesheets: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLength {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBorder {
    Uniform(RawLength),
    Sides {
        top: Option<RawLength>,
        right: Option<RawLength>,
        bottom: Option<RawLength>,
        left: Option<RawLength>,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

impl PageSetup {
    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        let format = field::<String>(options, "format")?.map(|f| paper_size(&f)).transpose()?;
        let orientation = field::<String>(options, "orientation")?.map(|o| orientation(&o)).transpose()?;
        let width = field::<RawLength>(options, "width")?.map(|l| length(l, "width")).transpose()?;
        let height = field::<RawLength>(options, "height")?.map(|l| length(l, "height")).transpose()?;

        let size = match (width, height, format, orientation) {
            (Some(w), Some(h), _, _) => Some(format!("{w} {h}")),
            (Some(_), None, _, _) | (None, Some(_), _, _) => {
                exn::bail!(ErrorKind::InvalidOption("width/height".into()))
            },
            (None, None, Some(f), Some(o)) => Some(format!("{f} {o}")),
            (None, None, Some(f), None) => Some(f.to_string()),
            (None, None, None, Some(o)) => Some(o.to_string()),
            (None, None, None, None) => None,
        };

        let margin = match field::<RawBorder>(options, "border")? {
            None => None,
            Some(RawBorder::Uniform(l)) => Some(length(l, "border")?),
            Some(RawBorder::Sides { top, right, bottom, left }) => {
                let side = |l: Option<RawLength>| l.map(|l| length(l, "border")).transpose().map(|l| l.unwrap_or_else(|| "0".into()));
                Some(format!("{} {} {} {}", side(top)?, side(right)?, side(bottom)?, side(left)?))
            },
        };

        let zoom = match field::<RawNumber>(options, "zoomFactor")? {
            None => None,
            Some(RawNumber::Number(n)) => Some(n),
            Some(RawNumber::Text(s)) => Some(s.trim().parse::<f64>().or_raise(|| ErrorKind::InvalidOption("zoomFactor".into()))?),
        };
        if zoom.is_some_and(|z| !z.is_finite() || z <= 0.0) {
            exn::bail!(ErrorKind::InvalidOption("zoomFactor".into()));
        }

        let timeout = match field::<u64>(options, "timeout")? {
            Some(0) => exn::bail!(ErrorKind::InvalidOption("timeout".into())),
            other => other.map(Duration::from_millis),
        };
        let stylesheets = field::<Vec<String>>(options, "stylesheets")?.unwrap_or_default();

        Ok(Self { size, margin, zoom, timeout, stylesheets })
    }

    /// CSS implementing this page setup, or `None` if nothing was configured.
    pub fn css(&self) -> Option<String> {
        let mut page = Vec::new();
        if let Some(size) = &self.size {
            page.push(format!("size: {size};"));
        }
        if let Some(margin) = &self.margin {
            page.push(format!("margin: {margin};"));
        }
        let mut css = String::new();
        if !page.is_empty() {
            css.push_str(&format!("@page {{ {} }}\n", page.join(" ")));
        }
        if let Some(zoom) = self.zoom {
            css.push_str(&format!("html {{ zoom: {zoom}; }}\n"));
        }
        (!css.is_empty()).then_some(css)
    }
}

fn field<T: DeserializeOwned>(options: &Map<String, Value>, key: &str) -> Result<Option<T>> {
    match options.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone()).map(Some).or_raise(|| ErrorKind::InvalidOption(key.to_string())),
    }
}

fn paper_size(format: &str) -> Result<&'static str> {
    Ok(match format.trim().to_ascii_lowercase().as_str() {
        "a3" => "A3",
        "a4" => "A4",
        "a5" => "A5",
        "legal" => "legal",
        "letter" => "letter",
        // No CSS keyword for tabloid.
        "tabloid" => "11in 17in",
        _ => exn::bail!(ErrorKind::InvalidOption("format".into())),
    })
}

fn orientation(orientation: &str) -> Result<&'static str> {
    Ok(match orientation.trim().to_ascii_lowercase().as_str() {
        "portrait" => "portrait",
        "landscape" => "landscape",
        _ => exn::bail!(ErrorKind::InvalidOption("orientation".into())),
    })
}

fn length(raw: RawLength, key: &str) -> Result<String> {
    const UNITS: [&str; 6] = ["mm", "cm", "in", "px", "pt", "pc"];
    match raw {
        RawLength::Number(n) if n.is_finite() && n >= 0.0 => Ok(format!("{n}px")),
        RawLength::Text(s) => {
            let s = s.trim();
            if s.parse::<f64>().is_ok_and(|n| n >= 0.0) {
                return Ok(format!("{s}px"));
            }
            let unit = UNITS.iter().find(|u| s.ends_with(*u));
            match unit.map(|u| s[..s.len() - u.len()].trim().parse::<f64>()) {
                Some(Ok(n)) if n >= 0.0 => Ok(s.to_string()),
                _ => exn::bail!(ErrorKind::InvalidOption(key.to_string())),
            }
        },
        RawLength::Number(_) => exn::bail!(ErrorKind::InvalidOption(key.to_string())),
    }
}
