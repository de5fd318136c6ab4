//! Embedded assets for rendering.
//!
//! This module provides access to CSS styles that are embedded into the
//! binary at compile time using [`rust-embed`](rust_embed).

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use rust_embed::Embed;
use std::borrow::Cow;

#[derive(Embed)]
#[folder = "../../assets/styles/"]
pub struct Builtins;
impl Builtins {
    /// Get the CSS content for a builtin style by name.
    pub fn load(name: impl AsRef<str>) -> Result<Cow<'static, [u8]>> {
        let name = Self::strip(name.as_ref());
        Self::get(name).map(|f| f.data).ok_or_raise(|| ErrorKind::AssetNotFound(Self::identifier(name)))
    }

    pub fn exists(name: impl AsRef<str>) -> bool {
        Self::get(Self::strip(name.as_ref())).is_some()
    }

    pub(crate) fn identifier(name: impl AsRef<str>) -> String {
        format!("builtin:{}", Self::strip(name.as_ref()))
    }

    fn strip(name: &str) -> &str {
        name.trim().trim_start_matches("builtin:")
    }
}
