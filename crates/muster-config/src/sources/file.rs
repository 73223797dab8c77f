//! Properties files in `key=value` form.
//!
//! Lines are trimmed; blank lines and lines starting with `#` or `!` are
//! comments. The first `=` or `:` separates key from value. A later
//! assignment of the same key overrides an earlier one.

use std::fs;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};

use super::PropertyMap;
use crate::provider::{PropertyError, PropertyProvider};

/// Properties loaded from a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFile {
    path: Utf8PathBuf,
    values: PropertyMap,
}

impl PropertyFile {
    /// Reads and parses the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Io`] if the file cannot be read.
    pub fn load(path: &Utf8Path) -> Result<Self, PropertyError> {
        let text = fs::read_to_string(path).map_err(|source| PropertyError::Io {
            path: path.to_path_buf(),
            source: Arc::new(source),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            values: parse(&text),
        })
    }

    /// Parses properties from text that did not come from a file.
    #[must_use]
    pub fn from_text(path: impl Into<Utf8PathBuf>, text: &str) -> Self {
        Self {
            path: path.into(),
            values: parse(text),
        }
    }

    /// Returns the path the properties were read from.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Returns the parsed properties.
    #[must_use]
    pub const fn values(&self) -> &PropertyMap {
        &self.values
    }
}

impl PropertyProvider for PropertyFile {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key)
    }
}

fn parse(text: &str) -> PropertyMap {
    let mut values = PropertyMap::new();
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = line
            .split_once(['=', ':'])
            .map_or((line, ""), |(name, rest)| (name.trim(), rest.trim()));
        if !key.is_empty() {
            values.insert(key, value);
        }
    }
    values
}
