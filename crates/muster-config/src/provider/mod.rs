//! The property provider contract consumed by addons.
//!
//! Providers supply opaque text values. Lookups that must succeed go through
//! [`PropertyProvider::require`], [`PropertyProvider::require_with_fallback`]
//! or [`PropertyProvider::fail_if_not_present`], all of which fail fast with
//! a [`PropertyError`] naming the missing keys.

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while reading properties.
#[derive(Debug, Clone, Error)]
pub enum PropertyError {
    /// A required key was absent and no fallback was supplied.
    #[error("required property '{key}' is not set")]
    Missing {
        /// Key that was looked up.
        key: String,
    },

    /// Several required keys were absent.
    #[error("required properties are not set: {}", .keys.join(", "))]
    MissingKeys {
        /// Every key that was absent, in the order requested.
        keys: Vec<String>,
    },

    /// A value was present but could not be parsed.
    #[error("property '{key}' has invalid value '{value}': {message}")]
    Invalid {
        /// Key that was read.
        key: String,
        /// Raw value found for the key.
        value: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A properties file could not be read.
    #[error("failed to read properties file '{path}': {source}")]
    Io {
        /// File that was read.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },
}

impl PropertyError {
    /// Returns the offending keys, if the error concerns specific keys.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Self::Missing { key } | Self::Invalid { key, .. } => vec![key.as_str()],
            Self::MissingKeys { keys } => keys.iter().map(String::as_str).collect(),
            Self::Io { .. } => Vec::new(),
        }
    }
}

/// Source of configuration text values.
pub trait PropertyProvider {
    /// Returns the value for `key`, if present.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns the value for `key`, failing when it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Missing`] if the key is not present.
    fn require(&self, key: &str) -> Result<String, PropertyError> {
        self.get(key).ok_or_else(|| PropertyError::Missing {
            key: key.to_owned(),
        })
    }

    /// Returns the value for `key`, or `fallback` when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Missing`] if neither the key nor a fallback
    /// is present.
    fn require_with_fallback(
        &self,
        key: &str,
        fallback: Option<&str>,
    ) -> Result<String, PropertyError> {
        match (self.get(key), fallback) {
            (Some(value), _) => Ok(value),
            (None, Some(fallback)) => Ok(fallback.to_owned()),
            (None, None) => Err(PropertyError::Missing {
                key: key.to_owned(),
            }),
        }
    }

    /// Fails unless every key in `keys` is present.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::MissingKeys`] listing every absent key.
    fn fail_if_not_present(&self, keys: &[&str]) -> Result<(), PropertyError> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| self.get(key).is_none())
            .map(|key| (*key).to_owned())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PropertyError::MissingKeys { keys: missing })
        }
    }
}

impl<P> PropertyProvider for &P
where
    P: PropertyProvider + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<P> PropertyProvider for Box<P>
where
    P: PropertyProvider + ?Sized,
{
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Parses the value for `key`, using `fallback` when the key is absent.
///
/// # Errors
///
/// Returns [`PropertyError::Missing`] when neither a value nor a fallback is
/// available, or [`PropertyError::Invalid`] when the value does not parse.
pub fn parse_property<T>(
    properties: &dyn PropertyProvider,
    key: &str,
    fallback: Option<T>,
) -> Result<T, PropertyError>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = properties.get(key) else {
        return fallback.ok_or_else(|| PropertyError::Missing {
            key: key.to_owned(),
        });
    };
    raw.trim().parse().map_err(|error: T::Err| PropertyError::Invalid {
        key: key.to_owned(),
        value: raw.clone(),
        message: error.to_string(),
    })
}

/// Prefixes `key` with `<name>.` for named addons.
///
/// Empty or absent names leave the key untouched.
#[must_use]
pub fn prefixed_key(name: Option<&str>, key: &str) -> String {
    name.filter(|candidate| !candidate.trim().is_empty())
        .map_or_else(|| key.to_owned(), |prefix| format!("{prefix}.{key}"))
}
