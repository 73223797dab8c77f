//! Concrete property sources.
//!
//! The daemon layers these: environment variables take precedence over a
//! properties file, which in turn takes precedence over built-in values.

mod file;

use std::collections::BTreeMap;

use crate::defaults::DEFAULT_ENV_PREFIX;
use crate::provider::PropertyProvider;

pub use self::file::PropertyFile;

// ---------------------------------------------------------------------------
// PropertyMap
// ---------------------------------------------------------------------------

/// In-memory property source.
///
/// # Example
///
/// ```
/// use muster_config::{PropertyMap, PropertyProvider};
///
/// let properties = PropertyMap::new().with("server.port", "8080");
/// assert_eq!(properties.get("server.port").as_deref(), Some("8080"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    values: BTreeMap<String, String>,
}

impl PropertyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the map with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.values.insert(key.into(), value.into())
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when the map holds no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl PropertyProvider for PropertyMap {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<K, V> FromIterator<(K, V)> for PropertyMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// EnvProperties
// ---------------------------------------------------------------------------

/// Property source backed by environment variables.
///
/// The key `db.url` maps to `<PREFIX>_DB_URL`: dots and dashes become
/// underscores and the result is upper-cased. Variables are snapshotted at
/// construction so lookups are stable for the whole bootstrap.
#[derive(Debug, Clone, Default)]
pub struct EnvProperties {
    prefix: String,
    values: BTreeMap<String, String>,
}

impl EnvProperties {
    /// Snapshots the process environment using `prefix`.
    #[must_use]
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, std::env::vars())
    }

    /// Snapshots the process environment using the default prefix.
    #[must_use]
    pub fn with_default_prefix() -> Self {
        Self::from_env(DEFAULT_ENV_PREFIX)
    }

    /// Builds a source from explicit variables, keeping those with `prefix`.
    #[must_use]
    pub fn from_vars<I, K, V>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let marker = format!("{}_", prefix.to_ascii_uppercase());
        let values = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _)| k.starts_with(&marker))
            .collect();
        Self {
            prefix: prefix.to_ascii_uppercase(),
            values,
        }
    }

    /// Returns the environment variable name for a property key.
    #[must_use]
    pub fn variable_name(&self, key: &str) -> String {
        let suffix: String = key
            .chars()
            .map(|c| match c {
                '.' | '-' => '_',
                other => other.to_ascii_uppercase(),
            })
            .collect();
        format!("{}_{suffix}", self.prefix)
    }
}

impl PropertyProvider for EnvProperties {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(&self.variable_name(key)).cloned()
    }
}

// ---------------------------------------------------------------------------
// LayeredProperties
// ---------------------------------------------------------------------------

/// Ordered stack of sources; the first source holding a key wins.
#[derive(Default)]
pub struct LayeredProperties {
    layers: Vec<Box<dyn PropertyProvider + Send + Sync>>,
}

impl LayeredProperties {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a lower-precedence layer.
    #[must_use]
    pub fn layer(mut self, source: impl PropertyProvider + Send + Sync + 'static) -> Self {
        self.layers.push(Box::new(source));
        self
    }

    /// Returns the number of layers.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.layers.len()
    }
}

impl std::fmt::Debug for LayeredProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayeredProperties")
            .field("depth", &self.layers.len())
            .finish()
    }
}

impl PropertyProvider for LayeredProperties {
    fn get(&self, key: &str) -> Option<String> {
        self.layers.iter().find_map(|layer| layer.get(key))
    }
}
