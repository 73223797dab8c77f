//! Property sources shared by the bootstrap core, the addons, and the daemon.
//!
//! Every addon reads its configuration through the [`PropertyProvider`]
//! contract. Values are opaque strings; each addon parses what it needs.
//! Named addons prefix their keys with `<name>.` (see [`prefixed_key`]) so
//! several instances of the same addon can be configured side by side.
//!
//! The crate ships the sources the daemon composes at startup: an in-memory
//! [`PropertyMap`], an environment-backed [`EnvProperties`], a
//! [`PropertyFile`] loader for `key=value` files, and [`LayeredProperties`]
//! for precedence between them.

mod defaults;
mod logging;
pub mod provider;
pub mod sources;

pub use defaults::{
    DEFAULT_ENV_PREFIX, DEFAULT_LOG_FILTER, KEY_LOG_FILTER, KEY_LOG_FORMAT, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError, LogSettings};
pub use provider::{PropertyError, PropertyProvider, parse_property, prefixed_key};
pub use sources::{EnvProperties, LayeredProperties, PropertyFile, PropertyMap};
