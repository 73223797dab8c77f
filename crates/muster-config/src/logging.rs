use strum::{Display, EnumString};

use crate::defaults::{DEFAULT_LOG_FILTER, KEY_LOG_FILTER, KEY_LOG_FORMAT, default_log_format};
use crate::provider::{PropertyError, PropertyProvider, parse_property};

/// Supported logging output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// Structured JSON suitable for ingestion by logging stacks.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Logging settings resolved from properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    filter: String,
    format: LogFormat,
}

impl LogSettings {
    /// Creates settings from explicit values.
    #[must_use]
    pub fn new(filter: impl Into<String>, format: LogFormat) -> Self {
        Self {
            filter: filter.into(),
            format,
        }
    }

    /// Reads `log.filter` and `log.format`, falling back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::Invalid`] when `log.format` names an
    /// unsupported format.
    pub fn from_properties(properties: &dyn PropertyProvider) -> Result<Self, PropertyError> {
        let filter = properties
            .get(KEY_LOG_FILTER)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());
        let format = parse_property(properties, KEY_LOG_FORMAT, Some(default_log_format()))?;
        Ok(Self { filter, format })
    }

    /// Returns the filter expression.
    #[must_use]
    pub const fn filter(&self) -> &str {
        self.filter.as_str()
    }

    /// Returns the output format.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_FILTER, default_log_format())
    }
}
