//! Default values and well-known keys shared by the binaries.

use crate::logging::LogFormat;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Prefix applied to environment variables holding properties.
pub const DEFAULT_ENV_PREFIX: &str = "MUSTER";

/// Property key holding the log filter expression.
pub const KEY_LOG_FILTER: &str = "log.filter";

/// Property key holding the log output format.
pub const KEY_LOG_FORMAT: &str = "log.format";

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
