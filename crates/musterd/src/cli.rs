//! Command-line interface of the daemon.

use camino::Utf8PathBuf;
use clap::Parser;
use muster_config::{DEFAULT_ENV_PREFIX, LogFormat};

use crate::process::RunMode;

/// Arguments accepted by `musterd`.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "musterd", version, about = "Boots a service from its addons")]
pub struct Cli {
    /// Properties file consulted beneath environment variables.
    #[arg(long, value_name = "PATH")]
    pub properties: Option<Utf8PathBuf>,

    /// Prefix of environment variables holding properties.
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_ENV_PREFIX)]
    pub env_prefix: String,

    /// Log filter expression, overriding `log.filter`.
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    /// Log output format (`json` or `compact`), overriding `log.format`.
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Boot, evaluate the health checks once, and shut down.
    #[arg(long)]
    pub check: bool,
}

impl Cli {
    /// How the daemon should run after bootstrapping.
    #[must_use]
    pub const fn run_mode(&self) -> RunMode {
        if self.check {
            RunMode::Check
        } else {
            RunMode::Serve
        }
    }
}
