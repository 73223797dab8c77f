//! Runs a bootstrapped service until it is told to stop.

use std::io;
use std::sync::Arc;

use muster_core::ServiceConfig;
use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{info, warn};

use crate::bootstrap::{BootstrapError, PropertyLoader, SystemPropertyLoader, bootstrap_with};
use crate::cli::Cli;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::template::template_service;

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// What the daemon does once the service is mounted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Serve until a termination signal arrives.
    Serve,
    /// Evaluate the health checks once and stop.
    Check,
}

/// Abstraction over shutdown notification mechanisms.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until shutdown should proceed.
    ///
    /// # Errors
    ///
    /// Returns a [`ShutdownError`] when the notification cannot be awaited.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Errors reported by shutdown signal listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Shutdown listener that waits for termination signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new([SIGTERM, SIGINT, SIGQUIT, SIGHUP])
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(target: PROCESS_TARGET, signal, "shutdown signal received");
        }
        Ok(())
    }
}

/// Errors surfaced while running the daemon.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// The service failed to bootstrap.
    #[error(transparent)]
    Bootstrap {
        /// Underlying bootstrap error.
        #[from]
        source: BootstrapError,
    },
    /// Waiting for the shutdown signal failed.
    #[error(transparent)]
    Signal {
        /// Underlying signal error.
        #[from]
        source: ShutdownError,
    },
    /// A health check failed in [`RunMode::Check`].
    #[error("unhealthy checks: {}", .checks.join(", "))]
    Unhealthy {
        /// Names of the failing checks.
        checks: Vec<String>,
    },
}

/// Runs the template service as described by the command line.
///
/// # Errors
///
/// Returns a [`LaunchError`] when the service fails to start, a check fails
/// in check mode, or signal handling cannot be installed.
pub fn run(cli: &Cli) -> Result<(), LaunchError> {
    run_with(
        &SystemPropertyLoader::from_cli(cli),
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal,
        template_service(),
        cli.run_mode(),
    )
}

/// Runs `config` with injected collaborators.
///
/// The service is shut down before returning, whether or not the health
/// checks or the signal listener succeeded.
///
/// # Errors
///
/// Returns a [`LaunchError`] as described for [`run`].
pub fn run_with(
    loader: &dyn PropertyLoader,
    reporter: Arc<dyn HealthReporter>,
    signal: &dyn ShutdownSignal,
    config: ServiceConfig,
    mode: RunMode,
) -> Result<(), LaunchError> {
    info!(target: PROCESS_TARGET, ?mode, "starting service runtime");
    let service = bootstrap_with(loader, reporter, config)?;

    let unhealthy: Vec<String> = service
        .check_health()
        .into_iter()
        .filter(|(_, status)| !status.is_healthy())
        .map(|(check, _)| check)
        .collect();

    let outcome = match mode {
        RunMode::Check if unhealthy.is_empty() => Ok(()),
        RunMode::Check => Err(LaunchError::Unhealthy { checks: unhealthy }),
        RunMode::Serve => signal.wait().map_err(LaunchError::from),
    };

    let report = service.shutdown();
    for failure in report.failures() {
        warn!(
            target: PROCESS_TARGET,
            addon = %failure.addon,
            error = %failure.error,
            "addon did not shut down cleanly"
        );
    }
    outcome
}

