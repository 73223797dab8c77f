//! Daemon hosting a service composed of addons.
//!
//! `musterd` loads properties (environment over an optional properties
//! file), installs structured telemetry, reads the server settings, and then
//! drives the service's addons through the bootstrap lifecycle. Every
//! lifecycle event is reported through a [`HealthReporter`], which by
//! default emits structured `tracing` events under `musterd::health`.
//!
//! Once the service is mounted the daemon evaluates its health checks,
//! waits for a termination signal, and shuts every addon down in reverse
//! registration order.

mod bootstrap;
mod cli;
mod health;
mod process;
mod telemetry;
mod template;

pub use bootstrap::{
    BootstrapError, KEY_SERVER_CONTEXT_PATH, KEY_SERVER_PORT, PropertyLoader, ServerSettings,
    Service, StaticPropertyLoader, SystemPropertyLoader, bootstrap_with,
};
pub use cli::Cli;
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{
    LaunchError, RunMode, ShutdownError, ShutdownSignal, SystemShutdownSignal, run, run_with,
};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use template::{TEMPLATE_NAME, template_service};

#[cfg(test)]
mod tests;
