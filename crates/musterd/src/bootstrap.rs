//! Service bootstrap orchestration.

use std::fmt;
use std::sync::Arc;

use camino::Utf8PathBuf;
use muster_config::{
    EnvProperties, KEY_LOG_FILTER, KEY_LOG_FORMAT, LayeredProperties, LogSettings, PropertyError,
    PropertyFile, PropertyMap, PropertyProvider, parse_property,
};
use muster_core::{
    AddonRepo, BindingTable, HealthStatus, Lifecycle, LifecycleObserver, MountTable,
    RunningService, ServiceConfig, ServiceDefinition, ShutdownReport,
};
use thiserror::Error;

use crate::cli::Cli;
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Property key holding the port the service listens on.
pub const KEY_SERVER_PORT: &str = "server.port";

/// Property key holding the path every route is mounted under.
pub const KEY_SERVER_CONTEXT_PATH: &str = "server.context_path";

/// Trait abstracting property loading for testability.
pub trait PropertyLoader: Send + Sync {
    /// Loads the effective properties, highest precedence first.
    ///
    /// # Errors
    ///
    /// Returns a [`PropertyError`] when a source cannot be read.
    fn load(&self) -> Result<LayeredProperties, PropertyError>;
}

/// Loader reading command-line overrides, then the environment, then an
/// optional properties file.
#[derive(Debug, Clone)]
pub struct SystemPropertyLoader {
    env_prefix: String,
    file: Option<Utf8PathBuf>,
    overrides: PropertyMap,
}

impl SystemPropertyLoader {
    /// Reads variables prefixed with `env_prefix`.
    #[must_use]
    pub fn new(env_prefix: impl Into<String>) -> Self {
        Self {
            env_prefix: env_prefix.into(),
            file: None,
            overrides: PropertyMap::new(),
        }
    }

    /// Consults `path` beneath the environment.
    #[must_use]
    pub fn with_file(self, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            file: Some(path.into()),
            ..self
        }
    }

    /// Pins `key` to `value` above every other source.
    #[must_use]
    pub fn with_override(mut self, key: &str, value: impl Into<String>) -> Self {
        self.overrides.insert(key, value);
        self
    }

    /// Builds the loader described by the command line.
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        let mut loader = Self::new(cli.env_prefix.as_str());
        if let Some(path) = &cli.properties {
            loader = loader.with_file(path.clone());
        }
        if let Some(filter) = &cli.log_filter {
            loader = loader.with_override(KEY_LOG_FILTER, filter.as_str());
        }
        if let Some(format) = cli.log_format {
            loader = loader.with_override(KEY_LOG_FORMAT, format.to_string());
        }
        loader
    }
}

impl PropertyLoader for SystemPropertyLoader {
    fn load(&self) -> Result<LayeredProperties, PropertyError> {
        let mut properties = LayeredProperties::new()
            .layer(self.overrides.clone())
            .layer(EnvProperties::from_env(&self.env_prefix));
        if let Some(path) = &self.file {
            properties = properties.layer(PropertyFile::load(path)?);
        }
        Ok(properties)
    }
}

/// Loader serving a fixed property map.
#[derive(Debug, Clone, Default)]
pub struct StaticPropertyLoader {
    properties: PropertyMap,
}

impl StaticPropertyLoader {
    /// Serves `properties` on every load.
    #[must_use]
    pub const fn new(properties: PropertyMap) -> Self {
        Self { properties }
    }
}

impl PropertyLoader for StaticPropertyLoader {
    fn load(&self) -> Result<LayeredProperties, PropertyError> {
        Ok(LayeredProperties::new().layer(self.properties.clone()))
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Properties failed to load.
    #[error("failed to load properties: {source}")]
    Properties {
        /// Underlying property error.
        #[source]
        source: PropertyError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Server settings were absent or malformed.
    #[error("invalid server settings: {source}")]
    Server {
        /// Underlying property error.
        #[source]
        source: PropertyError,
    },
    /// An addon failed during the lifecycle.
    #[error(transparent)]
    Lifecycle {
        /// Failure reported by the orchestrator.
        #[from]
        source: muster_core::BootstrapError,
    },
}

/// Where and how the service is served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    port: u16,
    context_path: String,
}

impl ServerSettings {
    /// Reads `server.port` and `server.context_path`, both required.
    ///
    /// # Errors
    ///
    /// Returns [`PropertyError::MissingKeys`] naming every absent key, or
    /// [`PropertyError::Invalid`] when the port is not a valid port number.
    pub fn from_properties(properties: &dyn PropertyProvider) -> Result<Self, PropertyError> {
        properties.fail_if_not_present(&[KEY_SERVER_PORT, KEY_SERVER_CONTEXT_PATH])?;
        let port = parse_property(properties, KEY_SERVER_PORT, None)?;
        let context_path = properties.require(KEY_SERVER_CONTEXT_PATH)?;
        Ok(Self { port, context_path })
    }

    /// Listening port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Path every route is mounted under.
    #[must_use]
    pub fn context_path(&self) -> &str {
        &self.context_path
    }
}

/// Result of a successful bootstrap invocation.
pub struct Service {
    definition: ServiceDefinition,
    settings: ServerSettings,
    running: RunningService,
    bindings: BindingTable,
    server: MountTable,
    telemetry: TelemetryHandle,
    reporter: Arc<dyn HealthReporter>,
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("definition", &self.definition)
            .field("settings", &self.settings)
            .field("running", &self.running)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

impl Service {
    /// Name and version of the service.
    #[must_use]
    pub const fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    /// Resolved server settings.
    #[must_use]
    pub const fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Bindings exported by the addons.
    #[must_use]
    pub const fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Health checks and routes mounted by the addons.
    #[must_use]
    pub const fn server(&self) -> &MountTable {
        &self.server
    }

    /// The finalized addons, in registration order.
    #[must_use]
    pub const fn addons(&self) -> &AddonRepo {
        self.running.addons()
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Evaluates every mounted health check and reports each result.
    #[must_use]
    pub fn check_health(&self) -> Vec<(String, HealthStatus)> {
        let results = self.server.run_health_checks();
        for (check, status) in &results {
            self.reporter.health_checked(check, status);
        }
        results
    }

    /// Shuts every addon down in reverse registration order.
    #[must_use]
    pub fn shutdown(self) -> ShutdownReport {
        let report = self.running.shutdown();
        self.reporter.service_stopped(&self.definition, &report);
        report
    }
}

/// Bootstraps `config` using the supplied collaborators.
///
/// # Errors
///
/// Returns a [`BootstrapError`] for the first step that fails; the failure
/// is also passed to `reporter`.
pub fn bootstrap_with(
    loader: &dyn PropertyLoader,
    reporter: Arc<dyn HealthReporter>,
    config: ServiceConfig,
) -> Result<Service, BootstrapError> {
    let (definition, repo) = config.into_parts();
    reporter.service_starting(&definition);

    let observer: Arc<dyn LifecycleObserver> = Arc::new(Arc::clone(&reporter));
    match mount(loader, observer, repo) {
        Ok(mounted) => {
            reporter.service_ready(&definition, &mounted.settings);
            Ok(Service {
                definition,
                settings: mounted.settings,
                running: mounted.running,
                bindings: mounted.bindings,
                server: mounted.server,
                telemetry: mounted.telemetry,
                reporter,
            })
        }
        Err(error) => {
            reporter.service_failed(&error);
            Err(error)
        }
    }
}

struct Mounted {
    settings: ServerSettings,
    running: RunningService,
    bindings: BindingTable,
    server: MountTable,
    telemetry: TelemetryHandle,
}

fn mount(
    loader: &dyn PropertyLoader,
    observer: Arc<dyn LifecycleObserver>,
    repo: AddonRepo,
) -> Result<Mounted, BootstrapError> {
    let properties = loader
        .load()
        .map_err(|source| BootstrapError::Properties { source })?;

    let log_settings = LogSettings::from_properties(&properties)
        .map_err(|source| BootstrapError::Properties { source })?;
    let telemetry = telemetry::initialise(&log_settings)
        .map_err(|source| BootstrapError::Telemetry { source })?;

    let settings = ServerSettings::from_properties(&properties)
        .map_err(|source| BootstrapError::Server { source })?;

    let mut bindings = BindingTable::new();
    let mut server = MountTable::new(settings.context_path());
    let running =
        Lifecycle::with_observer(observer).run(repo, &properties, &mut bindings, &mut server)?;

    Ok(Mounted {
        settings,
        running,
        bindings,
        server,
        telemetry,
    })
}
