//! Shared doubles for the daemon suites.

use std::sync::{Arc, Mutex};

use mockall::mock;
use muster_config::{LayeredProperties, PropertyError, PropertyMap};
use muster_core::{
    BootstrapError as LifecycleFailure, HealthStatus, LifecycleObserver, Phase,
    ServiceDefinition, ShutdownReport,
};

use crate::bootstrap::{BootstrapError, PropertyLoader, ServerSettings};
use crate::health::HealthReporter;
use crate::process::{ShutdownError, ShutdownSignal};

mock! {
    pub Signal {}
    impl ShutdownSignal for Signal {
        fn wait(&self) -> Result<(), ShutdownError>;
    }
}

/// Properties booting the template service against a fictional database.
pub fn template_properties() -> PropertyMap {
    PropertyMap::new()
        .with("server.port", "8080")
        .with("server.context_path", "/api")
        .with("log.format", "compact")
        .with("api.baseurl", "//localhost:8080/api")
        .with("db.url", "jdbc:postgresql://db/template")
        .with("db.driverClassName", "org.postgresql.Driver")
        .with("db.username", "template")
        .with("db.password", "secret")
}

/// Loader whose only source cannot be read.
pub struct FailingPropertyLoader;

impl PropertyLoader for FailingPropertyLoader {
    fn load(&self) -> Result<LayeredProperties, PropertyError> {
        Err(PropertyError::Missing {
            key: String::from("properties file"),
        })
    }
}

/// Lifecycle and daemon events, as recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    ServiceStarting(String),
    PhaseStarting(Phase),
    AddonProcessed(Phase, String),
    PhaseCompleted(Phase),
    LifecycleFailed(Phase),
    ServiceReady(u16),
    ServiceFailed(String),
    HealthChecked { check: String, healthy: bool },
    ServiceStopped { stopped: usize, failed: usize },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    /// Phases that started, in order.
    pub fn phases(&self) -> Vec<Phase> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                HealthEvent::PhaseStarting(phase) => Some(phase),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl LifecycleObserver for RecordingHealthReporter {
    fn phase_starting(&self, phase: Phase, _order: &[String]) {
        self.record(HealthEvent::PhaseStarting(phase));
    }

    fn addon_processed(&self, phase: Phase, addon: &str) {
        self.record(HealthEvent::AddonProcessed(phase, addon.to_owned()));
    }

    fn phase_completed(&self, phase: Phase) {
        self.record(HealthEvent::PhaseCompleted(phase));
    }

    fn bootstrap_failed(&self, error: &LifecycleFailure) {
        self.record(HealthEvent::LifecycleFailed(error.phase()));
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn service_starting(&self, definition: &ServiceDefinition) {
        self.record(HealthEvent::ServiceStarting(definition.name().to_owned()));
    }

    fn service_ready(&self, _definition: &ServiceDefinition, settings: &ServerSettings) {
        self.record(HealthEvent::ServiceReady(settings.port()));
    }

    fn service_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::ServiceFailed(error.to_string()));
    }

    fn health_checked(&self, check: &str, status: &HealthStatus) {
        self.record(HealthEvent::HealthChecked {
            check: check.to_owned(),
            healthy: status.is_healthy(),
        });
    }

    fn service_stopped(&self, _definition: &ServiceDefinition, report: &ShutdownReport) {
        self.record(HealthEvent::ServiceStopped {
            stopped: report.stopped().len(),
            failed: report.failures().len(),
        });
    }
}
