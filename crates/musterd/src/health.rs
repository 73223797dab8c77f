//! Structured health reporting for service lifecycle events.

use std::sync::Arc;

use muster_core::{
    BootstrapError as LifecycleFailure, HealthStatus, LifecycleObserver, Phase,
    ServiceDefinition, ShutdownReport,
};

use crate::bootstrap::{BootstrapError, ServerSettings};

const TARGET: &str = "musterd::health";

/// Observer surfacing daemon and lifecycle events to telemetry sinks.
pub trait HealthReporter: LifecycleObserver {
    /// Invoked before properties are loaded.
    fn service_starting(&self, definition: &ServiceDefinition);

    /// Invoked once every addon is mounted.
    fn service_ready(&self, definition: &ServiceDefinition, settings: &ServerSettings);

    /// Invoked when the bootstrap fails.
    fn service_failed(&self, error: &BootstrapError);

    /// Invoked for every evaluated health check.
    fn health_checked(&self, check: &str, status: &HealthStatus);

    /// Invoked after the shutdown sweep.
    fn service_stopped(&self, definition: &ServiceDefinition, report: &ShutdownReport);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn service_starting(&self, definition: &ServiceDefinition) {
        (**self).service_starting(definition);
    }

    fn service_ready(&self, definition: &ServiceDefinition, settings: &ServerSettings) {
        (**self).service_ready(definition, settings);
    }

    fn service_failed(&self, error: &BootstrapError) {
        (**self).service_failed(error);
    }

    fn health_checked(&self, check: &str, status: &HealthStatus) {
        (**self).health_checked(check, status);
    }

    fn service_stopped(&self, definition: &ServiceDefinition, report: &ShutdownReport) {
        (**self).service_stopped(definition, report);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl LifecycleObserver for StructuredHealthReporter {
    fn phase_starting(&self, phase: Phase, order: &[String]) {
        tracing::info!(
            target: TARGET,
            event = "phase_starting",
            phase = %phase,
            addons = order.len(),
            order = ?order,
            "lifecycle phase starting"
        );
    }

    fn addon_processed(&self, phase: Phase, addon: &str) {
        tracing::debug!(
            target: TARGET,
            event = "addon_processed",
            phase = %phase,
            addon,
            "addon completed phase"
        );
    }

    fn phase_completed(&self, phase: Phase) {
        tracing::info!(
            target: TARGET,
            event = "phase_completed",
            phase = %phase,
            "lifecycle phase completed"
        );
    }

    fn bootstrap_failed(&self, error: &LifecycleFailure) {
        tracing::error!(
            target: TARGET,
            event = "lifecycle_failed",
            phase = %error.phase(),
            addon = error.addon().unwrap_or("-"),
            error = %error,
            "lifecycle aborted"
        );
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn service_starting(&self, definition: &ServiceDefinition) {
        tracing::info!(
            target: TARGET,
            event = "service_starting",
            service = definition.name(),
            version = %definition.version(),
            "starting service bootstrap"
        );
    }

    fn service_ready(&self, definition: &ServiceDefinition, settings: &ServerSettings) {
        tracing::info!(
            target: TARGET,
            event = "service_ready",
            service = definition.name(),
            port = settings.port(),
            context_path = settings.context_path(),
            "service bootstrap completed"
        );
    }

    fn service_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: TARGET,
            event = "service_failed",
            error = %error,
            "service bootstrap failed"
        );
    }

    fn health_checked(&self, check: &str, status: &HealthStatus) {
        match status {
            HealthStatus::Healthy => tracing::info!(
                target: TARGET,
                event = "health_checked",
                check,
                healthy = true,
                "health check passed"
            ),
            HealthStatus::Unhealthy(reason) => tracing::warn!(
                target: TARGET,
                event = "health_checked",
                check,
                healthy = false,
                reason = %reason,
                "health check failed"
            ),
        }
    }

    fn service_stopped(&self, definition: &ServiceDefinition, report: &ShutdownReport) {
        tracing::info!(
            target: TARGET,
            event = "service_stopped",
            service = definition.name(),
            stopped = report.stopped().len(),
            failed = report.failures().len(),
            "service shut down"
        );
    }
}
