//! Phase-by-phase orchestration of an addon repo.
//!
//! [`Lifecycle`] drives every addon through property resolution,
//! initialization, finalization, wiring, and mounting. Phases run strictly
//! one after another and, within a phase, addons run one at a time in the
//! order computed for that phase. The first failure aborts the bootstrap.

use std::fmt;
use std::sync::Arc;

use muster_config::PropertyProvider;
use strum::{Display, IntoStaticStr};
use tracing::{debug, error, info, warn};

use crate::addon::{Addon, AddonResult, describe};
use crate::binding::InjectionRegistry;
use crate::error::{AddonError, BootstrapError};
use crate::registry::AddonRepo;
use crate::resolver::resolve_order;
use crate::server::ServerHandle;

const TARGET: &str = "muster::lifecycle";

/// Stages an addon passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    /// Configuration is merged into each addon.
    PropertyResolution,
    /// Addons build their resources in dependency order.
    Initialize,
    /// Addons validate against their finalized siblings.
    Finalize,
    /// Addons export bindings.
    Wiring,
    /// Addons attach health checks and routes.
    Mount,
    /// Addons release their resources.
    Shutdown,
}

impl Phase {
    /// Returns the snake_case label used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Receives progress events from the orchestrator.
pub trait LifecycleObserver: Send + Sync {
    /// Invoked before a phase processes its first addon.
    fn phase_starting(&self, phase: Phase, order: &[String]);

    /// Invoked after an addon's hook for `phase` succeeded.
    fn addon_processed(&self, phase: Phase, addon: &str);

    /// Invoked after every addon completed `phase`.
    fn phase_completed(&self, phase: Phase);

    /// Invoked when the bootstrap aborts.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

impl<T> LifecycleObserver for Arc<T>
where
    T: LifecycleObserver + ?Sized,
{
    fn phase_starting(&self, phase: Phase, order: &[String]) {
        (**self).phase_starting(phase, order);
    }

    fn addon_processed(&self, phase: Phase, addon: &str) {
        (**self).addon_processed(phase, addon);
    }

    fn phase_completed(&self, phase: Phase) {
        (**self).phase_completed(phase);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LifecycleObserver for NoopObserver {
    fn phase_starting(&self, _phase: Phase, _order: &[String]) {}

    fn addon_processed(&self, _phase: Phase, _addon: &str) {}

    fn phase_completed(&self, _phase: Phase) {}

    fn bootstrap_failed(&self, _error: &BootstrapError) {}
}

/// The bootstrap driver.
#[derive(Clone)]
pub struct Lifecycle {
    observer: Arc<dyn LifecycleObserver>,
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle").finish_non_exhaustive()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Builds a lifecycle that reports to nobody.
    #[must_use]
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoopObserver))
    }

    /// Builds a lifecycle reporting progress to `observer`.
    #[must_use]
    pub const fn with_observer(observer: Arc<dyn LifecycleObserver>) -> Self {
        Self { observer }
    }

    /// Resolves properties, then initializes and finalizes every addon.
    ///
    /// Returns the repo holding the finalized values.
    ///
    /// # Errors
    ///
    /// Returns a [`BootstrapError`] naming the failing phase and addon.
    pub fn prepare(
        &self,
        repo: AddonRepo,
        properties: &dyn PropertyProvider,
    ) -> Result<AddonRepo, BootstrapError> {
        self.observe(self.prepare_repo(repo, properties))
    }

    /// Exports bindings of every addon, in registration order.
    ///
    /// # Errors
    ///
    /// Returns a [`BootstrapError`] for the first addon that fails.
    pub fn wire(
        &self,
        repo: &AddonRepo,
        bindings: &mut dyn InjectionRegistry,
    ) -> Result<(), BootstrapError> {
        self.observe(self.visit(repo, Phase::Wiring, |addon| addon.export(bindings)))
    }

    /// Mounts every addon on the server, in registration order.
    ///
    /// # Errors
    ///
    /// Returns a [`BootstrapError`] for the first addon that fails.
    pub fn mount(
        &self,
        repo: &AddonRepo,
        server: &mut dyn ServerHandle,
    ) -> Result<(), BootstrapError> {
        self.observe(self.visit(repo, Phase::Mount, |addon| addon.mount(server)))
    }

    /// Runs all five phases and returns the running service.
    ///
    /// # Errors
    ///
    /// Returns a [`BootstrapError`] from the first phase that fails; later
    /// phases do not run.
    pub fn run(
        &self,
        repo: AddonRepo,
        properties: &dyn PropertyProvider,
        bindings: &mut dyn InjectionRegistry,
        server: &mut dyn ServerHandle,
    ) -> Result<RunningService, BootstrapError> {
        let result = self.prepare_repo(repo, properties).and_then(|prepared| {
            self.visit(&prepared, Phase::Wiring, |addon| addon.export(bindings))?;
            self.visit(&prepared, Phase::Mount, |addon| addon.mount(server))?;
            Ok(prepared)
        });
        let mounted = self.observe(result)?;
        info!(target: TARGET, addons = mounted.len(), "bootstrap complete");
        Ok(RunningService {
            repo: mounted,
            observer: Arc::clone(&self.observer),
        })
    }

    fn prepare_repo(
        &self,
        mut repo: AddonRepo,
        properties: &dyn PropertyProvider,
    ) -> Result<AddonRepo, BootstrapError> {
        self.transform(&mut repo, Phase::PropertyResolution, |addon, _| {
            addon.with_properties(properties)
        })?;
        self.transform(&mut repo, Phase::Initialize, |addon, siblings| {
            addon.initialize(siblings)
        })?;
        self.transform(&mut repo, Phase::Finalize, |addon, siblings| {
            addon.finalize(siblings)
        })?;
        Ok(repo)
    }

    /// Runs a value-replacing hook over the repo.
    ///
    /// The order is computed before any hook runs, so an unresolvable graph
    /// leaves every addon untouched.
    fn transform(
        &self,
        repo: &mut AddonRepo,
        phase: Phase,
        hook: impl Fn(Arc<dyn Addon>, &AddonRepo) -> AddonResult,
    ) -> Result<(), BootstrapError> {
        let order = order_for(repo, phase)?;
        self.begin(repo, phase, &order);
        for index in order {
            let Some(current) = repo.get(index).cloned() else {
                continue;
            };
            let label = describe(current.as_ref());
            debug!(target: TARGET, phase = %phase, addon = %label, "running hook");
            let next = hook(current, repo)
                .map_err(|error| failure(phase, &label, error))?;
            repo.replace(index, next);
            self.observer.addon_processed(phase, &label);
        }
        self.end(phase);
        Ok(())
    }

    /// Runs a read-only hook over the repo.
    fn visit(
        &self,
        repo: &AddonRepo,
        phase: Phase,
        mut hook: impl FnMut(&dyn Addon) -> Result<(), AddonError>,
    ) -> Result<(), BootstrapError> {
        let order = order_for(repo, phase)?;
        self.begin(repo, phase, &order);
        for addon in order.into_iter().filter_map(|index| repo.get(index)) {
            let label = describe(addon.as_ref());
            debug!(target: TARGET, phase = %phase, addon = %label, "running hook");
            hook(addon.as_ref()).map_err(|error| failure(phase, &label, error))?;
            self.observer.addon_processed(phase, &label);
        }
        self.end(phase);
        Ok(())
    }

    fn begin(&self, repo: &AddonRepo, phase: Phase, order: &[usize]) {
        let labels: Vec<String> = order
            .iter()
            .filter_map(|&index| repo.get(index))
            .map(|addon| describe(addon.as_ref()))
            .collect();
        info!(
            target: TARGET,
            phase = %phase,
            order = ?labels,
            "phase starting"
        );
        self.observer.phase_starting(phase, &labels);
    }

    fn end(&self, phase: Phase) {
        info!(target: TARGET, phase = %phase, "phase completed");
        self.observer.phase_completed(phase);
    }

    fn observe<T>(&self, result: Result<T, BootstrapError>) -> Result<T, BootstrapError> {
        result.inspect_err(|err| {
            error!(target: TARGET, phase = %err.phase(), error = %err, "bootstrap failed");
            self.observer.bootstrap_failed(err);
        })
    }
}

fn order_for(repo: &AddonRepo, phase: Phase) -> Result<Vec<usize>, BootstrapError> {
    resolve_order(repo, phase).map_err(|error| BootstrapError::new(phase, None, error))
}

fn failure(phase: Phase, label: &str, error: AddonError) -> BootstrapError {
    BootstrapError::new(phase, Some(label.to_owned()), error.required_by(label))
}

/// A fully bootstrapped service.
pub struct RunningService {
    repo: AddonRepo,
    observer: Arc<dyn LifecycleObserver>,
}

impl fmt::Debug for RunningService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunningService")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

impl RunningService {
    /// The mounted addon values, in registration order.
    #[must_use]
    pub const fn addons(&self) -> &AddonRepo {
        &self.repo
    }

    /// Shuts every addon down in reverse registration order.
    ///
    /// A failing addon is logged and recorded; the sweep always visits every
    /// addon.
    #[must_use]
    pub fn shutdown(self) -> ShutdownReport {
        let labels: Vec<String> = self
            .repo
            .iter()
            .rev()
            .map(|addon| describe(addon.as_ref()))
            .collect();
        info!(target: TARGET, phase = %Phase::Shutdown, order = ?labels, "phase starting");
        self.observer.phase_starting(Phase::Shutdown, &labels);

        let mut report = ShutdownReport::default();
        for (addon, label) in self.repo.iter().rev().zip(labels) {
            match addon.shutdown() {
                Ok(()) => {
                    self.observer.addon_processed(Phase::Shutdown, &label);
                    report.stopped.push(label);
                }
                Err(error) => {
                    warn!(
                        target: TARGET,
                        addon = %label,
                        error = %error,
                        "addon failed to shut down"
                    );
                    report.failures.push(ShutdownFailure { addon: label, error });
                }
            }
        }

        info!(target: TARGET, phase = %Phase::Shutdown, "phase completed");
        self.observer.phase_completed(Phase::Shutdown);
        report
    }
}

/// Outcome of a shutdown sweep.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    stopped: Vec<String>,
    failures: Vec<ShutdownFailure>,
}

impl ShutdownReport {
    /// Addons that shut down cleanly, in the order they were visited.
    #[must_use]
    pub fn stopped(&self) -> &[String] {
        &self.stopped
    }

    /// Addons whose shutdown hook failed.
    #[must_use]
    pub fn failures(&self) -> &[ShutdownFailure] {
        &self.failures
    }

    /// Returns `true` when no addon failed.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A single failed shutdown hook.
#[derive(Debug)]
pub struct ShutdownFailure {
    /// Label of the addon.
    pub addon: String,
    /// Error returned by the hook.
    pub error: AddonError,
}

#[cfg(test)]
mod tests;
