//! Shared test doubles and crate-level behaviour tests.

use std::sync::{Arc, Mutex, PoisonError};

use muster_config::{PropertyProvider, prefixed_key};

use crate::addon::{Addon, AddonResult, describe};
use crate::binding::InjectionRegistry;
use crate::capability::Capability;
use crate::error::AddonError;
use crate::lifecycle::Phase;
use crate::registry::AddonRepo;
use crate::server::ServerHandle;


/// Role marker used by stubs.
pub(crate) struct RoleA;
/// Role marker used by stubs.
pub(crate) struct RoleB;
/// Role marker used by stubs.
pub(crate) struct RoleC;

/// Shared record of hook invocations, as `phase:label` entries.
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, phase: Phase, label: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format!("{phase}:{label}"));
    }

    /// Labels of the stubs that ran `phase`, in invocation order.
    pub(crate) fn labels(&self, phase: Phase) -> Vec<String> {
        let prefix = format!("{phase}:");
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_owned))
            .collect()
    }

    /// Returns `true` when nothing ran `phase`.
    pub(crate) fn untouched(&self, phase: Phase) -> bool {
        self.labels(phase).is_empty()
    }
}

/// Configurable addon recording every hook into a [`Journal`].
#[derive(Debug, Clone)]
pub(crate) struct Stub {
    pub(crate) label: String,
    name: Option<String>,
    roles: Vec<Capability>,
    init_after: Vec<Capability>,
    fin_after: Vec<Capability>,
    journal: Journal,
    fail_in: Option<Phase>,
    required_key: Option<String>,
    pub(crate) configured: Option<String>,
    pub(crate) initialized: bool,
    pub(crate) finalized: bool,
}

impl Stub {
    pub(crate) fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            name: None,
            roles: Vec::new(),
            init_after: Vec::new(),
            fin_after: Vec::new(),
            journal: Journal::default(),
            fail_in: None,
            required_key: None,
            configured: None,
            initialized: false,
            finalized: false,
        }
    }

    pub(crate) fn role<R: 'static>(mut self) -> Self {
        self.roles.push(Capability::of::<R>());
        self
    }

    pub(crate) fn named(self, name: &str) -> Self {
        self.named_opt(Some(name))
    }

    pub(crate) fn named_opt(mut self, name: Option<&str>) -> Self {
        self.name = name.map(str::to_owned);
        self
    }

    pub(crate) fn initialize_after<R: 'static>(mut self) -> Self {
        self.init_after.push(Capability::of::<R>());
        self
    }

    pub(crate) fn finalize_after<R: 'static>(mut self) -> Self {
        self.fin_after.push(Capability::of::<R>());
        self
    }

    pub(crate) fn journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    pub(crate) fn fail_in(mut self, phase: Phase) -> Self {
        self.fail_in = Some(phase);
        self
    }

    pub(crate) fn requires_key(mut self, key: &str) -> Self {
        self.required_key = Some(key.to_owned());
        self
    }

    fn enter(&self, phase: Phase) -> Result<(), AddonError> {
        self.journal.record(phase, &self.label);
        if self.fail_in == Some(phase) {
            return Err(AddonError::hook(describe(self), format!("{phase} failed")));
        }
        Ok(())
    }

    /// Fails unless every stub providing a predecessor passed `done`.
    fn check_predecessors(
        &self,
        addons: &AddonRepo,
        predecessors: &[Capability],
        done: fn(&Self) -> bool,
    ) -> Result<(), AddonError> {
        for capability in predecessors {
            for addon in addons.instances_of(*capability) {
                let ready = addon.as_any().downcast_ref::<Self>().is_none_or(done);
                if !ready {
                    return Err(AddonError::hook(
                        describe(self),
                        format!("predecessor {} not ready", describe(addon.as_ref())),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Addon for Stub {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn capabilities(&self) -> Vec<Capability> {
        self.roles.clone()
    }

    fn initialize_after(&self) -> Vec<Capability> {
        self.init_after.clone()
    }

    fn finalize_after(&self) -> Vec<Capability> {
        self.fin_after.clone()
    }

    fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
        self.enter(Phase::PropertyResolution)?;
        let Some(key) = self.required_key.as_deref() else {
            return Ok(self);
        };
        let value = properties.require(&prefixed_key(self.name.as_deref(), key))?;
        Ok(Arc::new(Self {
            configured: Some(value),
            ..Self::clone(&self)
        }))
    }

    fn initialize(self: Arc<Self>, addons: &AddonRepo) -> AddonResult {
        self.enter(Phase::Initialize)?;
        self.check_predecessors(addons, &self.init_after, |stub| stub.initialized)?;
        Ok(Arc::new(Self {
            initialized: true,
            ..Self::clone(&self)
        }))
    }

    fn finalize(self: Arc<Self>, addons: &AddonRepo) -> AddonResult {
        self.enter(Phase::Finalize)?;
        self.check_predecessors(addons, &self.fin_after, |stub| stub.finalized)?;
        Ok(Arc::new(Self {
            finalized: true,
            ..Self::clone(&self)
        }))
    }

    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        self.enter(Phase::Wiring)?;
        let label: Arc<String> = Arc::new(self.label.clone());
        let Some(name) = self.name.as_deref() else {
            bindings.bind(label, Capability::of::<Self>());
            return Ok(());
        };
        bindings.bind_named(label, Capability::of::<Self>(), name);
        Ok(())
    }

    fn mount(&self, server: &mut dyn ServerHandle) -> Result<(), AddonError> {
        self.enter(Phase::Mount)?;
        server.add_health_check(&self.label, Arc::new(|| crate::HealthStatus::Healthy));
        Ok(())
    }

    fn shutdown(&self) -> Result<(), AddonError> {
        self.enter(Phase::Shutdown)
    }
}

/// Builds a repo from stubs sharing `journal`.
pub(crate) fn repo_of(journal: &Journal, stubs: Vec<Stub>) -> AddonRepo {
    let mut repo = AddonRepo::new();
    for stub in stubs {
        repo.push(stub.journal(journal));
    }
    repo
}

/// Labels of the repo's stubs, in slot order.
pub(crate) fn labels(repo: &AddonRepo) -> Vec<String> {
    repo.iter()
        .filter_map(|addon| addon.as_any().downcast_ref::<Stub>())
        .map(|stub| stub.label.clone())
        .collect()
}
