//! Statement runner bound to a sibling datasource of the same name.

use std::sync::Arc;

use muster_core::{
    Addon, AddonError, AddonRepo, AddonResult, Capability, InjectionRegistry,
    InjectionRegistryExt, describe,
};
use tracing::debug;

use crate::datasource::{DataSource, DataSourceRole};

/// Runs statements against a [`DataSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRunner {
    data_source: Arc<DataSource>,
}

impl QueryRunner {
    /// Creates a runner over `data_source`.
    #[must_use]
    pub const fn new(data_source: Arc<DataSource>) -> Self {
        Self { data_source }
    }

    /// The datasource statements run against.
    #[must_use]
    pub fn data_source(&self) -> &DataSource {
        &self.data_source
    }
}

/// Binds a [`QueryRunner`] over the datasource with the same name.
///
/// Initializes after the first datasource to be placed, whatever its name.
/// The matching datasource must therefore be registered ahead of any other
/// datasource the runner would otherwise follow; a datasource that is
/// registered but not yet initialized is reported as an ordering failure.
#[derive(Debug, Clone, Default)]
pub struct QueryRunnerAddon {
    name: Option<String>,
    runner: Option<Arc<QueryRunner>>,
}

impl QueryRunnerAddon {
    /// Creates a runner for the unnamed datasource.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Targets the datasource called `name`.
    #[must_use]
    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// The runner, once initialized.
    #[must_use]
    pub const fn runner(&self) -> Option<&Arc<QueryRunner>> {
        self.runner.as_ref()
    }
}

impl Addon for QueryRunnerAddon {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn initialize_after(&self) -> Vec<Capability> {
        vec![Capability::of::<DataSourceRole>()]
    }

    fn initialize(self: Arc<Self>, addons: &AddonRepo) -> AddonResult {
        let capability = Capability::of::<DataSourceRole>();
        let name = self.name.as_deref();
        let slot = addons
            .named_instance_of(capability, name)?
            .ok_or_else(|| AddonError::missing_dependency(capability, name, None))?;
        let data_source = slot
            .provide(capability)
            .and_then(|handle| handle.downcast::<DataSource>().ok())
            .ok_or_else(|| {
                AddonError::hook(
                    describe(self.as_ref()),
                    format!(
                        "{} is registered but initializes after this runner; \
                         register it ahead of the other datasources",
                        describe(slot.as_ref())
                    ),
                )
            })?;
        debug!(
            target: "muster::addons",
            datasource = self.name.as_deref().unwrap_or("default"),
            "query runner ready"
        );
        Ok(Arc::new(Self {
            runner: Some(Arc::new(QueryRunner::new(data_source))),
            ..Self::clone(&self)
        }))
    }

    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        let runner = self.runner.clone().ok_or_else(|| {
            AddonError::hook("QueryRunnerAddon", "query runner was not initialized")
        })?;
        bindings.bind_as(runner, self.name.as_deref());
        Ok(())
    }
}
