//! Search cluster client and typed indexes.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use muster_config::PropertyProvider;
use muster_core::{
    Addon, AddonError, AddonRepo, AddonResult, Capability, HealthStatus, InjectionRegistry,
    InjectionRegistryExt, ServerHandle,
};
use tracing::debug;

use crate::configured;
use crate::endpoint::{Endpoint, endpoint_for};

const KEY_URL: &str = "search.url";
const KEY_CLUSTER: &str = "search.cluster";
const DEFAULT_CLUSTER: &str = "search";

/// Connection to a search cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchClient {
    endpoint: Endpoint,
    cluster: String,
}

impl SearchClient {
    /// Cluster URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Cluster name.
    #[must_use]
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    fn check_index(&self, index: &str) -> HealthStatus {
        if index.is_empty() {
            HealthStatus::Unhealthy(format!("no index name on cluster {}", self.cluster))
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Cluster client configured from `search.url` and `search.cluster`.
#[derive(Debug, Clone, Default)]
pub struct SearchClientAddon {
    url: Option<String>,
    cluster: Option<String>,
    client: Option<Arc<SearchClient>>,
}

impl SearchClientAddon {
    /// Creates an unconfigured client addon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The client, once initialized.
    #[must_use]
    pub const fn client(&self) -> Option<&Arc<SearchClient>> {
        self.client.as_ref()
    }
}

impl Addon for SearchClientAddon {
    fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
        let url = properties.require_with_fallback(KEY_URL, self.url.as_deref())?;
        let cluster = properties.require_with_fallback(
            KEY_CLUSTER,
            Some(self.cluster.as_deref().unwrap_or(DEFAULT_CLUSTER)),
        )?;
        Ok(Arc::new(Self {
            url: Some(url),
            cluster: Some(cluster),
            ..Self::clone(&self)
        }))
    }

    fn initialize(self: Arc<Self>, _addons: &AddonRepo) -> AddonResult {
        let url = configured(self.url.as_deref(), None, KEY_URL)?;
        let client = SearchClient {
            endpoint: endpoint_for(&*self, url)?,
            cluster: self
                .cluster
                .clone()
                .unwrap_or_else(|| String::from(DEFAULT_CLUSTER)),
        };
        debug!(target: "muster::addons", cluster = %client.cluster, "search client ready");
        Ok(Arc::new(Self {
            client: Some(Arc::new(client)),
            ..Self::clone(&self)
        }))
    }

    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        let client = self.client.clone().ok_or_else(|| {
            AddonError::hook("SearchClientAddon", "search client was not initialized")
        })?;
        bindings.bind_as(client, None);
        Ok(())
    }
}

/// Read access to the index holding documents of type `D`.
pub struct Searcher<D> {
    client: Arc<SearchClient>,
    index: String,
    document: PhantomData<fn() -> D>,
}

/// Write access to the index holding documents of type `D`.
pub struct Indexer<D> {
    client: Arc<SearchClient>,
    index: String,
    document: PhantomData<fn() -> D>,
}

macro_rules! index_handle {
    ($handle:ident) => {
        impl<D> $handle<D> {
            const fn new(client: Arc<SearchClient>, index: String) -> Self {
                Self {
                    client,
                    index,
                    document: PhantomData,
                }
            }

            /// Cluster the index lives on.
            #[must_use]
            pub fn client(&self) -> &SearchClient {
                &self.client
            }

            /// Index name.
            #[must_use]
            pub fn index(&self) -> &str {
                &self.index
            }
        }

        impl<D> fmt::Debug for $handle<D> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($handle))
                    .field("index", &self.index)
                    .field("document", &type_name::<D>())
                    .finish_non_exhaustive()
            }
        }
    };
}

index_handle!(Searcher);
index_handle!(Indexer);

/// A search index of documents of type `D`.
///
/// The index name is lowercased and doubles as the addon name. During
/// wiring the addon registers a [`Searcher<D>`] factory and, when indexing
/// is enabled, an [`Indexer<D>`] factory, both keyed by their type.
pub struct SearchIndexAddon<D> {
    index: String,
    indexing: bool,
    client: Option<Arc<SearchClient>>,
    document: PhantomData<fn() -> D>,
}

impl<D> Clone for SearchIndexAddon<D> {
    fn clone(&self) -> Self {
        Self {
            index: self.index.clone(),
            indexing: self.indexing,
            client: self.client.clone(),
            document: PhantomData,
        }
    }
}

impl<D> fmt::Debug for SearchIndexAddon<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchIndexAddon")
            .field("index", &self.index)
            .field("document", &type_name::<D>())
            .field("indexing", &self.indexing)
            .field("client", &self.client)
            .finish()
    }
}

impl<D: 'static> SearchIndexAddon<D> {
    /// Creates a read-only index called `index`.
    #[must_use]
    pub fn new(index: &str) -> Self {
        Self {
            index: index.to_lowercase(),
            indexing: false,
            client: None,
            document: PhantomData,
        }
    }

    /// Enables or disables the [`Indexer<D>`] binding.
    #[must_use]
    pub fn indexing(self, indexing: bool) -> Self {
        Self { indexing, ..self }
    }

    /// Lowercased index name.
    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }

    fn client(&self) -> Result<Arc<SearchClient>, AddonError> {
        self.client.clone().ok_or_else(|| {
            AddonError::hook(
                format!("SearchIndexAddon({})", self.index),
                "search client was not resolved",
            )
        })
    }
}

impl<D: 'static> Addon for SearchIndexAddon<D> {
    fn name(&self) -> Option<&str> {
        Some(&self.index)
    }

    fn initialize_after(&self) -> Vec<Capability> {
        vec![Capability::of::<SearchClientAddon>()]
    }

    fn initialize(self: Arc<Self>, addons: &AddonRepo) -> AddonResult {
        let client_addon = addons.require_addon::<SearchClientAddon>()?;
        let client = client_addon.client().cloned().ok_or_else(|| {
            AddonError::missing_dependency(Capability::of::<SearchClient>(), None, None)
        })?;
        Ok(Arc::new(Self {
            client: Some(client),
            ..Self::clone(&self)
        }))
    }

    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        let client = self.client()?;
        bindings.bind_as(Arc::new(self.clone()), Some(&self.index));

        let searcher_index = self.index.clone();
        let searcher_client = Arc::clone(&client);
        bindings.bind_factory_for(None, move || {
            Searcher::<D>::new(Arc::clone(&searcher_client), searcher_index.clone())
        });

        if self.indexing {
            let indexer_index = self.index.clone();
            bindings.bind_factory_for(None, move || {
                Indexer::<D>::new(Arc::clone(&client), indexer_index.clone())
            });
        }
        Ok(())
    }

    fn mount(&self, server: &mut dyn ServerHandle) -> Result<(), AddonError> {
        let client = self.client()?;
        let index = self.index.clone();
        let name = format!("Indexer: {}/{index}", client.cluster());
        server.add_health_check(&name, Arc::new(move || client.check_index(&index)));
        Ok(())
    }
}
