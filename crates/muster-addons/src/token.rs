//! Token service client and the application-token request filter.

use std::sync::Arc;

use muster_config::{PropertyError, PropertyProvider};
use muster_core::{
    Addon, AddonError, AddonRepo, AddonResult, Capability, InjectionRegistry,
    InjectionRegistryExt,
};
use tracing::debug;

use crate::api_docs::ApiDocsAddon;
use crate::configured;
use crate::endpoint::{Endpoint, endpoint_for};

const KEY_TOKEN_SERVICE_URL: &str = "tokenservice.url";
const KEY_ACCEPTED_APP_IDS: &str = "apptoken.accepted.app.ids";

/// Client of the token service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenServiceClient {
    endpoint: Endpoint,
}

impl TokenServiceClient {
    /// Token service URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }
}

/// Binds a [`TokenServiceClient`] configured from `tokenservice.url`.
#[derive(Debug, Clone, Default)]
pub struct TokenServiceAddon {
    url: Option<String>,
    client: Option<Arc<TokenServiceClient>>,
}

impl TokenServiceAddon {
    /// Creates an unconfigured token service addon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The client, once initialized.
    #[must_use]
    pub const fn client(&self) -> Option<&Arc<TokenServiceClient>> {
        self.client.as_ref()
    }
}

impl Addon for TokenServiceAddon {
    fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
        let url = properties.require_with_fallback(KEY_TOKEN_SERVICE_URL, self.url.as_deref())?;
        Ok(Arc::new(Self {
            url: Some(url),
            ..Self::clone(&self)
        }))
    }

    fn initialize(self: Arc<Self>, _addons: &AddonRepo) -> AddonResult {
        let url = configured(self.url.as_deref(), None, KEY_TOKEN_SERVICE_URL)?;
        let client = TokenServiceClient {
            endpoint: endpoint_for(&*self, url)?,
        };
        debug!(target: "muster::addons", url = %client.endpoint, "token service client ready");
        Ok(Arc::new(Self {
            client: Some(Arc::new(client)),
            ..Self::clone(&self)
        }))
    }

    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        let client = self.client.clone().ok_or_else(|| {
            AddonError::hook("TokenServiceAddon", "token service client was not initialized")
        })?;
        bindings.bind_as(client, None);
        Ok(())
    }
}

/// Checks application tokens against the accepted application ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTokenValidator {
    client: Arc<TokenServiceClient>,
    accepted_app_ids: Vec<u32>,
}

impl AppTokenValidator {
    /// Returns `true` when requests from `app_id` are accepted.
    #[must_use]
    pub fn accepts(&self, app_id: u32) -> bool {
        self.accepted_app_ids.contains(&app_id)
    }

    /// Token service used to resolve tokens.
    #[must_use]
    pub fn client(&self) -> &TokenServiceClient {
        &self.client
    }
}

/// Request filter admitting only known applications.
///
/// Needs a [`TokenServiceAddon`], and an [`ApiDocsAddon`] while implicit
/// documentation headers are enabled. Both finalize before the filter, and
/// the filter's own finalize rejects a repo lacking either.
#[derive(Debug, Clone)]
pub struct AppTokenFilterAddon {
    require_app_token_by_default: bool,
    implicit_headers: bool,
    accepted_app_ids: Vec<u32>,
    client: Option<Arc<TokenServiceClient>>,
}

impl Default for AppTokenFilterAddon {
    fn default() -> Self {
        Self::new()
    }
}

impl AppTokenFilterAddon {
    /// Creates a filter requiring tokens and documenting the token header.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            require_app_token_by_default: true,
            implicit_headers: true,
            accepted_app_ids: Vec::new(),
            client: None,
        }
    }

    /// Sets whether endpoints require a token unless opted out.
    #[must_use]
    pub fn require_app_token_by_default(self, required: bool) -> Self {
        Self {
            require_app_token_by_default: required,
            ..self
        }
    }

    /// Sets whether the token header is added to the API documentation.
    #[must_use]
    pub fn implicit_headers(self, implicit_headers: bool) -> Self {
        Self {
            implicit_headers,
            ..self
        }
    }

    /// Accepts one more application id.
    #[must_use]
    pub fn accept_app_id(mut self, app_id: u32) -> Self {
        self.accepted_app_ids.push(app_id);
        self
    }

    /// Accepted application ids.
    #[must_use]
    pub fn accepted_app_ids(&self) -> &[u32] {
        &self.accepted_app_ids
    }

    /// Whether endpoints require a token unless opted out.
    #[must_use]
    pub const fn requires_app_token_by_default(&self) -> bool {
        self.require_app_token_by_default
    }
}

fn parse_app_ids(raw: &str) -> Result<Vec<u32>, PropertyError> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(|id| {
            id.parse().map_err(|error: std::num::ParseIntError| PropertyError::Invalid {
                key: String::from(KEY_ACCEPTED_APP_IDS),
                value: raw.to_owned(),
                message: format!("'{id}' is not an application id: {error}"),
            })
        })
        .collect()
}

impl Addon for AppTokenFilterAddon {
    fn finalize_after(&self) -> Vec<Capability> {
        let mut after = vec![Capability::of::<TokenServiceAddon>()];
        if self.implicit_headers {
            after.push(Capability::of::<ApiDocsAddon>());
        }
        after
    }

    fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
        properties.fail_if_not_present(&[KEY_ACCEPTED_APP_IDS])?;
        let raw = properties.require(KEY_ACCEPTED_APP_IDS)?;
        let accepted_app_ids = parse_app_ids(&raw)?;
        Ok(Arc::new(Self {
            accepted_app_ids,
            ..Self::clone(&self)
        }))
    }

    fn finalize(self: Arc<Self>, addons: &AddonRepo) -> AddonResult {
        if self.implicit_headers && !addons.is_present(Capability::of::<ApiDocsAddon>()) {
            // Implicit token headers are documented through the API docs.
            return Err(AddonError::missing_dependency(
                Capability::of::<ApiDocsAddon>(),
                None,
                None,
            ));
        }
        let token_service = addons.require_addon::<TokenServiceAddon>()?;
        Ok(Arc::new(Self {
            client: token_service.client().cloned(),
            ..Self::clone(&self)
        }))
    }

    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        let client = self.client.clone().ok_or_else(|| {
            AddonError::missing_dependency(
                Capability::of::<TokenServiceClient>(),
                None,
                Some("AppTokenFilterAddon"),
            )
        })?;
        bindings.bind_as(Arc::new(self.clone()), None);
        let accepted_app_ids = self.accepted_app_ids.clone();
        bindings.bind_factory_for(None, move || AppTokenValidator {
            client: Arc::clone(&client),
            accepted_app_ids: accepted_app_ids.clone(),
        });
        Ok(())
    }
}
