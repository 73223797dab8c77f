//! API documentation endpoint.

use std::sync::Arc;

use muster_config::PropertyProvider;
use muster_core::{Addon, AddonError, AddonResult, Route, ServerHandle};

use crate::configured;

const KEY_API_BASEURL: &str = "api.baseurl";
const KEY_SERVICE_VERSION: &str = "service.version";

/// Path the documentation is served at, relative to the context path.
pub const DEFAULT_PATH_SPEC: &str = "/swagger";

/// API version reported when `service.version` is unset.
pub const DEFAULT_API_VERSION: &str = "N/A";

/// Serves API documentation for the service.
///
/// Requires `api.baseurl`; `service.version`, when set, replaces the
/// reported API version.
#[derive(Debug, Clone)]
pub struct ApiDocsAddon {
    base_url: Option<String>,
    path_spec: String,
    api_version: String,
}

impl Default for ApiDocsAddon {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiDocsAddon {
    /// Creates the addon with the default path and version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: None,
            path_spec: String::from(DEFAULT_PATH_SPEC),
            api_version: String::from(DEFAULT_API_VERSION),
        }
    }

    /// Serves the documentation at `path_spec`.
    #[must_use]
    pub fn path_spec(self, path_spec: impl Into<String>) -> Self {
        Self {
            path_spec: path_spec.into(),
            ..self
        }
    }

    /// Reported API version.
    #[must_use]
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Base URL the documented API is reachable at, once configured.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

impl Addon for ApiDocsAddon {
    fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
        let base_url = properties.require(KEY_API_BASEURL)?;
        let api_version = properties
            .get(KEY_SERVICE_VERSION)
            .unwrap_or_else(|| self.api_version.clone());
        Ok(Arc::new(Self {
            base_url: Some(base_url),
            api_version,
            ..Self::clone(&self)
        }))
    }

    fn mount(&self, server: &mut dyn ServerHandle) -> Result<(), AddonError> {
        let base_url = configured(self.base_url.as_deref(), None, KEY_API_BASEURL)?;
        // The docs generator prepends its own slash.
        let base_path = base_url.strip_prefix('/').filter(|rest| rest.starts_with('/'));
        let route = Route::new("api_docs")
            .param("api.version", self.api_version.as_str())
            .param("swagger.api.basepath", base_path.unwrap_or(base_url));
        server.add_route(&self.path_spec, route);
        Ok(())
    }
}
