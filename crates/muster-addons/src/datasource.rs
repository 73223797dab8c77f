//! Connection-pooled datasource described by `db.*` properties.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use muster_config::{PropertyProvider, prefixed_key};
use muster_core::{
    Addon, AddonError, AddonRepo, AddonResult, Capability, HealthStatus, InjectionRegistry,
    InjectionRegistryExt, ServerHandle,
};
use tracing::debug;

use crate::configured;
use crate::endpoint::{Endpoint, endpoint_for};

const KEY_URL: &str = "db.url";
const KEY_DRIVER_CLASS_NAME: &str = "db.driverClassName";
const KEY_USERNAME: &str = "db.username";
const KEY_PASSWORD: &str = "db.password";
const KEY_VALIDATION_QUERY: &str = "db.validationQuery";
const DEFAULT_VALIDATION_QUERY: &str = "select 1";

/// Role of every addon exposing a [`DataSource`].
#[derive(Debug)]
pub struct DataSourceRole;

/// Connection settings of a datasource.
#[derive(Clone, PartialEq, Eq)]
pub struct DataSource {
    name: Option<String>,
    endpoint: Endpoint,
    driver_class_name: String,
    username: String,
    password: String,
    validation_query: String,
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name)
            .field("endpoint", &self.endpoint)
            .field("driver_class_name", &self.driver_class_name)
            .field("username", &self.username)
            .field("validation_query", &self.validation_query)
            .finish_non_exhaustive()
    }
}

impl DataSource {
    /// Datasource name, if the addon was named.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Connection URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Driver identifier.
    #[must_use]
    pub fn driver_class_name(&self) -> &str {
        &self.driver_class_name
    }

    /// Login user.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Statement used to check the connection.
    #[must_use]
    pub fn validation_query(&self) -> &str {
        &self.validation_query
    }

    /// Reports whether the datasource is usable for probing.
    #[must_use]
    pub fn check(&self) -> HealthStatus {
        if self.validation_query.trim().is_empty() {
            HealthStatus::Unhealthy(format!("no validation query for {}", self.endpoint))
        } else {
            HealthStatus::Healthy
        }
    }
}

/// Datasource configured from `db.*` properties.
///
/// A named addon reads `<name>.db.url` and so on, and binds its
/// [`DataSource`] under that name.
#[derive(Debug, Clone)]
pub struct BasicDataSourceAddon {
    name: Option<String>,
    url: Option<String>,
    driver_class_name: Option<String>,
    username: Option<String>,
    password: Option<String>,
    validation_query: String,
    monitor_integration: bool,
    data_source: Option<Arc<DataSource>>,
}

impl Default for BasicDataSourceAddon {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicDataSourceAddon {
    /// Creates an unnamed datasource addon with monitoring enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            url: None,
            driver_class_name: None,
            username: None,
            password: None,
            validation_query: String::from(DEFAULT_VALIDATION_QUERY),
            monitor_integration: true,
            data_source: None,
        }
    }

    /// Names the datasource.
    #[must_use]
    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..self
        }
    }

    /// Sets the URL used when the properties do not provide one.
    #[must_use]
    pub fn url(self, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..self
        }
    }

    /// Sets the driver used when the properties do not provide one.
    #[must_use]
    pub fn driver_class_name(self, driver: impl Into<String>) -> Self {
        Self {
            driver_class_name: Some(driver.into()),
            ..self
        }
    }

    /// Sets the user used when the properties do not provide one.
    #[must_use]
    pub fn username(self, username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..self
        }
    }

    /// Sets the password used when the properties do not provide one.
    #[must_use]
    pub fn password(self, password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..self
        }
    }

    /// Sets the validation statement used when the properties do not provide one.
    #[must_use]
    pub fn validation_query(self, query: impl Into<String>) -> Self {
        Self {
            validation_query: query.into(),
            ..self
        }
    }

    /// Enables or disables the datasource health check.
    #[must_use]
    pub fn monitor_integration(self, monitor_integration: bool) -> Self {
        Self {
            monitor_integration,
            ..self
        }
    }

    /// The datasource, once initialized.
    #[must_use]
    pub const fn data_source(&self) -> Option<&Arc<DataSource>> {
        self.data_source.as_ref()
    }

    fn key(&self, key: &str) -> String {
        prefixed_key(self.name.as_deref(), key)
    }
}

impl Addon for BasicDataSourceAddon {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn capabilities(&self) -> Vec<Capability> {
        vec![Capability::of::<DataSourceRole>()]
    }

    fn provide(&self, capability: Capability) -> Option<Arc<dyn Any + Send + Sync>> {
        let exposed = capability == Capability::of::<DataSourceRole>()
            || capability == Capability::of::<DataSource>();
        if !exposed {
            return None;
        }
        self.data_source
            .clone()
            .map(|data_source| -> Arc<dyn Any + Send + Sync> { data_source })
    }

    fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
        let read = |key: &str, fallback: Option<&str>| {
            properties.require_with_fallback(&self.key(key), fallback)
        };
        let url = read(KEY_URL, self.url.as_deref())?;
        let username = read(KEY_USERNAME, self.username.as_deref())?;
        let password = read(KEY_PASSWORD, self.password.as_deref())?;
        let driver_class_name = read(KEY_DRIVER_CLASS_NAME, self.driver_class_name.as_deref())?;
        let validation_query = read(KEY_VALIDATION_QUERY, Some(self.validation_query.as_str()))?;
        Ok(Arc::new(Self {
            url: Some(url),
            username: Some(username),
            password: Some(password),
            driver_class_name: Some(driver_class_name),
            validation_query,
            ..Self::clone(&self)
        }))
    }

    fn initialize(self: Arc<Self>, _addons: &AddonRepo) -> AddonResult {
        let name = self.name.as_deref();
        let url = configured(self.url.as_deref(), name, KEY_URL)?;
        let data_source = DataSource {
            name: self.name.clone(),
            endpoint: endpoint_for(&*self, url)?,
            driver_class_name: configured(
                self.driver_class_name.as_deref(),
                name,
                KEY_DRIVER_CLASS_NAME,
            )?
            .to_owned(),
            username: configured(self.username.as_deref(), name, KEY_USERNAME)?.to_owned(),
            password: configured(self.password.as_deref(), name, KEY_PASSWORD)?.to_owned(),
            validation_query: self.validation_query.clone(),
        };
        debug!(
            target: "muster::addons",
            datasource = name.unwrap_or("default"),
            url = %data_source.endpoint,
            "datasource ready"
        );
        Ok(Arc::new(Self {
            data_source: Some(Arc::new(data_source)),
            ..Self::clone(&self)
        }))
    }

    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        let data_source = self.data_source.clone().ok_or_else(|| {
            AddonError::hook("BasicDataSourceAddon", "datasource was not initialized")
        })?;
        bindings.bind_as(data_source, self.name.as_deref());
        Ok(())
    }

    fn mount(&self, server: &mut dyn ServerHandle) -> Result<(), AddonError> {
        if !self.monitor_integration {
            return Ok(());
        }
        let Some(data_source) = self.data_source.clone() else {
            return Ok(());
        };
        let suffix = self
            .name
            .as_deref()
            .map(|name| format!(" ({name})"))
            .unwrap_or_default();
        let check_name = format!("Database{suffix}: {}", data_source.endpoint());
        server.add_health_check(&check_name, Arc::new(move || data_source.check()));
        Ok(())
    }
}
