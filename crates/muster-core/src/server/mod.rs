//! The surface addons mount health checks and routes on.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Result of one health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// The checked resource is usable.
    Healthy,
    /// The checked resource is unusable, with a reason.
    Unhealthy(String),
}

impl HealthStatus {
    /// Returns `true` for [`HealthStatus::Healthy`].
    #[must_use]
    pub const fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }
}

/// A named health check.
pub type HealthCheck = Arc<dyn Fn() -> HealthStatus + Send + Sync>;

/// A mounted endpoint: the handler it dispatches to and its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    handler: String,
    params: BTreeMap<String, String>,
}

impl Route {
    /// Creates a route dispatching to `handler`.
    #[must_use]
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a setting.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Handler identifier.
    #[must_use]
    pub fn handler(&self) -> &str {
        &self.handler
    }

    /// Looks a setting up.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// Server surface handed to [`Addon::mount`](crate::Addon::mount).
pub trait ServerHandle {
    /// Registers a health check under `name`.
    fn add_health_check(&mut self, name: &str, check: HealthCheck);

    /// Registers a route at `path`, relative to the context path.
    fn add_route(&mut self, path: &str, route: Route);

    /// Prefix every route is served under.
    fn context_path(&self) -> &str;
}

/// In-process [`ServerHandle`] recording what addons mounted.
#[derive(Clone, Default)]
pub struct MountTable {
    context_path: String,
    health_checks: Vec<(String, HealthCheck)>,
    routes: Vec<(String, Route)>,
}

impl fmt::Debug for MountTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountTable")
            .field("context_path", &self.context_path)
            .field("health_checks", &self.health_check_names())
            .field("routes", &self.routes)
            .finish()
    }
}

impl MountTable {
    /// Creates an empty table serving under `context_path`.
    #[must_use]
    pub fn new(context_path: impl Into<String>) -> Self {
        Self {
            context_path: context_path.into(),
            ..Self::default()
        }
    }

    /// Names of the mounted health checks, in mount order.
    #[must_use]
    pub fn health_check_names(&self) -> Vec<&str> {
        self.health_checks
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Evaluates every health check, in mount order.
    #[must_use]
    pub fn run_health_checks(&self) -> Vec<(String, HealthStatus)> {
        self.health_checks
            .iter()
            .map(|(name, check)| (name.clone(), check()))
            .collect()
    }

    /// Mounted routes with their full paths, in mount order.
    #[must_use]
    pub fn routes(&self) -> &[(String, Route)] {
        &self.routes
    }

    /// Looks a route up by its full path.
    #[must_use]
    pub fn route(&self, path: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|(mounted, _)| mounted == path)
            .map(|(_, route)| route)
    }
}

impl ServerHandle for MountTable {
    fn add_health_check(&mut self, name: &str, check: HealthCheck) {
        self.health_checks.push((name.to_owned(), check));
    }

    fn add_route(&mut self, path: &str, route: Route) {
        let full = join_path(&self.context_path, path);
        self.routes.push((full, route));
    }

    fn context_path(&self) -> &str {
        &self.context_path
    }
}

fn join_path(context_path: &str, path: &str) -> String {
    let base = context_path.trim_end_matches('/');
    let relative = path.trim_start_matches('/');
    format!("{base}/{relative}")
}

#[cfg(test)]
mod tests;
