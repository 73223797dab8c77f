//! The service `musterd` boots.

use muster_addons::{ApiDocsAddon, BasicDataSourceAddon, ExceptionMapperAddon, QueryRunnerAddon};
use muster_core::{ServiceConfig, ServiceDefinition, Version};

/// Name of the template service.
pub const TEMPLATE_NAME: &str = "muster-template";

/// A database-backed API: error mapping, API docs, one datasource and its
/// query runner.
///
/// The query runner is registered before the datasource; the initialize
/// order puts the datasource first regardless.
#[must_use]
pub fn template_service() -> ServiceConfig {
    ServiceConfig::new(ServiceDefinition::new(TEMPLATE_NAME, Version::new(1, 0, 0)))
        .addon(ExceptionMapperAddon::new())
        .addon(ApiDocsAddon::new())
        .addon(QueryRunnerAddon::new())
        .addon(BasicDataSourceAddon::new())
}
