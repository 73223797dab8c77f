//! Thin addons covering the resources a typical service needs.
//!
//! Each addon wraps one resource (a datasource, a message queue, a search
//! index) and takes part in the bootstrap like any other addon: it reads
//! its configuration, builds a handle describing the resource, exports that
//! handle, and mounts health checks. Handles are plain descriptors; opening
//! real connections is left to the code consuming the bindings.
//!
//! Named addons read their keys under `<name>.` so several instances of the
//! same addon can coexist:
//!
//! ```text
//! orders.db.url=jdbc:postgresql://db/orders
//! billing.db.url=jdbc:postgresql://db/billing
//! ```

mod api_docs;
mod datasource;
mod endpoint;
mod exception_mapper;
mod query_runner;
mod queue;
mod search;
mod token;

pub use self::api_docs::{ApiDocsAddon, DEFAULT_API_VERSION, DEFAULT_PATH_SPEC};
pub use self::datasource::{BasicDataSourceAddon, DataSource, DataSourceRole};
pub use self::endpoint::{Endpoint, EndpointError};
pub use self::exception_mapper::{ExceptionMapperAddon, ExceptionMappers};
pub use self::query_runner::{QueryRunner, QueryRunnerAddon};
pub use self::queue::{MessageHandler, MessageQueueListenerAddon, QueueListener};
pub use self::search::{Indexer, SearchClient, SearchClientAddon, SearchIndexAddon, Searcher};
pub use self::token::{AppTokenFilterAddon, AppTokenValidator, TokenServiceAddon, TokenServiceClient};

use muster_config::{PropertyError, prefixed_key};
use muster_core::AddonError;

/// Returns a value set during property resolution.
///
/// An unset value means the addon was initialized without its properties
/// being resolved first.
pub(crate) fn configured<'a>(
    value: Option<&'a str>,
    name: Option<&str>,
    key: &str,
) -> Result<&'a str, AddonError> {
    value.ok_or_else(|| {
        AddonError::from(PropertyError::Missing {
            key: prefixed_key(name, key),
        })
    })
}
