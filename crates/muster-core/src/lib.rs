//! Orchestration core for composing a service out of addons.
//!
//! A service is assembled from independently authored addons: a datasource,
//! a query runner that needs that datasource, a message listener, and so on.
//! This crate turns an ordered collection of addon declarations into a
//! running service by driving every addon through a fixed sequence of
//! phases:
//!
//! 1. **Property resolution**: each addon reads its configuration from a
//!    [`PropertyProvider`](muster_config::PropertyProvider).
//! 2. **Initialize**: addons run in dependency order (see [`resolver`]) and
//!    may look up already-initialized siblings through the [`AddonRepo`].
//! 3. **Finalize**: a second, independent dependency order used for
//!    cross-addon validation.
//! 4. **Wiring**: addons export bindings into an [`InjectionRegistry`].
//! 5. **Mount**: addons attach health checks and routes to a
//!    [`ServerHandle`].
//!
//! Addons are immutable values. Every hook consumes the current value and
//! returns its replacement, which the orchestrator stores back in the
//! addon's slot. Any failure aborts the bootstrap; there is no partial
//! startup.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use muster_config::PropertyMap;
//! use muster_core::{Addon, AddonRepo, BindingTable, Lifecycle, MountTable};
//!
//! #[derive(Debug)]
//! struct Banner;
//!
//! impl Addon for Banner {}
//!
//! let mut repo = AddonRepo::new();
//! repo.push(Banner);
//!
//! let mut bindings = BindingTable::new();
//! let mut server = MountTable::new("/");
//! let service = Lifecycle::new()
//!     .run(repo, &PropertyMap::new(), &mut bindings, &mut server)
//!     .expect("bootstrap succeeds");
//! assert_eq!(service.addons().len(), 1);
//! ```

pub mod addon;
pub mod binding;
pub mod capability;
pub mod error;
pub mod lifecycle;
pub mod registry;
pub mod resolution;
pub mod resolver;
pub mod server;
pub mod service;

#[cfg(test)]
mod tests;

pub use self::addon::{Addon, AddonResult, AddonUpcast, describe};
pub use self::binding::{
    Binding, BindingTable, BindingTarget, Factory, InjectionRegistry, InjectionRegistryExt,
    Instance,
};
pub use self::capability::Capability;
pub use self::error::{AddonError, BootstrapError, OrderFailure};
pub use self::lifecycle::{
    Lifecycle, LifecycleObserver, NoopObserver, Phase, RunningService, ShutdownFailure,
    ShutdownReport,
};
pub use self::registry::AddonRepo;
pub use self::resolution::Resolution;
pub use self::resolver::resolve_order;
pub use self::server::{HealthCheck, HealthStatus, MountTable, Route, ServerHandle};
pub use self::service::{ServiceConfig, ServiceDefinition, Version};
