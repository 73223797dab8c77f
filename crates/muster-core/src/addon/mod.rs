//! The addon contract.
//!
//! An [`Addon`] is an immutable value. Each lifecycle hook receives the
//! current value as an `Arc<Self>` and returns the value that replaces it in
//! the registry, typically a copy built with struct update syntax. Hooks
//! that have nothing to change return `self` unchanged; that is what the
//! default implementations do.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use muster_config::PropertyProvider;

use crate::binding::InjectionRegistry;
use crate::capability::Capability;
use crate::error::AddonError;
use crate::registry::AddonRepo;
use crate::server::ServerHandle;

/// Outcome of a value-replacing hook.
pub type AddonResult = Result<Arc<dyn Addon>, AddonError>;

/// A pluggable component of a service.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use muster_config::PropertyProvider;
/// use muster_core::{Addon, AddonResult};
///
/// #[derive(Debug, Clone, Default)]
/// struct Greeting {
///     text: Option<String>,
/// }
///
/// impl Addon for Greeting {
///     fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
///         let text = properties.require_with_fallback("greeting.text", Some("hello"))?;
///         Ok(Arc::new(Self { text: Some(text) }))
///     }
/// }
/// ```
pub trait Addon: AddonUpcast + fmt::Debug + Send + Sync {
    /// Distinguishes several instances of the same addon type.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Roles this addon satisfies in addition to its own concrete type.
    fn capabilities(&self) -> Vec<Capability> {
        Vec::new()
    }

    /// Capabilities that must finish initializing before this addon.
    fn initialize_after(&self) -> Vec<Capability> {
        Vec::new()
    }

    /// Capabilities that must finish finalizing before this addon.
    fn finalize_after(&self) -> Vec<Capability> {
        Vec::new()
    }

    /// Returns a handle this addon exposes for `capability`.
    ///
    /// Siblings use this to reach role values (such as a datasource handle)
    /// without knowing the concrete addon type.
    fn provide(&self, capability: Capability) -> Option<Arc<dyn Any + Send + Sync>> {
        let _ = capability;
        None
    }

    /// Merges configuration into the addon.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::Configuration`] when a required key is absent or
    /// malformed.
    fn with_properties(self: Arc<Self>, properties: &dyn PropertyProvider) -> AddonResult {
        let _ = properties;
        Ok(self.into_addon())
    }

    /// Initializes the addon. Declared predecessors are already initialized.
    ///
    /// # Errors
    ///
    /// Returns an [`AddonError`] when a required sibling is missing or
    /// ambiguous, or the addon cannot build its resources.
    fn initialize(self: Arc<Self>, addons: &AddonRepo) -> AddonResult {
        let _ = addons;
        Ok(self.into_addon())
    }

    /// Validates the addon against its finalized siblings.
    ///
    /// # Errors
    ///
    /// Returns an [`AddonError`] when the composition is inconsistent.
    fn finalize(self: Arc<Self>, addons: &AddonRepo) -> AddonResult {
        let _ = addons;
        Ok(self.into_addon())
    }

    /// Publishes bindings into the injection registry.
    ///
    /// # Errors
    ///
    /// Returns an [`AddonError`] when the addon is not in a state to export.
    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        let _ = bindings;
        Ok(())
    }

    /// Attaches health checks and routes to the server.
    ///
    /// # Errors
    ///
    /// Returns an [`AddonError`] when the addon cannot be mounted.
    fn mount(&self, server: &mut dyn ServerHandle) -> Result<(), AddonError> {
        let _ = server;
        Ok(())
    }

    /// Releases resources on shutdown. Failures are logged, not propagated.
    ///
    /// # Errors
    ///
    /// Returns an [`AddonError`] describing the cleanup failure.
    fn shutdown(&self) -> Result<(), AddonError> {
        Ok(())
    }
}

/// Conversions every sized [`Addon`] gets for free.
pub trait AddonUpcast: Any {
    /// Converts the value into a registry slot value.
    fn into_addon(self: Arc<Self>) -> Arc<dyn Addon>;

    /// Borrows the value as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Converts the value into a shared [`Any`] for downcasting.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;

    /// Returns the capability of the concrete type.
    fn type_capability(&self) -> Capability;
}

impl<T: Addon> AddonUpcast for T {
    fn into_addon(self: Arc<Self>) -> Arc<dyn Addon> {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn type_capability(&self) -> Capability {
        Capability::of::<T>()
    }
}

/// Returns `true` when `addon` satisfies `capability`.
#[must_use]
pub fn provides(addon: &dyn Addon, capability: Capability) -> bool {
    addon.type_capability() == capability || addon.capabilities().contains(&capability)
}

/// Returns the addon's name, treating blank names as unnamed.
#[must_use]
pub fn normalized_name(addon: &dyn Addon) -> Option<&str> {
    addon.name().filter(|name| !name.trim().is_empty())
}

/// Human-readable label: the short type name plus the name, if any.
#[must_use]
pub fn describe(addon: &dyn Addon) -> String {
    let kind = addon.type_capability().short_name();
    normalized_name(addon).map_or_else(|| kind.clone(), |name| format!("{kind}({name})"))
}
