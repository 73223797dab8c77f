//! Service composition: a definition plus ordered addon declarations.

use std::fmt;
use std::sync::Arc;

use crate::addon::Addon;
use crate::registry::AddonRepo;

/// Semantic version of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Incompatible API changes.
    pub major: u32,
    /// Backwards-compatible additions.
    pub minor: u32,
    /// Fixes.
    pub patch: u32,
}

impl Version {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Identity of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    name: String,
    version: Version,
}

impl ServiceDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }

    /// Service name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Service version.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }
}

/// A service under composition.
///
/// Addons are appended in declaration order, which becomes the registry
/// order.
///
/// # Example
///
/// ```
/// use muster_core::{Addon, ServiceConfig, ServiceDefinition, Version};
///
/// #[derive(Debug)]
/// struct Cache;
///
/// impl Addon for Cache {}
///
/// let config = ServiceConfig::new(ServiceDefinition::new("orders", Version::new(1, 0, 0)))
///     .addon(Cache);
/// assert_eq!(config.addons().len(), 1);
/// assert_eq!(config.definition().name(), "orders");
/// ```
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    definition: ServiceDefinition,
    addons: AddonRepo,
}

impl ServiceConfig {
    /// Starts a composition with no addons.
    #[must_use]
    pub fn new(definition: ServiceDefinition) -> Self {
        Self {
            definition,
            addons: AddonRepo::new(),
        }
    }

    /// Appends an addon.
    #[must_use]
    pub fn addon(mut self, addon: impl Addon) -> Self {
        self.addons.push(addon);
        self
    }

    /// Appends an already shared addon.
    #[must_use]
    pub fn addon_arc(mut self, addon: Arc<dyn Addon>) -> Self {
        self.addons.push_arc(addon);
        self
    }

    /// Service identity.
    #[must_use]
    pub const fn definition(&self) -> &ServiceDefinition {
        &self.definition
    }

    /// Declared addons.
    #[must_use]
    pub const fn addons(&self) -> &AddonRepo {
        &self.addons
    }

    /// Splits the composition into its definition and addons.
    #[must_use]
    pub fn into_parts(self) -> (ServiceDefinition, AddonRepo) {
        (self.definition, self.addons)
    }
}
