//! Ordered addon storage and capability lookup.
//!
//! [`AddonRepo`] keeps addons in registration order. That order is the
//! default processing order and the resolver's tie-break. During
//! composition the repo is append-only; lifecycle phases replace values in
//! place but never reorder, add, or remove slots.

use std::any::Any;
use std::sync::Arc;

use crate::addon::{Addon, normalized_name, provides};
use crate::capability::Capability;
use crate::error::AddonError;
use crate::resolution::Resolution;

/// Ordered collection of addon values.
///
/// # Example
///
/// ```
/// use muster_core::{Addon, AddonRepo, Capability};
///
/// #[derive(Debug)]
/// struct Cache;
///
/// impl Addon for Cache {}
///
/// let mut repo = AddonRepo::new();
/// repo.push(Cache);
/// assert!(repo.is_present(Capability::of::<Cache>()));
/// assert!(repo.require_addon::<Cache>().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AddonRepo {
    addons: Vec<Arc<dyn Addon>>,
}

impl AddonRepo {
    /// Creates an empty repo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repo from already shared addons, keeping their order.
    #[must_use]
    pub const fn from_addons(addons: Vec<Arc<dyn Addon>>) -> Self {
        Self { addons }
    }

    /// Appends an addon.
    pub fn push(&mut self, addon: impl Addon) -> &mut Self {
        self.addons.push(Arc::new(addon));
        self
    }

    /// Appends an already shared addon.
    pub fn push_arc(&mut self, addon: Arc<dyn Addon>) -> &mut Self {
        self.addons.push(addon);
        self
    }

    /// Number of slots.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.addons.len()
    }

    /// Returns `true` when no addon is registered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.addons.is_empty()
    }

    /// Iterates over the current values in registration order.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Arc<dyn Addon>> {
        self.addons.iter()
    }

    /// Returns the value in slot `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<dyn Addon>> {
        self.addons.get(index)
    }

    /// Replaces the value in slot `index`, returning the previous value.
    pub(crate) fn replace(
        &mut self,
        index: usize,
        addon: Arc<dyn Addon>,
    ) -> Option<Arc<dyn Addon>> {
        self.addons
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, addon))
    }

    /// All addons satisfying `capability`, in registration order.
    #[must_use]
    pub fn instances_of(&self, capability: Capability) -> Vec<&Arc<dyn Addon>> {
        self.addons
            .iter()
            .filter(|addon| provides(addon.as_ref(), capability))
            .collect()
    }

    /// Returns `true` when at least one addon satisfies `capability`.
    #[must_use]
    pub fn is_present(&self, capability: Capability) -> bool {
        self.addons
            .iter()
            .any(|addon| provides(addon.as_ref(), capability))
    }

    /// The single addon satisfying `capability`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::Cardinality`] when several addons match.
    pub fn instance_of(
        &self,
        capability: Capability,
    ) -> Result<Option<&Arc<dyn Addon>>, AddonError> {
        Resolution::from_candidates(self.instances_of(capability)).optional(capability, None)
    }

    /// The single addon satisfying `capability`.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::MissingDependency`] when nothing matches and
    /// [`AddonError::Cardinality`] when several addons match.
    pub fn require_instance_of(
        &self,
        capability: Capability,
    ) -> Result<&Arc<dyn Addon>, AddonError> {
        Resolution::from_candidates(self.instances_of(capability)).required(capability, None)
    }

    /// The single addon satisfying `capability` with the given name.
    ///
    /// `None` matches only unnamed addons, so named and unnamed instances of
    /// the same capability never conflict.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::Cardinality`] when several addons share the
    /// name.
    pub fn named_instance_of(
        &self,
        capability: Capability,
        name: Option<&str>,
    ) -> Result<Option<&Arc<dyn Addon>>, AddonError> {
        self.named_candidates(capability, name).optional(capability, name)
    }

    /// The single addon satisfying `capability` with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::MissingDependency`] naming `name` when nothing
    /// matches and [`AddonError::Cardinality`] when several addons share the
    /// name.
    pub fn require_named_instance_of(
        &self,
        capability: Capability,
        name: Option<&str>,
    ) -> Result<&Arc<dyn Addon>, AddonError> {
        self.named_candidates(capability, name).required(capability, name)
    }

    /// The single addon of concrete type `T`, downcast.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::Cardinality`] when several addons of `T` exist.
    pub fn addon<T: Addon>(&self) -> Result<Option<Arc<T>>, AddonError> {
        Ok(self
            .instance_of(Capability::of::<T>())?
            .and_then(downcast::<T>))
    }

    /// The single addon of concrete type `T`, downcast.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::MissingDependency`] when no addon of `T` exists
    /// and [`AddonError::Cardinality`] when several do.
    pub fn require_addon<T: Addon>(&self) -> Result<Arc<T>, AddonError> {
        let capability = Capability::of::<T>();
        downcast::<T>(self.require_instance_of(capability)?)
            .ok_or_else(|| AddonError::missing_dependency(capability, None, None))
    }

    /// The addon of concrete type `T` with the given name, downcast.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::MissingDependency`] when no such addon exists
    /// and [`AddonError::Cardinality`] when several share the name.
    pub fn named_addon<T: Addon>(&self, name: Option<&str>) -> Result<Arc<T>, AddonError> {
        let capability = Capability::of::<T>();
        downcast::<T>(self.require_named_instance_of(capability, name)?)
            .ok_or_else(|| AddonError::missing_dependency(capability, name, None))
    }

    /// Handle of type `H` exposed for `capability` by the addon with the
    /// given name.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::Cardinality`] when several addons match.
    pub fn provided<H: Any + Send + Sync>(
        &self,
        capability: Capability,
        name: Option<&str>,
    ) -> Result<Option<Arc<H>>, AddonError> {
        Ok(self
            .named_instance_of(capability, name)?
            .and_then(|addon| addon.provide(capability))
            .and_then(|handle| handle.downcast::<H>().ok()))
    }

    /// Handle of type `H` exposed for `capability`, which must exist.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::MissingDependency`] when no matching addon
    /// exposes a handle of type `H` and [`AddonError::Cardinality`] when
    /// several addons match.
    pub fn require_provided<H: Any + Send + Sync>(
        &self,
        capability: Capability,
        name: Option<&str>,
    ) -> Result<Arc<H>, AddonError> {
        self.provided::<H>(capability, name)?
            .ok_or_else(|| AddonError::missing_dependency(capability, name, None))
    }

    fn named_candidates(
        &self,
        capability: Capability,
        name: Option<&str>,
    ) -> Resolution<&Arc<dyn Addon>> {
        let wanted = name.filter(|candidate| !candidate.trim().is_empty());
        Resolution::from_candidates(
            self.addons
                .iter()
                .filter(|addon| provides(addon.as_ref(), capability))
                .filter(|addon| normalized_name(addon.as_ref()) == wanted)
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a AddonRepo {
    type Item = &'a Arc<dyn Addon>;
    type IntoIter = std::slice::Iter<'a, Arc<dyn Addon>>;

    fn into_iter(self) -> Self::IntoIter {
        self.addons.iter()
    }
}

fn downcast<T: Addon>(addon: &Arc<dyn Addon>) -> Option<Arc<T>> {
    Arc::clone(addon).into_any().downcast::<T>().ok()
}
