//! First-class type descriptors used to look addons up.
//!
//! A [`Capability`] names a role an addon can be found by. Every addon
//! satisfies the capability of its own concrete type; additional roles (for
//! example "is a datasource") are declared explicitly by the addon through
//! [`Addon::capabilities`](crate::Addon::capabilities). Role markers are
//! ordinary types, typically zero-sized structs, so capability checks are
//! plain type-identity comparisons.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Descriptor of a type an addon can be looked up by.
///
/// Equality and hashing use the type identity only; the type name is kept
/// for diagnostics.
///
/// # Example
///
/// ```
/// use muster_core::Capability;
///
/// struct DataSourceRole;
///
/// let role = Capability::of::<DataSourceRole>();
/// assert_eq!(role, Capability::of::<DataSourceRole>());
/// assert_eq!(role.short_name(), "DataSourceRole");
/// ```
#[derive(Clone, Copy)]
pub struct Capability {
    id: TypeId,
    name: &'static str,
}

impl Capability {
    /// Returns the descriptor for `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }

    /// Returns the type identity.
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.id
    }

    /// Returns the type name without its module path.
    ///
    /// Generic arguments are kept verbatim.
    #[must_use]
    pub fn short_name(self) -> String {
        let (head, generics) = self
            .name
            .find('<')
            .map_or((self.name, ""), |at| self.name.split_at(at));
        let base = head.rsplit("::").next().unwrap_or(head);
        format!("{base}{generics}")
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capability").field(&self.name).finish()
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_name())
    }
}

#[cfg(test)]
mod tests;
