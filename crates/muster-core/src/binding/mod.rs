//! Publishing addon capabilities into an injection registry.
//!
//! During wiring each addon exports the values it wants the rest of the
//! service to consume. A binding pairs a [`Capability`] and an optional
//! name with either a ready instance or a [`Factory`] that builds one on
//! demand. [`BindingTable`] is the in-process registry used by the daemon
//! and by tests.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::capability::Capability;

/// A shared, type-erased bound value.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Deferred construction of a bound value.
pub type Factory = Arc<dyn Fn() -> Instance + Send + Sync>;

/// Destination of exported bindings.
pub trait InjectionRegistry {
    /// Binds `instance` as the unnamed provider of `capability`.
    fn bind(&mut self, instance: Instance, capability: Capability);

    /// Binds `instance` as the provider of `capability` called `name`.
    fn bind_named(&mut self, instance: Instance, capability: Capability, name: &str);

    /// Binds `factory` as the unnamed provider of `capability`.
    fn bind_factory(&mut self, factory: Factory, capability: Capability);

    /// Binds `factory` as the provider of `capability` called `name`.
    fn bind_named_factory(&mut self, factory: Factory, capability: Capability, name: &str);
}

/// Typed conveniences over [`InjectionRegistry`].
pub trait InjectionRegistryExt: InjectionRegistry {
    /// Binds `value` under its own type, named when `name` is non-blank.
    fn bind_as<T: Any + Send + Sync>(&mut self, value: Arc<T>, name: Option<&str>) {
        let capability = Capability::of::<T>();
        let Some(qualifier) = name.filter(|candidate| !candidate.trim().is_empty()) else {
            self.bind(value, capability);
            return;
        };
        self.bind_named(value, capability, qualifier);
    }

    /// Binds a factory producing `T`, named when `name` is non-blank.
    fn bind_factory_for<T, F>(&mut self, name: Option<&str>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let capability = Capability::of::<T>();
        let erased: Factory = Arc::new(move || -> Instance { Arc::new(factory()) });
        let Some(qualifier) = name.filter(|candidate| !candidate.trim().is_empty()) else {
            self.bind_factory(erased, capability);
            return;
        };
        self.bind_named_factory(erased, capability, qualifier);
    }
}

impl<R: InjectionRegistry + ?Sized> InjectionRegistryExt for R {}

/// What a binding resolves to.
#[derive(Clone)]
pub enum BindingTarget {
    /// A value built during wiring.
    Instance(Instance),
    /// A constructor invoked on every resolution.
    Factory(Factory),
}

impl BindingTarget {
    /// Produces the bound value.
    #[must_use]
    pub fn get(&self) -> Instance {
        match self {
            Self::Instance(instance) => Arc::clone(instance),
            Self::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for BindingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(_) => f.write_str("Instance"),
            Self::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// One exported binding.
#[derive(Debug, Clone)]
pub struct Binding {
    capability: Capability,
    name: Option<String>,
    target: BindingTarget,
}

impl Binding {
    /// Capability the binding provides.
    #[must_use]
    pub const fn capability(&self) -> Capability {
        self.capability
    }

    /// Name qualifier, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The bound instance or factory.
    #[must_use]
    pub const fn target(&self) -> &BindingTarget {
        &self.target
    }

    fn matches(&self, capability: Capability, name: Option<&str>) -> bool {
        self.capability == capability && self.name.as_deref() == name
    }
}

/// In-process [`InjectionRegistry`] keeping bindings in export order.
///
/// Later bindings for the same capability and name shadow earlier ones on
/// lookup, while [`BindingTable::bindings`] still lists all of them.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use muster_core::{BindingTable, InjectionRegistryExt};
///
/// let mut table = BindingTable::new();
/// table.bind_as(Arc::new(String::from("jdbc:h2:mem")), Some("orders"));
/// let url = table.resolve_named::<String>("orders").expect("bound");
/// assert_eq!(url.as_str(), "jdbc:h2:mem");
/// ```
#[derive(Debug, Clone, Default)]
pub struct BindingTable {
    bindings: Vec<Binding>,
}

impl BindingTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All bindings in export order.
    #[must_use]
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Number of bindings.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns `true` when nothing was exported.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Resolves the latest binding of `capability` with the given name.
    #[must_use]
    pub fn resolve_capability(
        &self,
        capability: Capability,
        name: Option<&str>,
    ) -> Option<Instance> {
        self.bindings
            .iter()
            .rev()
            .find(|binding| binding.matches(capability, name))
            .map(|binding| binding.target.get())
    }

    /// Resolves the unnamed binding of `T`.
    #[must_use]
    pub fn resolve<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.resolve_capability(Capability::of::<T>(), None)
            .and_then(|instance| instance.downcast::<T>().ok())
    }

    /// Resolves the binding of `T` called `name`.
    #[must_use]
    pub fn resolve_named<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.resolve_capability(Capability::of::<T>(), Some(name))
            .and_then(|instance| instance.downcast::<T>().ok())
    }

    fn push(&mut self, capability: Capability, name: Option<&str>, target: BindingTarget) {
        self.bindings.push(Binding {
            capability,
            name: name.map(str::to_owned),
            target,
        });
    }
}

impl InjectionRegistry for BindingTable {
    fn bind(&mut self, instance: Instance, capability: Capability) {
        self.push(capability, None, BindingTarget::Instance(instance));
    }

    fn bind_named(&mut self, instance: Instance, capability: Capability, name: &str) {
        self.push(capability, Some(name), BindingTarget::Instance(instance));
    }

    fn bind_factory(&mut self, factory: Factory, capability: Capability) {
        self.push(capability, None, BindingTarget::Factory(factory));
    }

    fn bind_named_factory(&mut self, factory: Factory, capability: Capability, name: &str) {
        self.push(capability, Some(name), BindingTarget::Factory(factory));
    }
}
