//! Error taxonomy for composing and bootstrapping a service.
//!
//! Every error is fatal to the bootstrap. [`AddonError`] describes what went
//! wrong; [`BootstrapError`] adds the phase and the addon being processed
//! when it happened. None of these errors are transient, so nothing is
//! retried.

use muster_config::PropertyError;
use thiserror::Error;

use crate::capability::Capability;
use crate::lifecycle::Phase;

/// Errors raised by addon hooks and registry lookups.
#[derive(Debug, Error)]
pub enum AddonError {
    /// A required property is absent or malformed.
    #[error("configuration error: {source}")]
    Configuration {
        /// Underlying property error naming the key.
        #[from]
        source: PropertyError,
    },

    /// No addon provides a required capability.
    #[error("no addon provides {capability}{}{}", named(.name), required_by(.dependent))]
    MissingDependency {
        /// Short name of the missing capability.
        capability: String,
        /// Name qualifier that was looked up, if any.
        name: Option<String>,
        /// Addon that needed the capability, if known.
        dependent: Option<String>,
    },

    /// More than one addon matches where at most one was expected.
    #[error("found {count} addons providing {capability}{}; expected at most one", named(.name))]
    Cardinality {
        /// Short name of the ambiguous capability.
        capability: String,
        /// Name qualifier that was looked up, if any.
        name: Option<String>,
        /// Number of matching addons.
        count: usize,
    },

    /// The dependency graph of a phase cannot be fully ordered.
    #[error("cannot order addons for {phase}: {reason}; unplaced: {}", joined(.unplaced))]
    UnresolvableOrder {
        /// Phase whose order was being computed.
        phase: Phase,
        /// Why no further addon could be placed.
        reason: OrderFailure,
        /// Addons left unplaced, in registration order.
        unplaced: Vec<String>,
    },

    /// An addon-specific failure raised from a hook.
    #[error("{addon}: {message}")]
    Hook {
        /// Addon that failed.
        addon: String,
        /// Human-readable failure description.
        message: String,
    },
}

impl AddonError {
    /// Builds a [`AddonError::MissingDependency`] for a lookup by `dependent`.
    #[must_use]
    pub fn missing_dependency(
        capability: Capability,
        name: Option<&str>,
        dependent: Option<&str>,
    ) -> Self {
        Self::MissingDependency {
            capability: capability.short_name(),
            name: name.map(str::to_owned),
            dependent: dependent.map(str::to_owned),
        }
    }

    /// Builds a [`AddonError::Cardinality`].
    #[must_use]
    pub fn cardinality(capability: Capability, name: Option<&str>, count: usize) -> Self {
        Self::Cardinality {
            capability: capability.short_name(),
            name: name.map(str::to_owned),
            count,
        }
    }

    /// Builds a [`AddonError::Hook`].
    #[must_use]
    pub fn hook(addon: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            addon: addon.into(),
            message: message.into(),
        }
    }

    /// Records the dependent addon on a missing-dependency error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn required_by(self, addon: &str) -> Self {
        match self {
            Self::MissingDependency {
                capability,
                name,
                dependent: None,
            } => Self::MissingDependency {
                capability,
                name,
                dependent: Some(addon.to_owned()),
            },
            other => other,
        }
    }
}

/// Reason a dependency order could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderFailure {
    /// Some predecessor capabilities are provided by no registered addon.
    #[error("no registered addon provides {}", joined(.capabilities))]
    MissingCapability {
        /// Short names of the unprovided capabilities.
        capabilities: Vec<String>,
    },
    /// Every predecessor exists but the remaining addons wait on each other.
    #[error("dependency cycle")]
    Cycle,
}

/// A fatal failure of the bootstrap, with the phase it occurred in.
#[derive(Debug, Error)]
#[error("bootstrap failed during {phase}{}: {source}", at_addon(.addon))]
pub struct BootstrapError {
    phase: Phase,
    addon: Option<String>,
    #[source]
    source: AddonError,
}

impl BootstrapError {
    /// Wraps `source` with the phase and addon it occurred in.
    #[must_use]
    pub const fn new(phase: Phase, addon: Option<String>, source: AddonError) -> Self {
        Self {
            phase,
            addon,
            source,
        }
    }

    /// Phase that failed.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Addon being processed, if the failure concerned a single addon.
    #[must_use]
    pub fn addon(&self) -> Option<&str> {
        self.addon.as_deref()
    }

    /// Underlying error.
    #[must_use]
    pub const fn kind(&self) -> &AddonError {
        &self.source
    }

    /// Consumes the wrapper, returning the underlying error.
    #[must_use]
    pub fn into_kind(self) -> AddonError {
        self.source
    }
}

fn named(name: &Option<String>) -> String {
    name.as_deref()
        .map(|qualifier| format!(" named '{qualifier}'"))
        .unwrap_or_default()
}

fn required_by(dependent: &Option<String>) -> String {
    dependent
        .as_deref()
        .map(|label| format!(" (required by {label})"))
        .unwrap_or_default()
}

fn at_addon(addon: &Option<String>) -> String {
    addon
        .as_deref()
        .map(|label| format!(" of {label}"))
        .unwrap_or_default()
}

fn joined(items: &[String]) -> String {
    items.join(", ")
}
