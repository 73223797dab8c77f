//! Per-error-kind stack trace logging policy.

use std::collections::BTreeMap;
use std::sync::Arc;

use muster_core::{Addon, AddonError, InjectionRegistry, InjectionRegistryExt};

/// Error kind every unlisted kind falls back to.
const ANY_KIND: &str = "*";

/// Decides which mapped errors log their stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionMappers {
    stacktraces: BTreeMap<String, bool>,
}

impl ExceptionMappers {
    /// Returns `true` when errors of `kind` log their stack trace.
    ///
    /// Unlisted kinds follow the `*` entry, which defaults to `true`.
    #[must_use]
    pub fn logs_stacktrace(&self, kind: &str) -> bool {
        self.stacktraces
            .get(kind)
            .or_else(|| self.stacktraces.get(ANY_KIND))
            .copied()
            .unwrap_or(true)
    }

    /// Configured kinds and their policy.
    #[must_use]
    pub fn policies(&self) -> impl Iterator<Item = (&str, bool)> {
        self.stacktraces
            .iter()
            .map(|(kind, logs)| (kind.as_str(), *logs))
    }
}

/// Exports the error-mapping policy.
///
/// Stack traces are logged for every kind except `not_found`, unless
/// overridden with [`ExceptionMapperAddon::stacktrace`].
#[derive(Debug, Clone)]
pub struct ExceptionMapperAddon {
    mappers: ExceptionMappers,
}

impl Default for ExceptionMapperAddon {
    fn default() -> Self {
        Self::new()
    }
}

impl ExceptionMapperAddon {
    /// Creates the addon with the default policy.
    #[must_use]
    pub fn new() -> Self {
        let stacktraces = BTreeMap::from([
            (String::from(ANY_KIND), true),
            (String::from("not_found"), false),
        ]);
        Self {
            mappers: ExceptionMappers { stacktraces },
        }
    }

    /// Sets whether errors of `kind` log their stack trace.
    #[must_use]
    pub fn stacktrace(mut self, kind: impl Into<String>, logs: bool) -> Self {
        self.mappers.stacktraces.insert(kind.into(), logs);
        self
    }

    /// The configured policy.
    #[must_use]
    pub const fn mappers(&self) -> &ExceptionMappers {
        &self.mappers
    }
}

impl Addon for ExceptionMapperAddon {
    fn export(&self, bindings: &mut dyn InjectionRegistry) -> Result<(), AddonError> {
        bindings.bind_as(Arc::new(self.mappers.clone()), None);
        bindings.bind_as(Arc::new(self.clone()), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::default_kind("validation", true)]
    #[case::not_found("not_found", false)]
    fn default_policy(#[case] kind: &str, #[case] expected: bool) {
        assert_eq!(ExceptionMapperAddon::new().mappers().logs_stacktrace(kind), expected);
    }

    #[test]
    fn overrides_apply_per_kind() {
        let addon = ExceptionMapperAddon::new()
            .stacktrace("not_found", true)
            .stacktrace("*", false);
        assert!(addon.mappers().logs_stacktrace("not_found"));
        assert!(!addon.mappers().logs_stacktrace("validation"));
        assert_eq!(addon.mappers().policies().count(), 2);
    }
}
