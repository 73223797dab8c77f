//! Cardinality rules shared by every lookup.
//!
//! A candidate set, already filtered by capability and optional name,
//! resolves to exactly one of three outcomes. Ambiguity is never settled by
//! registration order; it is always a configuration error.

use crate::capability::Capability;
use crate::error::AddonError;

/// Outcome of filtering candidates for a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T> {
    /// No candidate matched.
    Empty,
    /// Exactly one candidate matched.
    Single(T),
    /// Several candidates matched.
    Ambiguous(usize),
}

impl<T> Resolution<T> {
    /// Classifies a candidate list.
    #[must_use]
    pub fn from_candidates(candidates: Vec<T>) -> Self {
        let count = candidates.len();
        let mut iter = candidates.into_iter();
        match (iter.next(), count) {
            (None, _) => Self::Empty,
            (Some(single), 1) => Self::Single(single),
            (Some(_), _) => Self::Ambiguous(count),
        }
    }

    /// Accepts zero or one candidate.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::Cardinality`] when several candidates matched.
    pub fn optional(
        self,
        capability: Capability,
        name: Option<&str>,
    ) -> Result<Option<T>, AddonError> {
        match self {
            Self::Empty => Ok(None),
            Self::Single(value) => Ok(Some(value)),
            Self::Ambiguous(count) => Err(AddonError::cardinality(capability, name, count)),
        }
    }

    /// Accepts exactly one candidate.
    ///
    /// # Errors
    ///
    /// Returns [`AddonError::MissingDependency`] when nothing matched and
    /// [`AddonError::Cardinality`] when several candidates matched.
    pub fn required(self, capability: Capability, name: Option<&str>) -> Result<T, AddonError> {
        self.optional(capability, name)?
            .ok_or_else(|| AddonError::missing_dependency(capability, name, None))
    }
}

#[cfg(test)]
mod tests;
