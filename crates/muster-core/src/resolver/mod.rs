//! Deterministic dependency ordering for a lifecycle phase.
//!
//! The resolver keeps registration order wherever the constraints allow
//! it. It repeatedly scans the pending addons from the left and places the
//! first one whose every predecessor capability is provided by an addon
//! that has already been placed. A scan that places nothing means the
//! remaining addons can never be placed.

use std::collections::HashSet;

use tracing::debug;

use crate::addon::{Addon, describe, provides};
use crate::capability::Capability;
use crate::error::{AddonError, OrderFailure};
use crate::lifecycle::Phase;
use crate::registry::AddonRepo;

/// Computes the processing order of `repo` for `phase`.
///
/// Returns slot indices. Initialize and finalize use their own predecessor
/// sets; every other phase keeps registration order.
///
/// # Errors
///
/// Returns [`AddonError::UnresolvableOrder`] when the predecessor graph has
/// a cycle or names a capability no registered addon provides.
pub fn resolve_order(repo: &AddonRepo, phase: Phase) -> Result<Vec<usize>, AddonError> {
    let predecessors: fn(&dyn Addon) -> Vec<Capability> = match phase {
        Phase::Initialize => |addon| addon.initialize_after(),
        Phase::Finalize => |addon| addon.finalize_after(),
        _ => return Ok((0..repo.len()).collect()),
    };
    let addons: Vec<&dyn Addon> = repo.iter().map(AsRef::as_ref).collect();
    order_by(&addons, predecessors).map_err(|pending| {
        let unplaced: Vec<&dyn Addon> = pending
            .iter()
            .filter_map(|&index| addons.get(index).copied())
            .collect();
        AddonError::UnresolvableOrder {
            phase,
            reason: classify(&addons, &unplaced, predecessors),
            unplaced: unplaced.iter().map(|addon| describe(*addon)).collect(),
        }
    })
}

/// Orders `addons`, returning the indices left pending on failure.
fn order_by(
    addons: &[&dyn Addon],
    predecessors: fn(&dyn Addon) -> Vec<Capability>,
) -> Result<Vec<usize>, Vec<usize>> {
    let mut pending: Vec<usize> = (0..addons.len()).collect();
    let mut placed: Vec<usize> = Vec::with_capacity(addons.len());

    while !pending.is_empty() {
        let next = pending.iter().position(|&index| {
            addons.get(index).is_some_and(|addon| {
                predecessors(*addon).into_iter().all(|capability| {
                    placed.iter().any(|&done| {
                        addons
                            .get(done)
                            .is_some_and(|provider| provides(*provider, capability))
                    })
                })
            })
        });
        let Some(at) = next else {
            return Err(pending);
        };
        let index = pending.remove(at);
        if let Some(addon) = addons.get(index) {
            debug!(
                target: "muster::lifecycle",
                addon = %describe(*addon),
                position = placed.len(),
                "placed addon"
            );
        }
        placed.push(index);
    }
    Ok(placed)
}

/// Distinguishes an unprovided predecessor from a cycle.
fn classify(
    addons: &[&dyn Addon],
    unplaced: &[&dyn Addon],
    predecessors: fn(&dyn Addon) -> Vec<Capability>,
) -> OrderFailure {
    let mut seen = HashSet::new();
    let capabilities: Vec<String> = unplaced
        .iter()
        .flat_map(|addon| predecessors(*addon))
        .filter(|capability| !addons.iter().any(|addon| provides(*addon, *capability)))
        .filter(|capability| seen.insert(*capability))
        .map(Capability::short_name)
        .collect();
    if capabilities.is_empty() {
        OrderFailure::Cycle
    } else {
        OrderFailure::MissingCapability { capabilities }
    }
}

#[cfg(test)]
mod tests;
