//! Unit tests for dependency ordering.

use rstest::rstest;

use super::*;
use crate::tests::{Journal, Stub, RoleA, RoleB, RoleC, labels, repo_of};

fn ordered(repo: &AddonRepo, phase: Phase) -> Vec<String> {
    let order = resolve_order(repo, phase).expect("order resolves");
    let names = labels(repo);
    order
        .into_iter()
        .filter_map(|index| names.get(index).cloned())
        .collect()
}

#[rstest]
#[case::initialize(Phase::Initialize)]
#[case::finalize(Phase::Finalize)]
#[case::wiring(Phase::Wiring)]
fn no_constraints_keep_registration_order(#[case] phase: Phase) {
    let repo = repo_of(
        &Journal::default(),
        vec![Stub::new("x"), Stub::new("y"), Stub::new("z")],
    );
    assert_eq!(ordered(&repo, phase), ["x", "y", "z"]);
}

#[test]
fn direct_dependency_moves_dependee_first() {
    let repo = repo_of(
        &Journal::default(),
        vec![
            Stub::new("b").role::<RoleB>().initialize_after::<RoleA>(),
            Stub::new("a").role::<RoleA>(),
        ],
    );
    assert_eq!(ordered(&repo, Phase::Initialize), ["a", "b"]);
}

#[test]
fn transitive_chain_is_ordered() {
    // dependent -> {immediate, dependee}, immediate -> dependee
    let repo = repo_of(
        &Journal::default(),
        vec![
            Stub::new("dependent")
                .role::<RoleC>()
                .initialize_after::<RoleB>()
                .initialize_after::<RoleA>(),
            Stub::new("dependee").role::<RoleA>(),
            Stub::new("immediate")
                .role::<RoleB>()
                .initialize_after::<RoleA>(),
        ],
    );
    assert_eq!(
        ordered(&repo, Phase::Initialize),
        ["dependee", "immediate", "dependent"]
    );
}

#[test]
fn every_predecessor_must_be_placed() {
    let repo = repo_of(
        &Journal::default(),
        vec![
            Stub::new("c")
                .role::<RoleC>()
                .initialize_after::<RoleA>()
                .initialize_after::<RoleB>(),
            Stub::new("a").role::<RoleA>(),
            Stub::new("free"),
            Stub::new("b").role::<RoleB>(),
        ],
    );
    assert_eq!(ordered(&repo, Phase::Initialize), ["a", "free", "b", "c"]);
}

#[test]
fn earliest_satisfiable_addon_wins() {
    let repo = repo_of(
        &Journal::default(),
        vec![
            Stub::new("late").initialize_after::<RoleA>(),
            Stub::new("free"),
            Stub::new("a").role::<RoleA>(),
        ],
    );
    assert_eq!(ordered(&repo, Phase::Initialize), ["free", "a", "late"]);
}

#[test]
fn predecessor_satisfied_by_any_provider() {
    let repo = repo_of(
        &Journal::default(),
        vec![
            Stub::new("runner").initialize_after::<RoleA>(),
            Stub::new("first").role::<RoleA>().named("one"),
            Stub::new("second").role::<RoleA>().named("two"),
        ],
    );
    assert_eq!(
        ordered(&repo, Phase::Initialize),
        ["first", "runner", "second"]
    );
}

#[test]
fn cycle_is_unresolvable() {
    let repo = repo_of(
        &Journal::default(),
        vec![
            Stub::new("a").role::<RoleA>().initialize_after::<RoleB>(),
            Stub::new("b").role::<RoleB>().initialize_after::<RoleA>(),
            Stub::new("c"),
        ],
    );
    let error = resolve_order(&repo, Phase::Initialize).expect_err("cycle");
    let AddonError::UnresolvableOrder {
        phase,
        reason,
        unplaced,
    } = error
    else {
        panic!("expected UnresolvableOrder");
    };
    assert_eq!(phase, Phase::Initialize);
    assert_eq!(reason, OrderFailure::Cycle);
    assert_eq!(unplaced, ["Stub", "Stub"]);
}

#[test]
fn missing_capability_is_unresolvable() {
    let repo = repo_of(
        &Journal::default(),
        vec![Stub::new("a").named("orders").initialize_after::<RoleC>()],
    );
    let error = resolve_order(&repo, Phase::Initialize).expect_err("missing");
    let AddonError::UnresolvableOrder {
        reason, unplaced, ..
    } = error
    else {
        panic!("expected UnresolvableOrder");
    };
    assert_eq!(
        reason,
        OrderFailure::MissingCapability {
            capabilities: vec![String::from("RoleC")]
        }
    );
    assert_eq!(unplaced, ["Stub(orders)"]);
}

#[test]
fn finalize_order_is_independent_of_initialize_order() {
    let repo = repo_of(
        &Journal::default(),
        vec![
            Stub::new("a")
                .role::<RoleA>()
                .finalize_after::<RoleB>(),
            Stub::new("b")
                .role::<RoleB>()
                .initialize_after::<RoleA>(),
        ],
    );
    assert_eq!(ordered(&repo, Phase::Initialize), ["a", "b"]);
    assert_eq!(ordered(&repo, Phase::Finalize), ["b", "a"]);
}

#[test]
fn self_provided_predecessor_is_a_cycle() {
    let repo = repo_of(
        &Journal::default(),
        vec![Stub::new("a").role::<RoleA>().initialize_after::<RoleA>()],
    );
    let error = resolve_order(&repo, Phase::Initialize).expect_err("cycle");
    assert!(matches!(
        error,
        AddonError::UnresolvableOrder {
            reason: OrderFailure::Cycle,
            ..
        }
    ));
}
