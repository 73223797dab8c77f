//! Unit tests for the lifecycle orchestrator.

use std::sync::Arc;

use mockall::{Sequence, mock, predicate::eq};
use muster_config::PropertyMap;
use rstest::{fixture, rstest};

use super::*;
use crate::binding::BindingTable;
use crate::error::OrderFailure;
use crate::server::MountTable;
use crate::tests::{Journal, Stub, RoleA, RoleB, RoleC, labels, repo_of};

mock! {
    Observer {}
    impl LifecycleObserver for Observer {
        fn phase_starting(&self, phase: Phase, order: &[String]);
        fn addon_processed(&self, phase: Phase, addon: &str);
        fn phase_completed(&self, phase: Phase);
        fn bootstrap_failed(&self, error: &BootstrapError);
    }
}

#[fixture]
fn journal() -> Journal {
    Journal::default()
}

fn stubs(repo: &AddonRepo) -> Vec<Stub> {
    repo.iter()
        .filter_map(|addon| addon.as_any().downcast_ref::<Stub>().cloned())
        .collect()
}

#[rstest]
fn prepare_runs_hooks_in_dependency_order(journal: Journal) {
    let repo = repo_of(
        &journal,
        vec![
            Stub::new("c").role::<RoleC>().initialize_after::<RoleB>(),
            Stub::new("a").role::<RoleA>(),
            Stub::new("b").role::<RoleB>().initialize_after::<RoleA>(),
        ],
    );

    let prepared = Lifecycle::new()
        .prepare(repo, &PropertyMap::new())
        .expect("prepare succeeds");

    assert_eq!(journal.labels(Phase::PropertyResolution), ["c", "a", "b"]);
    assert_eq!(journal.labels(Phase::Initialize), ["a", "b", "c"]);
    assert_eq!(journal.labels(Phase::Finalize), ["c", "a", "b"]);
    assert_eq!(labels(&prepared), ["c", "a", "b"]);
    assert!(
        stubs(&prepared)
            .iter()
            .all(|stub| stub.initialized && stub.finalized)
    );
}

#[rstest]
fn hook_results_replace_slot_values(journal: Journal) {
    let repo = repo_of(
        &journal,
        vec![
            Stub::new("plain").requires_key("greeting"),
            Stub::new("named").named("orders").requires_key("greeting"),
        ],
    );
    let properties = PropertyMap::new()
        .with("greeting", "hello")
        .with("orders.greeting", "hei");

    let prepared = Lifecycle::new()
        .prepare(repo, &properties)
        .expect("prepare succeeds");

    let configured: Vec<Option<String>> = stubs(&prepared)
        .into_iter()
        .map(|stub| stub.configured)
        .collect();
    assert_eq!(
        configured,
        [Some(String::from("hello")), Some(String::from("hei"))]
    );
}

#[rstest]
fn unresolvable_initialize_order_touches_no_addon(journal: Journal) {
    let repo = repo_of(
        &journal,
        vec![
            Stub::new("a").role::<RoleA>().initialize_after::<RoleB>(),
            Stub::new("b").role::<RoleB>().initialize_after::<RoleA>(),
        ],
    );

    let error = Lifecycle::new()
        .prepare(repo, &PropertyMap::new())
        .expect_err("cycle");

    assert_eq!(error.phase(), Phase::Initialize);
    assert!(error.addon().is_none());
    assert!(matches!(
        error.kind(),
        AddonError::UnresolvableOrder {
            reason: OrderFailure::Cycle,
            ..
        }
    ));
    assert!(journal.untouched(Phase::Initialize));
}

#[rstest]
fn property_failure_aborts_before_initialize(journal: Journal) {
    let repo = repo_of(
        &journal,
        vec![
            Stub::new("ok"),
            Stub::new("db").named("orders").requires_key("db.url"),
        ],
    );

    let error = Lifecycle::new()
        .prepare(repo, &PropertyMap::new())
        .expect_err("missing key");

    assert_eq!(error.phase(), Phase::PropertyResolution);
    assert_eq!(error.addon(), Some("Stub(orders)"));
    assert!(error.to_string().contains("orders.db.url"), "{error}");
    assert!(journal.untouched(Phase::Initialize));
}

#[rstest]
fn failing_initialize_stops_later_addons(journal: Journal) {
    let repo = repo_of(
        &journal,
        vec![
            Stub::new("first"),
            Stub::new("broken").fail_in(Phase::Initialize),
            Stub::new("last"),
        ],
    );

    let error = Lifecycle::new()
        .prepare(repo, &PropertyMap::new())
        .expect_err("hook fails");

    assert_eq!(error.phase(), Phase::Initialize);
    assert_eq!(journal.labels(Phase::Initialize), ["first", "broken"]);
    assert!(journal.untouched(Phase::Finalize));
}

#[rstest]
fn finalize_runs_in_its_own_order(journal: Journal) {
    let repo = repo_of(
        &journal,
        vec![
            Stub::new("a").role::<RoleA>().finalize_after::<RoleB>(),
            Stub::new("b").role::<RoleB>().initialize_after::<RoleA>(),
        ],
    );

    Lifecycle::new()
        .prepare(repo, &PropertyMap::new())
        .expect("prepare succeeds");

    assert_eq!(journal.labels(Phase::Initialize), ["a", "b"]);
    assert_eq!(journal.labels(Phase::Finalize), ["b", "a"]);
}

#[rstest]
fn run_wires_and_mounts_in_registration_order(journal: Journal) {
    let repo = repo_of(
        &journal,
        vec![
            Stub::new("b").role::<RoleB>().initialize_after::<RoleA>(),
            Stub::new("a").role::<RoleA>().named("orders"),
        ],
    );
    let mut bindings = BindingTable::new();
    let mut server = MountTable::new("/");

    let service = Lifecycle::new()
        .run(repo, &PropertyMap::new(), &mut bindings, &mut server)
        .expect("bootstrap succeeds");

    assert_eq!(journal.labels(Phase::Wiring), ["b", "a"]);
    assert_eq!(journal.labels(Phase::Mount), ["b", "a"]);
    assert_eq!(server.health_check_names(), ["b", "a"]);
    assert_eq!(
        bindings.resolve_named::<String>("orders").as_deref(),
        Some(&String::from("a"))
    );
    assert_eq!(bindings.resolve::<String>().as_deref(), Some(&String::from("b")));
    assert_eq!(service.addons().len(), 2);
}

#[rstest]
fn failing_wiring_skips_mount(journal: Journal) {
    let repo = repo_of(&journal, vec![Stub::new("a").fail_in(Phase::Wiring)]);
    let mut bindings = BindingTable::new();
    let mut server = MountTable::new("/");

    let error = Lifecycle::new()
        .run(repo, &PropertyMap::new(), &mut bindings, &mut server)
        .expect_err("wiring fails");

    assert_eq!(error.phase(), Phase::Wiring);
    assert!(journal.untouched(Phase::Mount));
    assert!(server.health_check_names().is_empty());
}

#[rstest]
fn shutdown_continues_after_failures(journal: Journal) {
    let repo = repo_of(
        &journal,
        vec![
            Stub::new("a"),
            Stub::new("b").fail_in(Phase::Shutdown),
            Stub::new("c"),
        ],
    );
    let service = Lifecycle::new()
        .run(
            repo,
            &PropertyMap::new(),
            &mut BindingTable::new(),
            &mut MountTable::new("/"),
        )
        .expect("bootstrap succeeds");

    let report = service.shutdown();

    assert_eq!(journal.labels(Phase::Shutdown), ["c", "b", "a"]);
    assert_eq!(report.stopped(), ["Stub", "Stub"]);
    assert_eq!(report.failures().len(), 1);
    assert!(!report.is_clean());
}

#[rstest]
fn observer_sees_every_phase_in_sequence(journal: Journal) {
    let repo = repo_of(&journal, vec![Stub::new("a").named("only")]);
    let mut observer = MockObserver::new();
    let mut sequence = Sequence::new();
    for phase in [
        Phase::PropertyResolution,
        Phase::Initialize,
        Phase::Finalize,
        Phase::Wiring,
        Phase::Mount,
    ] {
        observer
            .expect_phase_starting()
            .withf(move |started, order| {
                *started == phase && order == [String::from("Stub(only)")]
            })
            .once()
            .in_sequence(&mut sequence)
            .return_const(());
        observer
            .expect_addon_processed()
            .with(eq(phase), eq("Stub(only)"))
            .once()
            .in_sequence(&mut sequence)
            .return_const(());
        observer
            .expect_phase_completed()
            .with(eq(phase))
            .once()
            .in_sequence(&mut sequence)
            .return_const(());
    }
    observer.expect_bootstrap_failed().never();

    Lifecycle::with_observer(Arc::new(observer))
        .run(
            repo,
            &PropertyMap::new(),
            &mut BindingTable::new(),
            &mut MountTable::new("/"),
        )
        .expect("bootstrap succeeds");
}

#[rstest]
fn observer_is_told_about_failures(journal: Journal) {
    let repo = repo_of(&journal, vec![Stub::new("a").fail_in(Phase::Finalize)]);
    let mut observer = MockObserver::new();
    observer.expect_phase_starting().return_const(());
    observer.expect_addon_processed().return_const(());
    observer.expect_phase_completed().return_const(());
    observer
        .expect_bootstrap_failed()
        .withf(|error| error.phase() == Phase::Finalize && error.addon() == Some("Stub"))
        .once()
        .return_const(());

    let result = Lifecycle::with_observer(Arc::new(observer)).prepare(repo, &PropertyMap::new());
    assert!(result.is_err());
}

#[test]
fn phase_labels_are_snake_case() {
    assert_eq!(Phase::PropertyResolution.as_str(), "property_resolution");
    assert_eq!(Phase::Mount.to_string(), "mount");
}
