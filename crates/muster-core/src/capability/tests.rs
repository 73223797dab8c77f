//! Unit tests for capability descriptors.

use std::collections::HashSet;

use super::*;

struct DataSourceRole;
struct QueryRunnerRole;
struct Searcher<T>(T);
struct Document;

#[test]
fn same_type_yields_equal_descriptors() {
    assert_eq!(
        Capability::of::<DataSourceRole>(),
        Capability::of::<DataSourceRole>()
    );
}

#[test]
fn distinct_types_yield_distinct_descriptors() {
    assert_ne!(
        Capability::of::<DataSourceRole>(),
        Capability::of::<QueryRunnerRole>()
    );
}

#[test]
fn descriptors_hash_by_identity() {
    let set: HashSet<Capability> = [
        Capability::of::<DataSourceRole>(),
        Capability::of::<DataSourceRole>(),
        Capability::of::<QueryRunnerRole>(),
    ]
    .into_iter()
    .collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn short_name_strips_module_path() {
    let capability = Capability::of::<DataSourceRole>();
    assert_eq!(capability.short_name(), "DataSourceRole");
    assert!(capability.name().ends_with("::DataSourceRole"));
    assert_eq!(capability.to_string(), "DataSourceRole");
}

#[test]
fn short_name_keeps_generic_arguments() {
    let capability = Capability::of::<Searcher<Document>>();
    let short = capability.short_name();
    assert!(short.starts_with("Searcher<"), "unexpected short name: {short}");
    assert!(short.contains("Document"), "unexpected short name: {short}");
}

#[test]
fn generic_instantiations_are_distinct() {
    assert_ne!(
        Capability::of::<Searcher<Document>>(),
        Capability::of::<Searcher<DataSourceRole>>()
    );
}

#[test]
fn trait_objects_have_descriptors() {
    let capability = Capability::of::<dyn std::fmt::Debug>();
    assert_eq!(capability, Capability::of::<dyn std::fmt::Debug>());
}
