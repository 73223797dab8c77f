//! Unit tests for cardinality classification.

use rstest::rstest;

use super::*;

enum Role {}

#[rstest]
#[case::none(vec![], Resolution::Empty)]
#[case::one(vec![7], Resolution::Single(7))]
#[case::two(vec![7, 8], Resolution::Ambiguous(2))]
#[case::three(vec![7, 8, 9], Resolution::Ambiguous(3))]
fn candidates_are_classified(#[case] candidates: Vec<u8>, #[case] expected: Resolution<u8>) {
    assert_eq!(Resolution::from_candidates(candidates), expected);
}

#[test]
fn optional_accepts_empty() {
    let resolved = Resolution::<u8>::Empty
        .optional(Capability::of::<Role>(), None)
        .expect("empty is allowed");
    assert!(resolved.is_none());
}

#[test]
fn required_rejects_empty_with_missing_dependency() {
    let error = Resolution::<u8>::Empty
        .required(Capability::of::<Role>(), Some("primary"))
        .expect_err("empty is not allowed");
    assert!(matches!(
        error,
        AddonError::MissingDependency { name: Some(name), .. } if name == "primary"
    ));
}

#[rstest]
#[case::optional(true)]
#[case::required(false)]
fn ambiguity_is_always_fatal(#[case] optional: bool) {
    let resolution = Resolution::from_candidates(vec![1, 2]);
    let error = if optional {
        resolution
            .optional(Capability::of::<Role>(), None)
            .map(|_| ())
            .expect_err("ambiguous")
    } else {
        resolution
            .required(Capability::of::<Role>(), None)
            .map(|_| ())
            .expect_err("ambiguous")
    };
    assert!(matches!(error, AddonError::Cardinality { count: 2, .. }));
}
