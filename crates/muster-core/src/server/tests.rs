//! Unit tests for the in-process mount table.

use std::sync::Arc;

use rstest::rstest;

use super::*;

#[rstest]
#[case::root("/", "/swagger", "/swagger")]
#[case::prefixed("/api", "swagger", "/api/swagger")]
#[case::trailing_slash("/api/", "/swagger", "/api/swagger")]
fn routes_are_mounted_under_the_context_path(
    #[case] context: &str,
    #[case] path: &str,
    #[case] expected: &str,
) {
    let mut table = MountTable::new(context);
    table.add_route(path, Route::new("docs").param("title", "orders"));

    let route = table.route(expected).expect("route mounted");
    assert_eq!(route.handler(), "docs");
    assert_eq!(route.get("title"), Some("orders"));
    assert_eq!(table.context_path(), context);
}

#[test]
fn health_checks_run_in_mount_order() {
    let mut table = MountTable::new("/");
    table.add_health_check("db", Arc::new(|| HealthStatus::Healthy));
    table.add_health_check(
        "queue",
        Arc::new(|| HealthStatus::Unhealthy(String::from("no broker"))),
    );

    assert_eq!(table.health_check_names(), vec!["db", "queue"]);
    let results = table.run_health_checks();
    assert_eq!(
        results,
        vec![
            (String::from("db"), HealthStatus::Healthy),
            (
                String::from("queue"),
                HealthStatus::Unhealthy(String::from("no broker"))
            ),
        ]
    );
    assert!(results.first().is_some_and(|(_, status)| status.is_healthy()));
}
