//! Test suites for the service daemon.

mod support;
