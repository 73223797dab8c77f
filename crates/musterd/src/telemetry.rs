//! Structured telemetry initialisation for the daemon.

use std::io::{self, IsTerminal};

use muster_config::{LogFormat, LogSettings};
use once_cell::sync::OnceCell;
use tracing::{Subscriber, info, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Daemon targets kept at `info` unless the configured filter names them.
///
/// Bootstrap progress and shutdown outcomes stay visible under a quiet
/// global level such as `warn`.
const BASELINE_DIRECTIVES: [&str; 2] = ["musterd::health=info", "musterd::process=info"];

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// Failed to parse the configured log filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Failed to install the tracing subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Configures the global tracing subscriber when invoked for the first time.
///
/// Later calls leave the installed subscriber in place and return a fresh
/// [`TelemetryHandle`].
pub(crate) fn initialise(settings: &LogSettings) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(settings))
        .map(|_| TelemetryHandle)
}

/// Parses `expression` and adds the baseline directives it leaves out.
pub(crate) fn parse_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    let invalid = |error: ParseError| TelemetryError::Filter(error.to_string());
    let configured = EnvFilter::try_new(expression).map_err(invalid)?;
    BASELINE_DIRECTIVES
        .iter()
        .filter(|baseline| !names_target(expression, baseline))
        .try_fold(configured, |filter, baseline| {
            baseline
                .parse::<Directive>()
                .map(|directive| filter.add_directive(directive))
                .map_err(invalid)
        })
}

fn names_target(expression: &str, directive: &str) -> bool {
    let target = directive
        .split_once('=')
        .map_or(directive, |(target_name, _)| target_name);
    expression
        .split(',')
        .any(|part| part.trim().starts_with(target))
}

fn install_subscriber(settings: &LogSettings) -> Result<(), TelemetryError> {
    let filter = parse_filter(settings.filter())?;

    let builder = |directives: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(directives)
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match settings.format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    info!(
        target: "musterd::telemetry",
        filter = settings.filter(),
        format = %settings.format(),
        "telemetry initialised"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::level("info")]
    #[case::directives("muster::lifecycle=debug,musterd=info")]
    fn valid_filters_parse(#[case] expression: &str) {
        assert!(parse_filter(expression).is_ok());
    }

    #[rstest]
    #[case::quiet_level("warn", true)]
    #[case::other_targets("muster::lifecycle=debug", true)]
    #[case::explicit_health("musterd::health=error", false)]
    fn baseline_keeps_health_events(#[case] expression: &str, #[case] added: bool) {
        let filter = parse_filter(expression).expect("valid filter");
        let rendered = filter.to_string().to_lowercase();
        assert_eq!(rendered.contains("musterd::health=info"), added, "{rendered}");
        assert!(rendered.contains("musterd::process=info"), "{rendered}");
    }

    #[test]
    fn malformed_filter_is_reported() {
        let error = parse_filter("muster=[").expect_err("malformed filter");
        assert!(error.to_string().starts_with("invalid log filter"), "{error}");
    }

    #[test]
    fn initialise_is_idempotent() {
        let settings = LogSettings::default();
        assert!(initialise(&settings).is_ok());
        assert!(initialise(&settings).is_ok());
    }
}
