use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Install the process subscriber described by the `logging` section.
///
/// Only binaries call this; library code logs through the span it is handed.
pub fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    init_tracing_with_config(
        &logging.level,
        logging.format == LogFormat::Json,
        logging.include_spans,
    )
}

/// Initialize tracing with custom configuration
pub fn init_tracing_with_config(level: &str, json_format: bool, include_spans: bool) -> Result<()> {
    let env_filter =
        EnvFilter::try_new(level).wrap_err_with(|| format!("Invalid log level: {level}"))?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    if json_format {
        Registry::default()
            .with(env_filter)
            .with(
                fmt_layer
                    .json()
                    .with_current_span(include_spans)
                    .with_span_list(include_spans),
            )
            .try_init()
            .wrap_err("Failed to install JSON log subscriber")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.pretty().with_ansi(true))
            .try_init()
            .wrap_err("Failed to install console log subscriber")?;
    }

    tracing::info!(
        "hostwire logging initialized with level: {}, json: {}, spans: {}",
        level,
        json_format,
        include_spans
    );
    Ok(())
}

/// Root span of a host; this is the logger handed to extensions and setup hooks.
pub fn create_host_span(app_name: &str) -> tracing::Span {
    tracing::info_span!("host", application = app_name)
}

/// Create a request-scoped tracing span
pub fn create_request_span(method: &str, path: &str, trace_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        http.method = method,
        http.path = path,
        trace.id = trace_id,
        http.status_code = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_rejects_bad_filter() {
        let result = init_tracing_with_config("hostwire=notalevel", true, true);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_request_span() {
        let span = create_request_span("GET", "/api/test", "req-123");
        assert_eq!(span.metadata().map(|m| m.name()), Some("request"));
    }

    #[test]
    fn test_create_host_span() {
        let span = create_host_span("billing-service");
        assert_eq!(span.metadata().map(|m| m.name()), Some("host"));
    }
}
