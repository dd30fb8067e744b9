//! `axum::middleware::from_fn` helpers installed by the host on every router.
//!
//! They stay stateless so that they can run concurrently across independent requests
//! without any locking.
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::Instrument;

use crate::{core::TraceIdentifier, tracing_setup::create_request_span};

/// Expose the request's `x-request-id` as its [`TraceIdentifier`] unless an outer layer
/// already assigned one.
///
/// This is the default identifier the correlation-id middleware falls back to when the
/// caller sent none. The host runs it inside `SetRequestIdLayer`.
pub async fn assign_trace_identifier(mut req: Request, next: Next) -> Response {
    if req.extensions().get::<TraceIdentifier>().is_none() {
        let trace_id = TraceIdentifier::for_request(&req);
        req.extensions_mut().insert(trace_id);
    }
    next.run(req).await
}

/// Log start/end of a request including latency, inside a span carrying its trace
/// identifier.
pub async fn request_timing_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let trace_id = req
        .extensions()
        .get::<TraceIdentifier>()
        .map(ToString::to_string)
        .unwrap_or_default();

    let span = create_request_span(method.as_str(), uri.path(), &trace_id);
    span.in_scope(|| tracing::debug!("Started processing {} {}", method, uri));

    let response = next.run(req).instrument(span.clone()).await;
    let duration = start.elapsed();

    span.record("http.status_code", response.status().as_u16());
    span.record("duration_ms", duration.as_millis() as u64);
    span.in_scope(|| {
        tracing::info!(
            "Completed {} {} - {} in {:?}",
            method,
            uri,
            response.status(),
            duration
        )
    });

    response
}
