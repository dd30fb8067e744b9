//! Correlation-id propagation between an inbound request header and the response.
//!
//! On every request the layer reads the configured header (case-insensitive). When the
//! caller sent a value it becomes the request's [`TraceIdentifier`]; otherwise the
//! identifier the host already assigned is kept, or a fresh one is generated. Once the
//! inner service has produced its response, and before that response is handed back to
//! the server, the current identifier is written to the same header. The header therefore
//! appears exactly once on every response.
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use http::{HeaderName, Request, Response};
use tower::{Layer, Service};

use crate::{
    config::{CorrelationIdOptions, HostConfigValidator},
    core::TraceIdentifier,
    error::MiddlewareResult,
};

/// [`Layer`] installing [`CorrelationIdService`].
#[derive(Debug, Clone)]
pub struct CorrelationIdLayer {
    header_name: HeaderName,
}

impl CorrelationIdLayer {
    /// Fails when the header name is empty or not a valid HTTP header name.
    pub fn new(options: &CorrelationIdOptions) -> MiddlewareResult<Self> {
        let header_name = HostConfigValidator::validate_correlation_id(options)?;
        Ok(Self { header_name })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }
}

impl<S> Layer<S> for CorrelationIdLayer {
    type Service = CorrelationIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationIdService {
            inner,
            header_name: self.header_name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationIdService<S> {
    inner: S,
    header_name: HeaderName,
}

impl<S> CorrelationIdService<S> {
    /// Pick the identifier for this request and store it in the request extensions.
    fn assign<B>(&self, req: &mut Request<B>) -> TraceIdentifier {
        let inbound =
            TraceIdentifier::from_header_values(req.headers().get_all(&self.header_name).iter());

        match inbound {
            Some(trace_id) => {
                req.extensions_mut().insert(trace_id.clone());
                trace_id
            }
            None => {
                if req.headers().contains_key(&self.header_name) {
                    tracing::warn!(
                        header = %self.header_name,
                        "Ignoring unusable correlation header value"
                    );
                }
                match req.extensions().get::<TraceIdentifier>() {
                    Some(trace_id) => trace_id.clone(),
                    None => {
                        let trace_id = TraceIdentifier::for_request(req);
                        req.extensions_mut().insert(trace_id.clone());
                        trace_id
                    }
                }
            }
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationIdService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let trace_id = self.assign(&mut req);
        tracing::debug!(trace.id = %trace_id, "Correlation identifier assigned");

        let header_name = self.header_name.clone();
        let future = self.inner.call(req);

        Box::pin(async move {
            let mut response = future.await?;

            // A handler may answer with its own identifier through the response extensions.
            let value = response
                .extensions()
                .get::<TraceIdentifier>()
                .and_then(|current| {
                    let value = current.to_header_value();
                    if value.is_none() {
                        tracing::warn!(
                            trace.id = %current,
                            "Response trace identifier is not a valid header value; using the request identifier"
                        );
                    }
                    value
                })
                .or_else(|| trace_id.to_header_value());

            match value {
                Some(value) => {
                    response.headers_mut().insert(header_name, value);
                }
                None => tracing::warn!(trace.id = %trace_id, "Failed to emit correlation header"),
            }

            Ok(response)
        })
    }
}
