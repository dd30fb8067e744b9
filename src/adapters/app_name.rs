//! Outbound layer stamping the application name onto every request a client sends.
//!
//! Wrap any `tower` HTTP client service with [`AppNameLayer`] so downstream services can
//! tell which application called them, or take the ready-made [`AppNameLayer::http_client`].
use std::task::{Context, Poll};

use axum::body::Body;
use http::{HeaderName, HeaderValue, Request};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use tower::{Layer, Service};

use crate::{
    config::{AppNameOptions, HostConfig, HostConfigValidator},
    error::MiddlewareResult,
};

/// Plain-HTTP `hyper-util` client sending the application name with every request.
pub type AppNameClient = AppNameService<Client<HttpConnector, Body>>;

#[derive(Debug, Clone)]
pub struct AppNameLayer {
    header_name: HeaderName,
    app_name: HeaderValue,
}

impl AppNameLayer {
    pub fn new(options: &AppNameOptions) -> MiddlewareResult<Self> {
        let (header_name, app_name) = HostConfigValidator::validate_app_name(options)
            .map_err(HostConfigValidator::combine)?;

        Ok(Self {
            header_name,
            app_name,
        })
    }

    /// Build the layer from the `app_name` section, failing when it is missing.
    pub fn from_config(config: &HostConfig) -> MiddlewareResult<Self> {
        Self::new(HostConfigValidator::require_app_name(config)?)
    }

    /// A pooled HTTP/1.1 client with this layer applied.
    pub fn http_client(&self) -> AppNameClient {
        let client = Client::builder(TokioExecutor::new()).build_http::<Body>();
        tracing::debug!(header = %self.header_name, "Created outbound HTTP client");
        self.layer(client)
    }
}

impl<S> Layer<S> for AppNameLayer {
    type Service = AppNameService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AppNameService {
            inner,
            header_name: self.header_name.clone(),
            app_name: self.app_name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppNameService<S> {
    inner: S,
    header_name: HeaderName,
    app_name: HeaderValue,
}

impl<S, B> Service<Request<B>> for AppNameService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        req.headers_mut()
            .insert(self.header_name.clone(), self.app_name.clone());
        self.inner.call(req)
    }
}
