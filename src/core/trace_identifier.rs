//! Per-request correlation token.
//!
//! A [`TraceIdentifier`] lives in the request extensions. The host derives it from the
//! `x-request-id` that `tower_http`'s [`SetRequestIdLayer`] assigns to every request; the
//! correlation-id middleware replaces it with the caller's value when the configured
//! header is present. Handlers that want to answer with a different identifier put one
//! into the *response* extensions.
//!
//! [`SetRequestIdLayer`]: tower_http::request_id::SetRequestIdLayer
use std::fmt;

use http::{HeaderValue, Request};
use tower_http::request_id::RequestId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceIdentifier(String);

impl TraceIdentifier {
    /// Wrap an existing token. Empty tokens are rejected.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// A fresh random (UUIDv4) identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn from_request_id(request_id: &RequestId) -> Option<Self> {
        request_id
            .header_value()
            .to_str()
            .ok()
            .and_then(|value| Self::new(value))
    }

    /// The identifier for a request with none assigned yet: its [`RequestId`] when a
    /// request-id layer ran, a generated one otherwise.
    pub fn for_request<B>(req: &Request<B>) -> Self {
        req.extensions()
            .get::<RequestId>()
            .and_then(Self::from_request_id)
            .unwrap_or_else(Self::generate)
    }

    /// Build an identifier from every value of a header, joined with `,`.
    ///
    /// Returns `None` when there is no usable value: no values at all, only empty
    /// values, or bytes that are not visible ASCII.
    pub fn from_header_values<'a>(values: impl Iterator<Item = &'a HeaderValue>) -> Option<Self> {
        let mut parts = Vec::new();
        for value in values {
            let text = value.to_str().ok()?;
            if !text.is_empty() {
                parts.push(text);
            }
        }
        Self::new(parts.join(","))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl fmt::Display for TraceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
