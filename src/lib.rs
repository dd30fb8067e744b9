//! hostwire - web host composition helpers for axum services.
//!
//! hostwire wraps the boilerplate every service repeats before it can serve traffic and
//! keeps it in one place:
//!
//! - **Host composition**: a [`WebHost`] builds a default [`core::HostBuilder`] from the
//!   routes of a [`Startup`] type, folds an ordered list of [`HostExtension`]s over it,
//!   builds it, runs synchronous and asynchronous setup hooks, and serves.
//! - **Correlation ids**: [`CorrelationIdLayer`] adopts an inbound header as the request's
//!   [`TraceIdentifier`] and always emits the identifier on the response.
//! - **App name**: [`AppNameLayer`] stamps the application name onto outgoing requests
//!   of any `tower` HTTP client.
//!
//! # Architecture
//! The crate separates **ports** (traits the embedding application implements) from
//! **adapters** (tower/axum middleware) while keeping the composition logic inside
//! `core`. Configuration lives in `config` and is loaded with the `config` crate.
//!
//! # Logging
//! Library code never installs a global subscriber. Every component logs through the
//! `tracing::Span` it is handed; binaries call [`tracing_setup::init_tracing`] once.
//!
//! # Error Handling
//! Composition APIs return `eyre::Result<T>` with context attached via `WrapErr`.
//! Middleware construction and host building return the domain errors in [`error`].
pub mod adapters;
pub mod config;
pub mod core;
pub mod error;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub use crate::{
    adapters::{AppNameLayer, CorrelationIdLayer},
    config::{AppNameOptions, CorrelationIdOptions, HostConfig},
    core::{Host, HostBuilder, HostExtension, TraceIdentifier, WebHost},
    ports::Startup,
    utils::GracefulShutdown,
};
