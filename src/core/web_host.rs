//! Host composition: startup routes, ordered extensions, setup hooks, serve.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::{Router, routing::get};
//! use hostwire::{HostConfig, Startup, WebHost, core::extensions};
//!
//! struct App;
//!
//! impl Startup for App {
//!     fn configure(_: &HostConfig, _: &tracing::Span) -> eyre::Result<Router> {
//!         Ok(Router::new().route("/", get(|| async { "ok" })))
//!     }
//! }
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = Arc::new(hostwire::config::load_config("config.toml").await?);
//! let logger = hostwire::tracing_setup::create_host_span("billing-service");
//! WebHost::<App>::new(
//!     "billing-service",
//!     std::env::args(),
//!     config,
//!     logger,
//!     vec![extensions::correlation_id()],
//! )?
//! .pre_run(|_host, _config, _logger| Ok(()))?
//! .pre_run_async(|_host, _config, _logger| Box::pin(async { Ok::<(), eyre::Report>(()) }))
//! .await?
//! .run()
//! .await
//! # }
//! ```
use std::{marker::PhantomData, sync::Arc};

use eyre::{Result, WrapErr};
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;
use tracing::{Instrument, Span};

use crate::{
    config::HostConfig,
    core::host::{Host, HostBuilder},
    ports::startup::Startup,
};

/// Caller-supplied transformation of the host builder.
///
/// Extensions run in list order; each receives the builder produced by the previous one.
pub type HostExtension =
    Box<dyn Fn(HostBuilder, &HostConfig, &Span) -> Result<HostBuilder> + Send + Sync>;

/// Wrap a closure as a [`HostExtension`].
pub fn extension<F>(f: F) -> HostExtension
where
    F: Fn(HostBuilder, &HostConfig, &Span) -> Result<HostBuilder> + Send + Sync + 'static,
{
    Box::new(f)
}

/// Apply `extensions` to `builder` in order, stopping at the first error.
pub fn apply_extensions(
    builder: HostBuilder,
    extensions: &[HostExtension],
    config: &HostConfig,
    logger: &Span,
) -> Result<HostBuilder> {
    let total = extensions.len();
    extensions
        .iter()
        .enumerate()
        .try_fold(builder, |builder, (i, extension)| {
            tracing::info!(parent: logger, "Adding {} extension of {}", i + 1, total);
            extension(builder, config, logger)
                .wrap_err_with(|| format!("Extension {} of {} failed", i + 1, total))
        })
}

/// A configured web host whose routes come from the startup type `S`.
pub struct WebHost<S> {
    app_name: String,
    config: Arc<HostConfig>,
    logger: Span,
    host: Host,
    _startup: PhantomData<fn() -> S>,
}

impl<S: Startup> WebHost<S> {
    /// Configure the base host, apply every extension in order, and build it.
    pub fn new(
        app_name: impl Into<String>,
        args: impl IntoIterator<Item = String>,
        config: Arc<HostConfig>,
        logger: Span,
        extensions: Vec<HostExtension>,
    ) -> Result<Self> {
        let app_name = app_name.into();

        tracing::info!(parent: &logger, "Configuring base web host ({})...", app_name);

        let routes = S::configure(&config, &logger)
            .wrap_err_with(|| format!("Startup configuration of {app_name} failed"))?;
        let builder =
            HostBuilder::new(app_name.clone(), args.into_iter().collect(), &config)?.merge(routes);

        tracing::info!(parent: &logger, "Base web host ({}) has configured", app_name);

        let builder = apply_extensions(builder, &extensions, &config, &logger)?;

        tracing::info!(parent: &logger, "Building web host ({})...", app_name);

        let host = builder
            .build()
            .wrap_err_with(|| format!("Failed to build web host ({app_name})"))?;

        tracing::info!(parent: &logger, "Web host has built ({})", app_name);

        Ok(Self {
            app_name,
            config,
            logger,
            host,
            _startup: PhantomData,
        })
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn logger(&self) -> &Span {
        &self.logger
    }

    /// Run a synchronous setup step immediately, before serving starts.
    pub fn pre_run<F>(self, behavior: F) -> Result<Self>
    where
        F: FnOnce(&Host, &HostConfig, &Span) -> Result<()>,
    {
        tracing::info!(parent: &self.logger, "Running pre-run behavior ({})...", self.app_name);
        behavior(&self.host, self.config.as_ref(), &self.logger)?;
        Ok(self)
    }

    /// Run an asynchronous setup step to completion before serving starts.
    ///
    /// The returned future has to be awaited before [`WebHost::run`] can be called; it
    /// does not block a thread while it waits.
    pub async fn pre_run_async<F>(self, behavior: F) -> Result<Self>
    where
        F: for<'a> FnOnce(&'a Host, &'a HostConfig, &'a Span) -> BoxFuture<'a, Result<()>>,
    {
        tracing::info!(
            parent: &self.logger,
            "Running asynchronous pre-run behavior ({})...",
            self.app_name
        );
        behavior(&self.host, self.config.as_ref(), &self.logger).await?;
        Ok(self)
    }

    /// Serve on the configured address; completes when the host shuts down.
    pub async fn run(self) -> Result<()> {
        tracing::info!(parent: &self.logger, "Web host ({}) running...", self.app_name);
        let logger = self.logger.clone();
        self.host.run().instrument(logger).await?;
        Ok(())
    }

    /// Serve on a caller-provided listener; completes when the host shuts down.
    pub async fn run_on(self, listener: TcpListener) -> Result<()> {
        tracing::info!(parent: &self.logger, "Web host ({}) running...", self.app_name);
        let logger = self.logger.clone();
        self.host.serve(listener).instrument(logger).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{Router, body::Body, extract::Request, http::StatusCode, routing::get};
    use tower::ServiceExt; // for oneshot

    use super::*;

    struct PingStartup;

    impl Startup for PingStartup {
        fn configure(_config: &HostConfig, _logger: &Span) -> Result<Router> {
            Ok(Router::new().route("/ping", get(|| async { "pong" })))
        }
    }

    struct FailingStartup;

    impl Startup for FailingStartup {
        fn configure(_config: &HostConfig, _logger: &Span) -> Result<Router> {
            Err(eyre::eyre!("no routes today"))
        }
    }

    fn new_host(extensions: Vec<HostExtension>) -> Result<WebHost<PingStartup>> {
        WebHost::<PingStartup>::new(
            "test-app",
            Vec::new(),
            Arc::new(HostConfig::default()),
            Span::none(),
            extensions,
        )
    }

    #[tokio::test]
    async fn test_zero_extensions_build_a_working_host() {
        let web_host = new_host(Vec::new()).unwrap();

        let response = web_host
            .host()
            .router()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_extensions_run_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let first = calls.clone();
        let second = calls.clone();

        new_host(vec![
            extension(move |builder, _, _| {
                first.lock().unwrap().push("first");
                Ok(builder)
            }),
            extension(move |builder, _, _| {
                second.lock().unwrap().push("second");
                Ok(builder)
            }),
        ])
        .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_extension_error_stops_composition() {
        let ran_after_failure = Arc::new(Mutex::new(false));
        let flag = ran_after_failure.clone();

        let err = new_host(vec![
            extension(|_, _, _| Err(eyre::eyre!("broken extension"))),
            extension(move |builder, _, _| {
                *flag.lock().unwrap() = true;
                Ok(builder)
            }),
        ])
        .err()
        .unwrap();

        assert!(format!("{err:?}").contains("broken extension"));
        assert!(!*ran_after_failure.lock().unwrap());
    }

    #[test]
    fn test_invalid_builder_state_fails_build() {
        let err = new_host(vec![extension(|builder, _, _| {
            Ok(builder.with_listen_addr("not-an-address"))
        })])
        .err()
        .unwrap();

        assert!(format!("{err:?}").contains("not-an-address"));
    }

    #[test]
    fn test_startup_failure_propagates() {
        let err = WebHost::<FailingStartup>::new(
            "test-app",
            Vec::new(),
            Arc::new(HostConfig::default()),
            Span::none(),
            Vec::new(),
        )
        .err()
        .unwrap();

        assert!(format!("{err:?}").contains("no routes today"));
    }

    #[tokio::test]
    async fn test_pre_run_hooks_run_before_serving() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sync_calls = calls.clone();
        let async_calls = calls.clone();

        let web_host = new_host(Vec::new())
            .unwrap()
            .pre_run(move |host, _, _| {
                sync_calls.lock().unwrap().push(host.app_name().to_string());
                Ok(())
            })
            .unwrap()
            .pre_run_async(move |_, config, _| {
                Box::pin(async move {
                    tokio::task::yield_now().await;
                    async_calls.lock().unwrap().push(config.listen_addr.clone());
                    Ok::<(), eyre::Report>(())
                })
            })
            .await
            .unwrap();

        assert_eq!(
            *calls.lock().unwrap(),
            vec!["test-app".to_string(), "127.0.0.1:8080".to_string()]
        );
        assert!(!web_host.host().shutdown_handle().is_shutdown_initiated());
    }

    #[tokio::test]
    async fn test_pre_run_error_propagates() {
        let result = new_host(Vec::new())
            .unwrap()
            .pre_run_async(|_, _, _| Box::pin(async { Err::<(), _>(eyre::eyre!("migration failed")) }))
            .await;

        assert!(result.is_err());
    }
}
