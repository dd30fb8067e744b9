//! Host builder and the runnable host it produces.
//!
//! A [`HostBuilder`] accumulates routes, layers and server settings. Routes are merged
//! immediately; layers are deferred until [`HostBuilder::build`] so that every layer
//! wraps every route no matter in which order extensions registered them. Layers apply
//! in registration order: the first one registered sits closest to the handlers.
use std::{
    convert::Infallible,
    future::IntoFuture,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use axum::{Router, extract::Request, middleware, response::IntoResponse, routing::Route};
use eyre::WrapErr;
use tokio::{net::TcpListener, sync::oneshot};
use tower::{Layer, Service};
use tower_http::{
    request_id::{MakeRequestUuid, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    adapters::{assign_trace_identifier, request_timing_middleware},
    config::HostConfig,
    error::HostError,
    utils::{GracefulShutdown, ShutdownReason},
};

type RouterLayer = Box<dyn FnOnce(Router) -> Router + Send + Sync>;

/// Accumulates the state of a host before it is built.
pub struct HostBuilder {
    app_name: String,
    args: Vec<String>,
    content_root: PathBuf,
    listen_addr: String,
    shutdown_timeout: Duration,
    router: Router,
    layers: Vec<RouterLayer>,
}

impl HostBuilder {
    /// Default builder: content root is the process working directory, listen address
    /// and drain timeout come from `config`, and request timing is the innermost layer.
    pub fn new(
        app_name: impl Into<String>,
        args: Vec<String>,
        config: &HostConfig,
    ) -> eyre::Result<Self> {
        let content_root =
            std::env::current_dir().wrap_err("Failed to read the current directory")?;

        let builder = Self {
            app_name: app_name.into(),
            args,
            content_root,
            listen_addr: config.listen_addr.clone(),
            shutdown_timeout: Duration::from_secs(config.shutdown_timeout_secs),
            router: Router::new(),
            layers: Vec::new(),
        };

        Ok(builder.layer(middleware::from_fn(request_timing_middleware)))
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Process arguments the host was created with
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    /// Number of layers registered so far, including the host's own
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn with_content_root(mut self, content_root: impl Into<PathBuf>) -> Self {
        self.content_root = content_root.into();
        self
    }

    pub fn with_listen_addr(mut self, listen_addr: impl Into<String>) -> Self {
        self.listen_addr = listen_addr.into();
        self
    }

    pub fn with_shutdown_timeout(mut self, shutdown_timeout: Duration) -> Self {
        self.shutdown_timeout = shutdown_timeout;
        self
    }

    /// Merge additional routes into the host router.
    pub fn merge(mut self, router: Router) -> Self {
        self.router = self.router.merge(router);
        self
    }

    /// Arbitrary transformation of the routes registered so far, e.g. a fallback.
    pub fn map_router(mut self, f: impl FnOnce(Router) -> Router) -> Self {
        self.router = f(self.router);
        self
    }

    /// Register a layer; it is applied to all routes when the host is built.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: Service<Request> + Clone + Send + Sync + 'static,
        <L::Service as Service<Request>>::Response: IntoResponse + 'static,
        <L::Service as Service<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.layers
            .push(Box::new(move |router: Router| router.layer(layer)));
        self
    }

    /// Validate the accumulated state and produce a runnable [`Host`].
    pub fn build(self) -> Result<Host, HostError> {
        let listen_addr: SocketAddr =
            self.listen_addr
                .parse()
                .map_err(|source| HostError::InvalidListenAddress {
                    address: self.listen_addr.clone(),
                    source,
                })?;

        if !self.content_root.is_dir() {
            return Err(HostError::InvalidContentRoot(
                self.content_root.display().to_string(),
            ));
        }

        let router = self
            .layers
            .into_iter()
            .fold(self.router, |router, apply| apply(router))
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(assign_trace_identifier))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        Ok(Host {
            app_name: self.app_name,
            listen_addr,
            content_root: self.content_root,
            router,
            shutdown: Arc::new(GracefulShutdown::with_timeout(self.shutdown_timeout)),
        })
    }
}

/// A built host, ready to serve.
pub struct Host {
    app_name: String,
    listen_addr: SocketAddr,
    content_root: PathBuf,
    router: Router,
    shutdown: Arc<GracefulShutdown>,
}

impl Host {
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    /// The fully layered router; handy for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle used to stop a running host.
    pub fn shutdown_handle(&self) -> Arc<GracefulShutdown> {
        self.shutdown.clone()
    }

    /// Bind the configured address and serve until shutdown. SIGINT / SIGTERM trigger a
    /// graceful shutdown.
    pub async fn run(self) -> Result<(), HostError> {
        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(|source| HostError::Bind {
                address: self.listen_addr,
                source,
            })?;

        let signal_shutdown = self.shutdown.clone();
        let signal_handler = tokio::spawn(async move {
            if let Err(e) = signal_shutdown.run_signal_handler().await {
                tracing::error!("Signal handler error: {}", e);
            }
        });

        let result = self.serve(listener).await;
        signal_handler.abort();
        result
    }

    /// Serve on an already bound listener until shutdown is triggered through
    /// [`Host::shutdown_handle`].
    pub async fn serve(self, listener: TcpListener) -> Result<(), HostError> {
        let local_addr = listener.local_addr().map_err(HostError::Serve)?;
        tracing::info!("{} listening on {}", self.app_name, local_addr);

        let token = self.shutdown.shutdown_token();
        let drain_timeout = self.shutdown.drain_timeout();
        let (draining_tx, draining_rx) = oneshot::channel::<ShutdownReason>();

        let server = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let reason = token.wait_for_shutdown().await;
                let _ = draining_tx.send(reason);
            })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            result = &mut server => result.map_err(HostError::Serve),
            reason = draining_rx => {
                tracing::info!("Shutdown signal received: {:?}; draining connections", reason);
                match tokio::time::timeout(drain_timeout, &mut server).await {
                    Ok(result) => result.map_err(HostError::Serve),
                    Err(_) => {
                        tracing::warn!(
                            "Connections still open after {:?}, forcing shutdown",
                            drain_timeout
                        );
                        Ok(())
                    }
                }
            }
        }
    }
}
