use axum::Router;
use eyre::Result;
use tracing::Span;

use crate::config::HostConfig;

/// Startup defines the port through which an application hands its routes to the host.
///
/// The host calls [`Startup::configure`] exactly once, before any extension runs, and
/// serves whatever router it returns.
pub trait Startup: 'static {
    /// Build the application's router
    ///
    /// # Arguments
    /// * `config` - The loaded host configuration
    /// * `logger` - The host span; log through it instead of a global logger
    fn configure(config: &HostConfig, logger: &Span) -> Result<Router>;
}
