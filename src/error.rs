use thiserror::Error;

use crate::config::ValidationError;

/// Errors raised while constructing middleware layers.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MiddlewareError {
    /// The options record failed validation
    #[error("Invalid middleware configuration: {0}")]
    Configuration(#[from] ValidationError),
}

/// Result type alias for middleware construction
pub type MiddlewareResult<T> = Result<T, MiddlewareError>;

/// Errors raised while turning a [`crate::core::HostBuilder`] into a runnable host.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HostError {
    #[error("Invalid listen address '{address}': {source}")]
    InvalidListenAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("Content root '{0}' is not a directory")]
    InvalidContentRoot(String),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}
