//! Configuration data structures for hostwire.
//!
//! These types map directly to TOML (also JSON / YAML / INI) configuration files and to
//! `HOSTWIRE__*` environment variables. They carry serde defaults so that minimal configs
//! remain concise; the two option records that have no sensible default stay optional and
//! are checked by [`crate::config::HostConfigValidator`].
use serde::{Deserialize, Serialize};

/// Header name used for the application name when none is configured.
pub const DEFAULT_APP_NAME_HEADER: &str = "App-Name";

fn default_app_name_header() -> String {
    DEFAULT_APP_NAME_HEADER.to_string()
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

/// Options for stamping the application name onto outgoing HTTP requests.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AppNameOptions {
    /// Name of this application as seen by downstream services
    #[serde(default)]
    pub app_name: String,
    /// Header carrying the name
    #[serde(default = "default_app_name_header")]
    pub header_name: String,
}

impl AppNameOptions {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            header_name: default_app_name_header(),
        }
    }
}

/// Options for the correlation-id middleware.
///
/// There is deliberately no default header name: the embedding application has to
/// choose one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CorrelationIdOptions {
    #[serde(default)]
    pub header_name: String,
}

impl CorrelationIdOptions {
    pub fn new(header_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
        }
    }
}

/// Output format of the log subscriber
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `hostwire=debug,tower_http=info`
    pub level: String,
    pub format: LogFormat,
    /// Include the current span and span list in JSON output
    pub include_spans: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Json,
            include_spans: false,
        }
    }
}

/// Root configuration record of a host.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HostConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub app_name: Option<AppNameOptions>,
    #[serde(default)]
    pub correlation_id: Option<CorrelationIdOptions>,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Upper bound for draining in-flight requests once shutdown starts
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            app_name: None,
            correlation_id: None,
            logging: LoggingConfig::default(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}
