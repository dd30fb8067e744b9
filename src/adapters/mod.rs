pub mod app_name;
pub mod correlation_id;
pub mod middleware;

/// Re-export commonly used types from adapters
pub use app_name::{AppNameClient, AppNameLayer, AppNameService};
pub use correlation_id::{CorrelationIdLayer, CorrelationIdService};
pub use middleware::*;
