pub mod extensions;
pub mod host;
pub mod trace_identifier;
pub mod web_host;

pub use host::{Host, HostBuilder};
pub use trace_identifier::TraceIdentifier;
pub use web_host::{HostExtension, WebHost, apply_extensions, extension};
