pub mod executor;
pub mod handler;
pub mod service;
pub mod types;

pub use executor::{build_client, execute_request, HttpUpstream};
pub use handler::Relay;
pub use service::{Upstream, UpstreamFuture};
pub use types::*;
