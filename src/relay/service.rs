//! Upstream abstraction layer.
//!
//! The relay talks to its backend through this trait, so the handler's
//! response mapping can be exercised without a network.

use super::types::{OutboundRequest, OutboundResponse};
use crate::error::RelayError;
use std::future::Future;
use std::pin::Pin;

pub type UpstreamFuture<'a> =
    Pin<Box<dyn Future<Output = Result<OutboundResponse, RelayError>> + Send + 'a>>;

/// A backend the relay can send exactly one request to per invocation.
pub trait Upstream: Send + Sync {
    /// Executes the request and buffers the full response body.
    fn send<'a>(&'a self, request: &'a OutboundRequest) -> UpstreamFuture<'a>;
}
