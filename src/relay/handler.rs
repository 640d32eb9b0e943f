use super::executor::HttpUpstream;
use super::service::Upstream;
use super::types::{InboundRequest, InboundResponse, OutboundRequest};
use crate::config::Config;
use crate::error::ConfigError;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::time::Duration;
use url::Url;

/// Forwards each inbound request to the configured backend.
///
/// Built once at cold start and shared by reference across invocations;
/// nothing in it changes after construction.
pub struct Relay<U = HttpUpstream> {
    upstream: U,
    target: Url,
    headers: HeaderMap,
    request_timeout: Duration,
}

impl Relay<HttpUpstream> {
    /// Builds the relay with a real HTTPS upstream, loading all TLS material.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let upstream = HttpUpstream::new(config)?;
        Self::new(config, upstream)
    }
}

impl<U: Upstream> Relay<U> {
    pub fn new(config: &Config, upstream: U) -> Result<Self, ConfigError> {
        Ok(Self {
            upstream,
            target: config.target.clone(),
            headers: config.headers.to_header_map()?,
            request_timeout: config.request_timeout,
        })
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// The fixed-shape request sent for every invocation.
    pub fn outbound_request(&self) -> OutboundRequest {
        OutboundRequest {
            method: Method::GET,
            url: self.target.clone(),
            headers: self.headers.clone(),
            timeout: self.request_timeout,
        }
    }

    /// Relays one invocation. Never fails: every outbound error becomes the
    /// fixed 500 response and the cause goes to the log only.
    pub async fn handle(&self, request: InboundRequest) -> InboundResponse {
        tracing::info!(
            method = request.http_method.as_deref().unwrap_or("-"),
            path = request.path.as_deref().unwrap_or("-"),
            "Relaying request"
        );
        tracing::debug!(?request, "Inbound event");

        let outbound = self.outbound_request();

        match self.upstream.send(&outbound).await {
            Ok(response) => {
                if !response.is_success() {
                    tracing::warn!(
                        status = response.status,
                        "Backend returned a non-success status, relaying body with 200"
                    );
                }
                InboundResponse::relayed(response.body)
            }
            Err(e) => {
                tracing::error!(kind = %e.kind(), error = %e, url = %outbound.url, "Relay call failed");
                InboundResponse::failure()
            }
        }
    }
}
