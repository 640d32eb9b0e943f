//! Outbound HTTPS execution.
//!
//! One `reqwest::Client` is built at cold start around the preconfigured
//! rustls context and reused by every invocation. Redirects are never
//! followed, so each invocation issues exactly one request.

use super::service::{Upstream, UpstreamFuture};
use super::types::{OutboundRequest, OutboundResponse};
use crate::config::Config;
use crate::error::{ConfigError, RelayError};
use crate::infra::create_tls_config;
use std::time::Instant;

/// Builds the shared HTTP client for the given configuration.
pub fn build_client(config: &Config) -> Result<reqwest::Client, ConfigError> {
    let tls_config = create_tls_config(&config.tls)?;

    reqwest::Client::builder()
        .use_preconfigured_tls(tls_config)
        .https_only(true)
        .redirect(reqwest::redirect::Policy::none())
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .build()
        .map_err(ConfigError::Client)
}

/// Sends the request and reads the whole body as text.
pub async fn execute_request(
    client: &reqwest::Client,
    request: &OutboundRequest,
) -> Result<OutboundResponse, RelayError> {
    let started = Instant::now();

    let response = client
        .request(request.method.clone(), request.url.clone())
        .headers(request.headers.clone())
        .timeout(request.timeout)
        .send()
        .await?;

    let status = response.status().as_u16();
    let body = response.text().await?;

    tracing::info!(
        url = %request.url,
        status,
        elapsed_ms = elapsed_ms(started),
        body_len = body.len(),
        "Backend responded"
    );

    Ok(OutboundResponse { status, body })
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u64::MAX as u128) as u64
}

/// Upstream backed by a real HTTPS client.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(config)?,
        })
    }
}

impl Upstream for HttpUpstream {
    fn send<'a>(&'a self, request: &'a OutboundRequest) -> UpstreamFuture<'a> {
        Box::pin(execute_request(&self.client, request))
    }
}

