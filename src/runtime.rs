//! Lambda runtime wiring shared by both binaries.

use crate::config::{Config, RelayMode};
use crate::relay::{InboundRequest, InboundResponse, Relay, Upstream};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global subscriber. CloudWatch adds its own timestamps and
/// does not render ANSI colors.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lambda_relay=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .without_time(),
        )
        .init();
}

/// Cold start: load configuration and TLS material, then serve invocations.
///
/// Any configuration problem is returned before the first event is polled.
pub async fn start(mode: RelayMode) -> Result<(), Error> {
    init_tracing();

    let config = Config::from_env(mode).map_err(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        e
    })?;
    let relay = Relay::from_config(&config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize relay");
        e
    })?;

    tracing::info!(
        mode = ?config.mode,
        target = %relay.target(),
        connect_timeout_secs = config.connect_timeout.as_secs(),
        request_timeout_secs = config.request_timeout.as_secs(),
        "Relay ready"
    );

    run(&relay).await
}

/// Polls the runtime API, handing every event to the shared relay.
pub async fn run<U: Upstream>(relay: &Relay<U>) -> Result<(), Error> {
    lambda_runtime::run(service_fn(move |event: LambdaEvent<InboundRequest>| async move {
        tracing::debug!(request_id = %event.context.request_id, "Invocation received");
        Ok::<InboundResponse, Error>(relay.handle(event.payload).await)
    }))
    .await
}
