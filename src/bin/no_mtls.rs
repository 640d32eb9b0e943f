//! `lambda-no-mtls`: relays to `BACKEND_SERVICE_1_HOST_NAME` over plain TLS.

use lambda_relay::{runtime, RelayMode};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    runtime::start(RelayMode::Plain).await
}
