//! `lambda-mtls`: relays to `BACKEND_SERVICE_2_HOST_NAME` presenting a client
//! certificate.

use lambda_relay::{runtime, RelayMode};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    runtime::start(RelayMode::Mutual).await
}
