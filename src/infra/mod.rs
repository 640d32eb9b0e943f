//! Infrastructure layer: TLS material loading and client configuration.

pub mod keystore;
pub mod tls;

pub use keystore::{load_client_identity, load_trust_store, ClientIdentity};
pub use tls::create_tls_config;
