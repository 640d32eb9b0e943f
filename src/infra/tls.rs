//! TLS client configuration.
//!
//! Builds the single `rustls::ClientConfig` the relay uses for its lifetime.
//! The standard variant authenticates the backend only; the mutual variant
//! also presents a client certificate, restricts cipher suites to an
//! allow-list and pins the protocol version. Any problem with the material
//! is a cold-start error: there is no fallback to a weaker configuration.

use super::keystore::{load_client_identity, load_trust_store, ClientIdentity};
use crate::config::{MutualTlsSettings, TlsSettings, TlsVersion};
use crate::error::ConfigError;
use crate::shared::parse_x509_basic;
use rustls::crypto::{ring, CryptoProvider};
use rustls::{ClientConfig, RootCertStore, SupportedProtocolVersion};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

impl TlsVersion {
    fn supported(self) -> &'static SupportedProtocolVersion {
        match self {
            TlsVersion::Tls12 => &rustls::version::TLS12,
            TlsVersion::Tls13 => &rustls::version::TLS13,
        }
    }
}

/// ALPN offers, most preferred first. A backend that selects none is spoken
/// to over HTTP/1.1.
const ALPN_PROTOCOLS: [&[u8]; 2] = [b"h2", b"http/1.1"];

/// Creates the TLS client configuration for the given settings.
pub fn create_tls_config(settings: &TlsSettings) -> Result<ClientConfig, ConfigError> {
    let mut config = match settings {
        TlsSettings::Standard { truststore_path } => {
            let roots = match truststore_path {
                Some(path) => load_trust_store(path)?,
                None => RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned()),
            };

            let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
                .with_safe_default_protocol_versions()?
                .with_root_certificates(roots)
                .with_no_client_auth();

            config
        }
        TlsSettings::Mutual(mutual) => create_mutual_tls_config(mutual)?,
    };

    config.alpn_protocols = ALPN_PROTOCOLS.iter().map(|p| p.to_vec()).collect();
    Ok(config)
}

fn create_mutual_tls_config(settings: &MutualTlsSettings) -> Result<ClientConfig, ConfigError> {
    if settings.truststore_password.is_some() {
        tracing::warn!("TRUSTSTORE_PASSWORD is set but PEM trust stores are not encrypted; ignoring it");
    }

    let roots = load_trust_store(&settings.truststore_path)?;
    let ClientIdentity { chain, key } = load_client_identity(
        &settings.keystore_path,
        settings.keystore_password.as_deref(),
    )?;
    log_client_certificate(&chain[0]);

    let provider = restricted_provider(&settings.cipher_suites, settings.protocol_version)?;

    let config = ClientConfig::builder_with_provider(Arc::new(provider))
        .with_protocol_versions(&[settings.protocol_version.supported()])?
        .with_root_certificates(roots)
        .with_client_auth_cert(chain, key)?;

    tracing::info!(
        version = ?settings.protocol_version,
        "Mutual TLS context ready"
    );

    Ok(config)
}

/// Maps IANA TLS 1.3 suite names onto rustls' `TLS13_` spelling.
fn canonical_suite_name(name: &str) -> String {
    let upper = name.trim().to_ascii_uppercase();
    if upper.starts_with("TLS_AES_") || upper.starts_with("TLS_CHACHA20_") {
        format!("TLS13_{}", &upper["TLS_".len()..])
    } else {
        upper
    }
}

/// A `ring` provider limited to the allowed suites of the pinned version.
fn restricted_provider(
    allowed: &[String],
    version: TlsVersion,
) -> Result<CryptoProvider, ConfigError> {
    let wanted: Vec<String> = allowed.iter().map(|n| canonical_suite_name(n)).collect();
    let pinned = version.supported().version;

    let mut provider = ring::default_provider();
    provider.cipher_suites.retain(|suite| {
        wanted.contains(&format!("{:?}", suite.suite())) && suite.version().version == pinned
    });

    for name in &wanted {
        let usable = provider
            .cipher_suites
            .iter()
            .any(|suite| &format!("{:?}", suite.suite()) == name);
        if !usable {
            tracing::warn!(cipher = %name, "Cipher suite unavailable for the configured protocol version, skipping");
        }
    }

    if provider.cipher_suites.is_empty() {
        return Err(ConfigError::NoUsableCipherSuites(allowed.to_vec()));
    }

    Ok(provider)
}

fn log_client_certificate(leaf: &[u8]) {
    let info = parse_x509_basic(leaf);
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default();

    tracing::info!(
        subject = info.subject.as_deref().unwrap_or("unknown"),
        issuer = info.issuer.as_deref().unwrap_or("unknown"),
        valid_to = info.valid_to.unwrap_or_default(),
        san = ?info.san,
        "Loaded client certificate"
    );

    if info.is_expired_at(now) {
        tracing::warn!(
            subject = info.subject.as_deref().unwrap_or("unknown"),
            "Client certificate is outside its validity period; the backend will likely reject it"
        );
    }
}
