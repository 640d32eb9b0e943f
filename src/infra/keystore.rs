//! PEM keystore and trust store loading.
//!
//! A client keystore is a single PEM file holding the certificate chain
//! (leaf first) and the private key. The key may be PKCS#8, PKCS#1, SEC1,
//! or a password-protected `ENCRYPTED PRIVATE KEY` block.

use crate::error::ConfigError;
use pkcs8::der::pem::PemLabel;
use pkcs8::EncryptedPrivateKeyInfo;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::RootCertStore;
use std::path::Path;

/// Client certificate chain and matching private key.
#[derive(Debug)]
pub struct ClientIdentity {
    pub chain: Vec<CertificateDer<'static>>,
    pub key: PrivateKeyDer<'static>,
}

fn read_file(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_certs(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, std::io::Error> {
    rustls_pemfile::certs(&mut &pem[..]).collect()
}

/// Loads every CA certificate in a PEM trust store.
pub fn load_trust_store(path: &Path) -> Result<RootCertStore, ConfigError> {
    let pem = read_file(path)?;
    let trust_err = |reason: String| ConfigError::TrustStore {
        path: path.to_path_buf(),
        reason,
    };

    let certs = read_certs(&pem).map_err(|e| trust_err(e.to_string()))?;
    if certs.is_empty() {
        return Err(trust_err("no certificates found".to_string()));
    }

    let mut roots = RootCertStore::empty();
    for cert in certs {
        roots
            .add(cert)
            .map_err(|e| trust_err(format!("unusable trust anchor: {}", e)))?;
    }

    tracing::debug!(path = %path.display(), anchors = roots.len(), "Loaded trust store");
    Ok(roots)
}

/// Loads the client certificate chain and private key from a PEM keystore.
///
/// An encrypted key requires `password`; a plaintext key ignores it.
pub fn load_client_identity(
    path: &Path,
    password: Option<&str>,
) -> Result<ClientIdentity, ConfigError> {
    let pem = read_file(path)?;
    let key_err = |reason: String| ConfigError::Keystore {
        path: path.to_path_buf(),
        reason,
    };

    let chain = read_certs(&pem).map_err(|e| key_err(e.to_string()))?;
    if chain.is_empty() {
        return Err(key_err("no client certificate found".to_string()));
    }

    let key = match encrypted_key_der(&pem).map_err(key_err)? {
        Some(der) => {
            let password = password
                .ok_or_else(|| key_err("private key is encrypted but no password is set".to_string()))?;
            decrypt_pkcs8(&der, password).map_err(key_err)?
        }
        None => {
            if password.is_some() {
                tracing::debug!(path = %path.display(), "Keystore password set but private key is not encrypted");
            }
            rustls_pemfile::private_key(&mut &pem[..])
                .map_err(|e| key_err(e.to_string()))?
                .ok_or_else(|| key_err("no private key found".to_string()))?
        }
    };

    Ok(ClientIdentity { chain, key })
}

/// Decodes the first `ENCRYPTED PRIVATE KEY` block, if any.
///
/// The boundaries only locate the block inside the keystore; the block
/// itself is parsed by `pem-rfc7468`.
fn encrypted_key_der(pem: &[u8]) -> Result<Option<Vec<u8>>, String> {
    let label = EncryptedPrivateKeyInfo::PEM_LABEL;
    let text = String::from_utf8_lossy(pem);
    let Some(begin) = text.find(&format!("-----BEGIN {}-----", label)) else {
        return Ok(None);
    };
    let end_marker = format!("-----END {}-----", label);
    let end = text[begin..]
        .find(&end_marker)
        .map(|i| begin + i + end_marker.len())
        .unwrap_or(text.len());

    let (found, der) = pkcs8::der::pem::decode_vec(text[begin..end].as_bytes())
        .map_err(|e| format!("malformed encrypted private key: {}", e))?;
    if found != label {
        return Err(format!("unexpected PEM label {:?}", found));
    }
    Ok(Some(der))
}

fn decrypt_pkcs8(der: &[u8], password: &str) -> Result<PrivateKeyDer<'static>, String> {
    let info = EncryptedPrivateKeyInfo::try_from(der)
        .map_err(|e| format!("malformed encrypted private key: {}", e))?;
    let document = info
        .decrypt(password)
        .map_err(|e| format!("failed to decrypt private key: {}", e))?;

    Ok(PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(
        document.as_bytes().to_vec(),
    )))
}
