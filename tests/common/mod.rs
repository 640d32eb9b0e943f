//! Local TLS backend for relay integration tests.

#![allow(dead_code)]

use rustls::crypto::ring;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{ProtocolVersion, RootCertStore, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn certs(name: &str) -> Vec<CertificateDer<'static>> {
    let pem = std::fs::read(fixture(name)).unwrap();
    rustls_pemfile::certs(&mut pem.as_slice())
        .collect::<Result<_, _>>()
        .unwrap()
}

fn key(name: &str) -> PrivateKeyDer<'static> {
    let pem = std::fs::read(fixture(name)).unwrap();
    rustls_pemfile::private_key(&mut pem.as_slice())
        .unwrap()
        .unwrap()
}

/// Which certificate the backend presents.
#[derive(Clone, Copy)]
pub enum ServerIdentity {
    /// Signed by `ca.pem`.
    Trusted,
    /// Signed by `rogue-ca.pem`, unknown to the relay.
    Rogue,
}

pub struct BackendOptions {
    pub identity: ServerIdentity,
    pub require_client_cert: bool,
    pub status: u16,
    pub body: &'static str,
}

impl Default for BackendOptions {
    fn default() -> Self {
        Self {
            identity: ServerIdentity::Trusted,
            require_client_cert: false,
            status: 200,
            body: "ok",
        }
    }
}

/// A request the backend read in full, with the negotiated TLS version.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub head: String,
    pub version: Option<ProtocolVersion>,
}

pub struct Backend {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<SeenRequest>>>,
}

impl Backend {
    /// Value for `BACKEND_SERVICE_*_HOST_NAME`.
    pub fn host(&self) -> String {
        format!("127.0.0.1:{}", self.addr.port())
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn server_config(options: &BackendOptions) -> ServerConfig {
    let provider = Arc::new(ring::default_provider());
    let builder = ServerConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .unwrap();

    let builder = if options.require_client_cert {
        let mut roots = RootCertStore::empty();
        for cert in certs("ca.pem") {
            roots.add(cert).unwrap();
        }
        let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .unwrap();
        builder.with_client_cert_verifier(verifier)
    } else {
        builder.with_no_client_auth()
    };

    let (cert, key_file) = match options.identity {
        ServerIdentity::Trusted => ("server.pem", "server-key.pem"),
        ServerIdentity::Rogue => ("rogue-server.pem", "rogue-server-key.pem"),
    };
    builder.with_single_cert(certs(cert), key(key_file)).unwrap()
}

/// Starts an HTTPS backend on an ephemeral port. Each connection serves one
/// request and closes.
pub async fn spawn_backend(options: BackendOptions) -> Backend {
    let acceptor = TlsAcceptor::from(Arc::new(server_config(&options)));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let seen = requests.clone();
    let status = options.status;
    let body = options.body;
    tokio::spawn(async move {
        while let Ok((tcp, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(tcp).await else {
                    return;
                };
                let version = tls.get_ref().1.protocol_version();

                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match tls.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => head.extend_from_slice(&chunk[..n]),
                    }
                }

                seen.lock().unwrap().push(SeenRequest {
                    head: String::from_utf8_lossy(&head).into_owned(),
                    version,
                });

                let response = format!(
                    "HTTP/1.1 {} Backend\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = tls.write_all(response.as_bytes()).await;
                let _ = tls.shutdown().await;
            });
        }
    });

    Backend { addr, requests }
}

/// A TCP listener that accepts connections and never answers.
pub async fn spawn_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((tcp, _)) = listener.accept().await {
            held.push(tcp);
        }
    });
    addr
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
