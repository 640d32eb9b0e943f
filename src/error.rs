use std::error::Error as StdError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration and TLS material at cold start.
///
/// Any of these prevents the handler from serving requests.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    #[error("Invalid backend host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Keystore {}: {reason}", .path.display())]
    Keystore { path: PathBuf, reason: String },

    #[error("Trust store {}: {reason}", .path.display())]
    TrustStore { path: PathBuf, reason: String },

    #[error("None of the allowed cipher suites {0:?} are usable with the configured protocol version")]
    NoUsableCipherSuites(Vec<String>),

    #[error("TLS configuration rejected: {0}")]
    Tls(#[from] rustls::Error),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Failure category of a relayed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    Transport,
    Timeout,
    Tls,
}

impl fmt::Display for RelayErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelayErrorKind::Transport => "TRANSPORT",
            RelayErrorKind::Timeout => "TIMEOUT",
            RelayErrorKind::Tls => "TLS",
        };
        f.write_str(s)
    }
}

/// A failed outbound call. Recovered at the handler boundary and never
/// shown to the inbound caller.
#[derive(Error, Debug)]
#[error("{kind} error: {message}")]
pub struct RelayError {
    kind: RelayErrorKind,
    message: String,
}

impl RelayError {
    pub fn new(kind: RelayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> RelayErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            RelayErrorKind::Timeout
        } else if find_tls_error(&e).is_some() {
            RelayErrorKind::Tls
        } else {
            RelayErrorKind::Transport
        };

        // reqwest's Display hides the cause, so flatten the chain for the log.
        let mut message = e.to_string();
        let mut source = e.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }

        RelayError::new(kind, message)
    }
}

/// Walks an error's source chain looking for a rustls error.
///
/// `io::Error` forwards `source()` to its inner error's source, so the inner
/// error itself is checked through `get_ref`.
fn find_tls_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut current: Option<&'a (dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if let Some(tls) = io.get_ref().and_then(|inner| inner.downcast_ref::<rustls::Error>()) {
                return Some(tls);
            }
        }
        current = e.source();
    }
    None
}
