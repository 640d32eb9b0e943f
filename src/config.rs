//! Environment-driven configuration, read once at cold start.

use crate::error::ConfigError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const CONNECT_TIMEOUT_SECS: u64 = 10;
pub const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Cipher suites allowed by default for the mutual-TLS variant.
///
/// Only the first is implemented by the `ring` provider; the others are
/// skipped with a warning when the TLS context is built.
pub const DEFAULT_CIPHER_SUITES: &[&str] = &[
    "TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_DHE_RSA_WITH_AES_256_GCM_SHA384",
    "TLS_ECDHE_RSA_WITH_AES_256_CBC_SHA384",
];

/// Which deployed function this process backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    /// `lambda-no-mtls`: server authentication only.
    Plain,
    /// `lambda-mtls`: client certificate, pinned trust store and cipher policy.
    Mutual,
}

impl RelayMode {
    pub fn host_var(self) -> &'static str {
        match self {
            RelayMode::Plain => "BACKEND_SERVICE_1_HOST_NAME",
            RelayMode::Mutual => "BACKEND_SERVICE_2_HOST_NAME",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsVersion {
    Tls12,
    Tls13,
}

impl TlsVersion {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tlsv1.2" | "tls1.2" | "1.2" => Some(TlsVersion::Tls12),
            "tlsv1.3" | "tls1.3" | "1.3" => Some(TlsVersion::Tls13),
            _ => None,
        }
    }
}

/// Values of the four identification headers sent on every outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayHeaders {
    pub client_id: String,
    pub transaction_id: String,
    pub call_guid: String,
    pub interaction_id: String,
}

impl Default for RelayHeaders {
    fn default() -> Self {
        Self {
            client_id: "lambda-relay".to_string(),
            transaction_id: "lambda-relay-transaction".to_string(),
            call_guid: "lambda-relay-call".to_string(),
            interaction_id: "lambda-relay-interaction".to_string(),
        }
    }
}

impl RelayHeaders {
    /// Header name, overriding variable and value, in the order they are sent.
    pub fn pairs(&self) -> [(&'static str, &'static str, &str); 4] {
        [
            ("X-Client-ID", "RELAY_CLIENT_ID", self.client_id.as_str()),
            ("X-Transaction-ID", "RELAY_TRANSACTION_ID", self.transaction_id.as_str()),
            ("callGuid", "RELAY_CALL_GUID", self.call_guid.as_str()),
            ("X-Interaction-ID", "RELAY_INTERACTION_ID", self.interaction_id.as_str()),
        ]
    }

    /// Validates the values and builds the header map sent on every call.
    pub fn to_header_map(&self) -> Result<HeaderMap, ConfigError> {
        let mut map = HeaderMap::new();
        for (name, var, value) in self.pairs() {
            let value = HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidVar {
                name: var,
                reason: format!("not a valid {} header value: {}", name, e),
            })?;
            let header = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidVar {
                name: var,
                reason: e.to_string(),
            })?;
            map.insert(header, value);
        }
        Ok(map)
    }
}

/// Client certificate and backend trust policy for the mutual-TLS variant.
#[derive(Debug, Clone)]
pub struct MutualTlsSettings {
    pub keystore_path: PathBuf,
    pub keystore_password: Option<String>,
    pub truststore_path: PathBuf,
    pub truststore_password: Option<String>,
    pub cipher_suites: Vec<String>,
    pub protocol_version: TlsVersion,
}

#[derive(Debug, Clone)]
pub enum TlsSettings {
    /// Server authentication against the given PEM trust store, or the
    /// Mozilla root set when none is configured.
    Standard { truststore_path: Option<PathBuf> },
    Mutual(MutualTlsSettings),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub mode: RelayMode,
    pub target: Url,
    pub headers: RelayHeaders,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub tls: TlsSettings,
}

impl Config {
    pub fn from_env(mode: RelayMode) -> Result<Self, ConfigError> {
        Self::from_lookup(mode, |name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(mode: RelayMode, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host_var = mode.host_var();
        let backend_host = get(host_var)
            .map(|h| h.trim().to_string())
            .ok_or(ConfigError::MissingVar(host_var))?;
        let target = target_url(&backend_host)?;

        let defaults = RelayHeaders::default();
        let headers = RelayHeaders {
            client_id: get("RELAY_CLIENT_ID").unwrap_or(defaults.client_id),
            transaction_id: get("RELAY_TRANSACTION_ID").unwrap_or(defaults.transaction_id),
            call_guid: get("RELAY_CALL_GUID").unwrap_or(defaults.call_guid),
            interaction_id: get("RELAY_INTERACTION_ID").unwrap_or(defaults.interaction_id),
        };

        let connect_timeout = seconds(
            "RELAY_CONNECT_TIMEOUT_SECS",
            get("RELAY_CONNECT_TIMEOUT_SECS"),
            CONNECT_TIMEOUT_SECS,
        )?;
        let request_timeout = seconds(
            "RELAY_REQUEST_TIMEOUT_SECS",
            get("RELAY_REQUEST_TIMEOUT_SECS"),
            REQUEST_TIMEOUT_SECS,
        )?;

        let tls = match mode {
            RelayMode::Plain => TlsSettings::Standard {
                truststore_path: get("TRUSTSTORE_PATH").map(PathBuf::from),
            },
            RelayMode::Mutual => {
                let cipher_suites = match get("TLS_CIPHER_SUITES") {
                    Some(list) => list
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                    None => DEFAULT_CIPHER_SUITES.iter().map(|s| s.to_string()).collect(),
                };

                let protocol_version = match get("TLS_PROTOCOL_VERSION") {
                    Some(v) => TlsVersion::parse(&v).ok_or_else(|| ConfigError::InvalidVar {
                        name: "TLS_PROTOCOL_VERSION",
                        reason: format!("unsupported protocol version {:?}", v),
                    })?,
                    None => TlsVersion::Tls12,
                };

                TlsSettings::Mutual(MutualTlsSettings {
                    keystore_path: get("CLIENT_KEYSTORE_PATH")
                        .map(PathBuf::from)
                        .ok_or(ConfigError::MissingVar("CLIENT_KEYSTORE_PATH"))?,
                    keystore_password: get("CLIENT_KEYSTORE_PASSWORD"),
                    truststore_path: get("TRUSTSTORE_PATH")
                        .map(PathBuf::from)
                        .ok_or(ConfigError::MissingVar("TRUSTSTORE_PATH"))?,
                    truststore_password: get("TRUSTSTORE_PASSWORD"),
                    cipher_suites,
                    protocol_version,
                })
            }
        };

        Ok(Self {
            mode,
            target,
            headers,
            connect_timeout,
            request_timeout,
            tls,
        })
    }
}

/// Builds `https://{host}`. The host may carry a port, path and query.
fn target_url(host: &str) -> Result<Url, ConfigError> {
    if host.contains("://") {
        return Err(ConfigError::InvalidHost {
            host: host.to_string(),
            reason: "expected a host name without a scheme".to_string(),
        });
    }

    let url = Url::parse(&format!("https://{}", host)).map_err(|e| ConfigError::InvalidHost {
        host: host.to_string(),
        reason: e.to_string(),
    })?;

    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::InvalidHost {
            host: host.to_string(),
            reason: "URL has no host".to_string(),
        });
    }

    Ok(url)
}

fn seconds(name: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let secs = match value {
        Some(v) => v.trim().parse::<u64>().map_err(|e| ConfigError::InvalidVar {
            name,
            reason: e.to_string(),
        })?,
        None => default,
    };

    if secs == 0 {
        return Err(ConfigError::InvalidVar {
            name,
            reason: "timeout must be greater than zero".to_string(),
        });
    }

    Ok(Duration::from_secs(secs))
}
