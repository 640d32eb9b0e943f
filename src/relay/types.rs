use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";
pub const ERROR_BODY: &str = "error";

/// API Gateway REST proxy event.
///
/// Only logged; nothing here feeds the outbound call. Fields the relay does
/// not name are kept in `extra` so the full event reaches the log.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    pub resource: Option<String>,
    pub path: Option<String>,
    pub http_method: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub query_string_parameters: Option<HashMap<String, String>>,
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// API Gateway proxy response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl InboundResponse {
    fn with_content_type(status_code: u16, content_type: &str, body: String) -> Self {
        let mut headers = HashMap::new();
        headers.insert("Content-Type".to_string(), content_type.to_string());
        Self {
            status_code,
            headers,
            body,
            is_base64_encoded: false,
        }
    }

    /// The backend's body wrapped in the relay's own 200, whatever status
    /// the backend returned.
    pub fn relayed(body: String) -> Self {
        Self::with_content_type(200, CONTENT_TYPE_JSON, body)
    }

    /// The fixed failure shape. Carries no detail about the cause.
    pub fn failure() -> Self {
        Self::with_content_type(500, CONTENT_TYPE_TEXT, ERROR_BODY.to_string())
    }
}

/// The single call made for one invocation.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: String,
}

impl OutboundResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
