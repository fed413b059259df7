//! Transport types seen at the request interception point.

use std::error::Error;
use std::fmt::{Display, Formatter};
use url::Url;

/// How the host issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    /// Subresource fetch (script, style, image, ...).
    Subresource,
}

/// Intercepted read request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    /// Upper-case HTTP method.
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
}

impl AssetRequest {
    /// Builds a `GET` subresource request.
    pub fn get(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            mode: RequestMode::Subresource,
        }
    }

    /// Builds a `GET` navigation request.
    pub fn navigate(url: Url) -> Self {
        Self {
            method: "GET".to_string(),
            url,
            mode: RequestMode::Navigate,
        }
    }

    pub fn with_method(mut self, method: &str) -> Self {
        self.method = method.trim().to_ascii_uppercase();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// Response body and metadata as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl AssetResponse {
    /// Builds a `200 OK` response.
    pub fn ok(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.into()),
            body: body.into(),
        }
    }

    /// Whether the response may be written to cache.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Live fetch failure (the request never produced a response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// No connectivity.
    Offline,
    /// Transport failure with a host-provided reason.
    Failed(String),
}

impl Display for NetworkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offline => write!(f, "network unavailable"),
            Self::Failed(reason) => write!(f, "network request failed: {reason}"),
        }
    }
}

impl Error for NetworkError {}

/// Live network seen by the controller.
///
/// Implementations may block until the host network stack resolves or
/// gives up; the controller imposes no timeout.
pub trait Network {
    fn fetch(&self, request: &AssetRequest) -> Result<AssetResponse, NetworkError>;
}
