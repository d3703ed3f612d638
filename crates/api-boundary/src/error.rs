//! Request boundary error types.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

const FALLBACK_MESSAGE: &str = "Unexpected server error";

/// A non-success response from the provider.
///
/// Displays as the provider's message so it can be shown to the user as-is.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
    /// The parsed error body, when it was JSON.
    pub payload: Option<Value>,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            status,
            message: message.into(),
            payload,
        }
    }

    /// Build from a raw error body. Uses the body's `message` field when
    /// present, otherwise the status reason phrase.
    pub fn from_body(status: StatusCode, body: &[u8]) -> Self {
        let payload = serde_json::from_slice::<Value>(body).ok();

        let message = payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());

        Self {
            status,
            message,
            payload,
        }
    }
}

/// Request boundary error type.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The provider answered with a non-success status
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The request never produced a response (DNS, connect, reset, ...)
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Success body did not match the expected shape
    #[error("Failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// Base address and path do not form a URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A header value (e.g. the bearer token) contains bytes HTTP cannot carry
    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// A body was required but the response was empty (204 or parsing disabled)
    #[error("Expected a response body but none was returned")]
    EmptyResponse,
}

impl ApiError {
    /// Status code of a provider failure.
    pub fn status(&self) -> Option<StatusCode> {
        self.http().map(|e| e.status)
    }

    /// The provider failure, if this is one.
    pub fn http(&self) -> Option<&HttpError> {
        match self {
            ApiError::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type alias using ApiError.
pub type ApiResult<T> = Result<T, ApiError>;
