//! Transport-level errors from the HTTP boundary.

use std::fmt;

use serde_json::Value;

/// Categories of API failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Request exceeded the configured timeout.
    Timeout,
    /// Could not connect to the server.
    Connect,
    /// Server answered with a non-success status.
    HttpStatus,
    /// Response body did not have the expected shape.
    Decode,
    /// Any other request failure (invalid URL, body encoding, etc.).
    Request,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Connect => write!(f, "connect"),
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Decode => write!(f, "decode"),
            ApiErrorKind::Request => write!(f, "request"),
        }
    }
}

/// Structured error from the API boundary.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status, when the server answered
    pub status: Option<u16>,
    /// One-line summary suitable for logs
    pub message: String,
    /// `message` field of the server's JSON error body, when present
    pub server_message: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            server_message: None,
        }
    }

    /// Creates an HTTP status error, extracting the server's message if the
    /// body is a JSON object with a string `message` field.
    pub fn http_status(status: u16, body: &str) -> Self {
        let server_message = extract_server_message(body);
        let message = match &server_message {
            Some(msg) => format!("HTTP {status}: {msg}"),
            None => format!("HTTP {status}"),
        };
        Self {
            kind: ApiErrorKind::HttpStatus,
            status: Some(status),
            message,
            server_message,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }

    /// Converts a reqwest failure into an API error.
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ApiErrorKind::Timeout
        } else if err.is_connect() {
            ApiErrorKind::Connect
        } else if err.is_decode() {
            ApiErrorKind::Decode
        } else {
            ApiErrorKind::Request
        };
        let mut api = Self::new(kind, err.to_string());
        api.status = err.status().map(|s| s.as_u16());
        api
    }

    /// Message to surface to the user: the server's text, else `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

fn extract_server_message(body: &str) -> Option<String> {
    let json: Value = serde_json::from_str(body).ok()?;
    json.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
