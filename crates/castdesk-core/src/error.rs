//! Domain error taxonomy.
//!
//! Remote failures keep the user-facing text (server message or a fixed
//! fallback) separate from the underlying [`ApiError`], which stays
//! reachable through `source()` for callers that need the kind.

use std::fmt;

use crate::api::{ApiError, ApiErrorKind};

/// Local, pre-network field validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Login, registration or session failure.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// A field failed the local pre-check; no request was made.
    Validation(ValidationError),
    /// The server rejected the request or could not be reached.
    Api { message: String, source: ApiError },
    /// The server answered with a token whose payload cannot be decoded.
    MalformedToken { message: String },
    /// The token could not be persisted.
    Storage { message: String },
}

impl AuthError {
    /// Text recorded as the session's `last_error`.
    pub fn message(&self) -> &str {
        match self {
            AuthError::Validation(err) => &err.message,
            AuthError::Api { message, .. }
            | AuthError::MalformedToken { message }
            | AuthError::Storage { message } => message,
        }
    }

    /// Transport kind, when the failure came from the API boundary.
    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        match self {
            AuthError::Api { source, .. } => Some(source.kind),
            _ => None,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Api { source, .. } => Some(source),
            AuthError::Validation(_)
            | AuthError::MalformedToken { .. }
            | AuthError::Storage { .. } => None,
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::Validation(err)
    }
}

/// A list or detail retrieval failed.
#[derive(Debug, Clone)]
pub struct FetchError {
    pub message: String,
    pub source: ApiError,
}

impl FetchError {
    /// Wraps `source`, preferring the server's message over `fallback`.
    pub fn from_api(source: ApiError, fallback: &str) -> Self {
        Self {
            message: source.user_message(fallback),
            source,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.source.kind
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// A create, update or delete failed.
#[derive(Debug, Clone)]
pub struct MutationError {
    pub message: String,
    pub source: ApiError,
}

impl MutationError {
    /// Wraps `source`, preferring the server's message over `fallback`.
    pub fn from_api(source: ApiError, fallback: &str) -> Self {
        Self {
            message: source.user_message(fallback),
            source,
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.source.kind
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for MutationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_fetch_error_prefers_server_message() {
        let api = ApiError::http_status(404, r#"{"message":"Customer not found"}"#);
        let err = FetchError::from_api(api, "Failed to fetch customer");
        assert_eq!(err.to_string(), "Customer not found");
        assert_eq!(err.kind(), ApiErrorKind::HttpStatus);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_mutation_error_falls_back_on_timeout() {
        let err = MutationError::from_api(ApiError::timeout("timed out"), "Failed to delete broadcast");
        assert_eq!(err.to_string(), "Failed to delete broadcast");
        assert_eq!(err.kind(), ApiErrorKind::Timeout);
    }

    #[test]
    fn test_auth_error_message_and_kind() {
        let err = AuthError::from(ValidationError::new("email", "Invalid email address"));
        assert_eq!(err.message(), "Invalid email address");
        assert_eq!(err.api_kind(), None);

        let err = AuthError::Api {
            message: "Login failed".to_string(),
            source: ApiError::timeout("timed out"),
        };
        assert_eq!(err.api_kind(), Some(ApiErrorKind::Timeout));
    }
}
