/// Error types for backend communication
///
/// Every call into the hosted backend funnels its failures through
/// [`BackendError`]. Transport problems keep the underlying `reqwest` error,
/// API rejections carry the status code and the backend's own message, and
/// nothing in this crate retries or recovers: callers must treat any error
/// as whole-operation failure.

use serde::Deserialize;

/// Backend result type alias
pub type BackendResult<T> = Result<T, BackendError>;

/// Unified error type for all backend calls
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Configuration is missing or invalid
    #[error("Invalid backend configuration: {0}")]
    Config(String),

    /// Network-level failure (DNS, TLS, connect, body read)
    #[error("Backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend rejected the request with a non-2xx status
    #[error("Backend returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,

        /// Message extracted from the backend's error body
        message: String,
    },

    /// The response body could not be decoded into the expected shape
    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    /// An operation required a session but none is present
    #[error("Not authenticated")]
    NotAuthenticated,
}

/// Error body shapes returned by the backend
///
/// The tabular REST layer returns `{"message": ...}`, the auth endpoints
/// return `{"msg": ...}` or `{"error_description": ...}` depending on the
/// failure. All three are tried in order.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl BackendError {
    /// Builds an [`BackendError::Api`] from a status code and raw error body
    ///
    /// Extracts the human-readable message the backend embedded in its JSON
    /// error body; falls back to the raw body text when it is not JSON.
    pub fn api(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message.or(b.msg).or(b.error_description))
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    "no error body".to_string()
                } else {
                    trimmed.chars().take(200).collect()
                }
            });

        BackendError::Api { status, message }
    }

    /// Returns the HTTP status for API errors, None otherwise
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_rest_body() {
        let err = BackendError::api(409, r#"{"message":"duplicate key value"}"#);
        assert_eq!(err.to_string(), "Backend returned 409: duplicate key value");
        assert_eq!(err.status(), Some(409));
    }

    #[test]
    fn test_api_error_from_auth_body() {
        let err = BackendError::api(400, r#"{"msg":"Email not confirmed"}"#);
        assert_eq!(err.to_string(), "Backend returned 400: Email not confirmed");

        let err = BackendError::api(400, r#"{"error_description":"Invalid grant"}"#);
        assert_eq!(err.to_string(), "Backend returned 400: Invalid grant");
    }

    #[test]
    fn test_api_error_from_plain_body() {
        let err = BackendError::api(502, "Bad Gateway");
        assert_eq!(err.to_string(), "Backend returned 502: Bad Gateway");
    }

    #[test]
    fn test_api_error_from_empty_body() {
        let err = BackendError::api(500, "");
        assert_eq!(err.to_string(), "Backend returned 500: no error body");
    }
}
