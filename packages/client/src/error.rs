//! Client error types
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Message shown when the service could not be reached or gave no usable error body
pub const GENERIC_RETRY_MESSAGE: &str = "Failed to reach the A11y Insights service. Please try again.";

/// Client-specific error types
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Report not found: {0}")]
    NotFound(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Error envelopes the service is known to return
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        let detail = self.detail.and_then(|detail| match detail {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });

        detail
            .or(self.message)
            .or(self.error)
            .filter(|m| !m.trim().is_empty())
    }
}

impl ClientError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Classify a non-success response.
    ///
    /// A structured body carrying a message becomes [`ClientError::Server`];
    /// anything else is a transport failure that keeps the raw text (or just
    /// the status) for diagnostics.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Self::Authentication(format!("Server responded with {}", status));
        }

        if let Some(message) = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(ErrorBody::into_message)
        {
            return Self::Server {
                status: status.as_u16(),
                message,
            };
        }

        let text = body.trim();
        if text.is_empty() {
            Self::Transport(format!("Server responded with {}", status))
        } else {
            Self::Transport(format!("Server responded with {}: {}", status, text))
        }
    }

    /// Check if this is a network-related error
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Check if the requested report does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Check if this is an authentication error
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ClientError::Authentication(_))
    }

    /// Text suitable for a user-facing notification.
    ///
    /// Server messages and validation messages are surfaced verbatim,
    /// everything else collapses into the generic retry text.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(msg) => msg.clone(),
            ClientError::Server { message, .. } => message.clone(),
            ClientError::NotFound(id) => format!("Report {} was not found.", id),
            ClientError::Authentication(_) => {
                "The A11y Insights service rejected the API token.".to_string()
            }
            _ => GENERIC_RETRY_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        Self::Configuration(format!("Invalid settings format: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structured_detail_becomes_server_error() {
        let err = ClientError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": "Description is too short"}"#,
        );
        match err {
            ClientError::Server { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Description is too short");
            }
            other => panic!("Expected server error, got {:?}", other),
        }
    }

    #[test]
    fn test_message_and_error_fields_are_fallbacks() {
        let err = ClientError::from_status(StatusCode::BAD_REQUEST, r#"{"message": "bad"}"#);
        assert_eq!(err.user_message(), "bad");

        let err = ClientError::from_status(StatusCode::BAD_REQUEST, r#"{"error": "worse"}"#);
        assert_eq!(err.user_message(), "worse");
    }

    #[test]
    fn test_unparseable_body_is_transport_error() {
        let err = ClientError::from_status(StatusCode::BAD_GATEWAY, "<html>oops</html>");
        assert!(err.is_transport());
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("oops"));
        assert_eq!(err.user_message(), GENERIC_RETRY_MESSAGE);

        let err = ClientError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(
            err.to_string(),
            "Network error: Server responded with 500 Internal Server Error"
        );
    }

    #[test]
    fn test_unauthorized_is_auth_error() {
        let err = ClientError::from_status(StatusCode::UNAUTHORIZED, "{}");
        assert!(err.is_auth_error());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_error_display() {
        let error = ClientError::validation("Description is required");
        assert_eq!(error.to_string(), "Validation error: Description is required");
        assert_eq!(error.user_message(), "Description is required");

        let error = ClientError::NotFound("A11Y-1".to_string());
        assert!(error.is_not_found());
        assert_eq!(error.to_string(), "Report not found: A11Y-1");
    }
}
