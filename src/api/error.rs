use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the data path. The enum is `Clone` so a rejection
/// can be broadcast to every waiter of a deduplicated fetch; transport
/// errors are flattened to their message at the boundary for the same
/// reason.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Request failed ({status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Unable to load profile")]
    ProfileUnavailable,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Message used when a failure response has no readable body.
const GENERIC_FAILURE: &str = "Request failed";

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &body[..end],
            body.len()
        )
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let text = if body.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            Self::truncate_body(body)
        };
        match status.as_u16() {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(text),
            500..=599 => ApiError::ServerError(text),
            code => ApiError::RequestFailed {
                status: code,
                message: text,
            },
        }
    }
}

/// Pull a human-readable message out of a server error envelope. The
/// backend puts it in an `error` field, older endpoints in `message`;
/// anything else falls back to the caller's default.
pub fn extract_server_message(body: &str, fallback: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["error", "message"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }
    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_maps_common_codes() {
        assert_eq!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "whatever"),
            ApiError::Unauthorized
        );
        assert_eq!(
            ApiError::from_status(StatusCode::NOT_FOUND, "no such place"),
            ApiError::NotFound("no such place".to_string())
        );
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down"),
            ApiError::ServerError("upstream down".to_string())
        );
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "bad payload"),
            ApiError::RequestFailed {
                status: 400,
                message: "bad payload".to_string()
            }
        );
    }

    #[test]
    fn test_from_status_empty_body_gets_generic_message() {
        assert_eq!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "  "),
            ApiError::RequestFailed {
                status: 400,
                message: "Request failed".to_string()
            }
        );
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let body = "é".repeat(400); // 800 bytes, limit falls mid-char
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated, 800 total bytes"));
    }

    #[test]
    fn test_extract_server_message_prefers_error_field() {
        let body = r#"{"error": "Invalid credentials", "message": "nope"}"#;
        assert_eq!(
            extract_server_message(body, "Login failed"),
            "Invalid credentials"
        );
    }

    #[test]
    fn test_extract_server_message_falls_back_to_message_field() {
        let body = r#"{"message": "Email already registered"}"#;
        assert_eq!(
            extract_server_message(body, "Registration failed"),
            "Email already registered"
        );
    }

    #[test]
    fn test_extract_server_message_fallback_on_garbage() {
        assert_eq!(
            extract_server_message("<html>502</html>", "Login failed"),
            "Login failed"
        );
        assert_eq!(extract_server_message("", "Login failed"), "Login failed");
    }
}
