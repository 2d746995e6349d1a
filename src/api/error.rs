//! Errors raised while talking to the backend.

use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot connect to backend at {url}")]
    Connect { url: String },

    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("not authorized: {0} (try `stocktally login`)")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("backend error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Map a non-success status and its body to an error.
    ///
    /// The envelope's `message` is used when the body carries one, otherwise
    /// the raw body (or the status reason when the body is empty).
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(status, body);
        let code = status.as_u16();

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(message),
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            s if s.is_server_error() => ApiError::Server {
                status: code,
                message,
            },
            _ => ApiError::Rejected {
                status: code,
                message,
            },
        }
    }
}

fn error_message(status: StatusCode, body: &str) -> String {
    let body = body.trim();

    // Error bodies usually come back as an envelope, sometimes without `data`.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
        {
            return message.to_string();
        }
    }

    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_message_is_used() {
        let err = ApiError::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message": "Insufficient stock for variant 4", "data": null}"#,
        );
        match err {
            ApiError::Rejected { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Insufficient stock for variant 4");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_message_without_data_field() {
        let err = ApiError::from_status(StatusCode::UNAUTHORIZED, r#"{"message": "Token expired"}"#);
        assert!(matches!(err, ApiError::Unauthorized(ref m) if m == "Token expired"));
    }

    #[test]
    fn test_plain_body_and_empty_body() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(err, ApiError::Server { status: 502, ref message } if message == "upstream down"));

        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert!(matches!(err, ApiError::NotFound(ref m) if m == "Not Found"));
    }

    #[test]
    fn test_forbidden_maps_to_unauthorized() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, "{}");
        assert!(matches!(err, ApiError::Unauthorized(_)));
        assert!(err.to_string().contains("stocktally login"));
    }
}
