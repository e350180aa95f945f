pub mod ollama;
pub mod vertex;

pub use ollama::OllamaBackend;
pub use vertex::VertexBackend;

use std::time::Duration;

use counsel_core::GenerationError;
use reqwest::StatusCode;

/// Response body characters kept in error messages.
const ERROR_BODY_CHARS: usize = 500;

/// Rate limits, request timeouts and server errors are retryable; any other
/// non-success status means the request itself is wrong.
pub fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    let body: String = body.chars().take(ERROR_BODY_CHARS).collect();
    let msg = format!("HTTP {status}: {body}");
    if status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
        || status.is_server_error()
    {
        GenerationError::Transient(msg)
    } else {
        GenerationError::Fatal(msg)
    }
}

pub fn classify_transport(e: &reqwest::Error) -> GenerationError {
    if e.is_timeout() || e.is_connect() || e.is_request() {
        GenerationError::Transient(e.to_string())
    } else {
        GenerationError::Fatal(e.to_string())
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::Fatal(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_are_transient() {
        for code in [408, 429, 500, 502, 503, 504] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(classify_status(status, "").is_transient(), "{code}");
        }
    }

    #[test]
    fn client_errors_are_fatal() {
        for code in [400, 401, 403, 404, 422] {
            let status = StatusCode::from_u16(code).unwrap();
            assert!(!classify_status(status, "").is_transient(), "{code}");
        }
    }

    #[test]
    fn error_body_is_truncated() {
        let err = classify_status(StatusCode::BAD_REQUEST, &"x".repeat(2000));
        let GenerationError::Fatal(msg) = err else {
            panic!("expected fatal");
        };
        assert!(msg.len() < 600);
        assert!(msg.starts_with("HTTP 400 Bad Request: "));
    }
}
