//! API error responses and server errors.

use axum::{
    extract::rejection::BytesRejection,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use gateway_core::{ErrorKind, GatewayError};
use serde::Serialize;
use std::net::SocketAddr;
use thiserror::Error;

/// Header carrying the configured request budget on 429 responses
pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";

/// Header carrying the remaining request budget on 429 responses
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Error body returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
}

/// Error answered by an HTTP handler
#[derive(Debug)]
pub struct ApiError {
    /// HTTP status
    pub status: StatusCode,
    /// Message placed in the `error` field
    pub message: String,
    /// Error classification, when it came from the gateway core
    pub kind: Option<ErrorKind>,
    rate_limit: Option<(u32, u32)>,
}

impl ApiError {
    /// Create an error with an explicit status
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            kind: None,
            rate_limit: None,
        }
    }

    /// 429 Too Many Requests with budget headers
    #[must_use]
    pub fn rate_limited(limit: u32, remaining: u32) -> Self {
        Self::from(GatewayError::rate_limited(limit, remaining))
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let rate_limit = match err {
            GatewayError::RateLimited { limit, remaining } => Some((limit, remaining)),
            _ => None,
        };

        Self {
            status,
            message: err.client_message(),
            kind: Some(err.kind()),
            rate_limit,
        }
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        Self {
            kind: Some(ErrorKind::MalformedInput),
            ..Self::new(rejection.status(), rejection.body_text())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response();

        if let Some((limit, remaining)) = self.rate_limit {
            let headers = response.headers_mut();
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_LIMIT_HEADER),
                HeaderValue::from(limit),
            );
            headers.insert(
                HeaderName::from_static(RATE_LIMIT_REMAINING_HEADER),
                HeaderValue::from(remaining),
            );
        }

        response
    }
}

/// Failure starting or running the HTTP server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Host and port do not form a socket address
    #[error("invalid listen address {0}")]
    InvalidAddress(String),

    /// The listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address
        addr: SocketAddr,
        /// Underlying error
        source: std::io::Error,
    },

    /// The server loop failed
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::ProviderType;

    #[test]
    fn test_maps_gateway_errors() {
        let err = ApiError::from(GatewayError::NoMessage);
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "No user message provided");
        assert_eq!(err.kind, Some(ErrorKind::NoMessage));

        let err = ApiError::from(GatewayError::malformed("trailing characters"));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid JSON in request body");

        let err = ApiError::from(GatewayError::upstream_status(
            ProviderType::Gemini,
            503,
            "{\"error\":\"secret detail\"}",
        ));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Gemini API error: 503");
    }

    #[test]
    fn test_rate_limit_headers() {
        let response = ApiError::rate_limited(10, 0).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[RATE_LIMIT_LIMIT_HEADER], "10");
        assert_eq!(response.headers()[RATE_LIMIT_REMAINING_HEADER], "0");
    }

    #[test]
    fn test_plain_errors_have_no_rate_limit_headers() {
        let response = ApiError::new(StatusCode::BAD_REQUEST, "nope").into_response();
        assert!(response.headers().get(RATE_LIMIT_LIMIT_HEADER).is_none());
    }
}
