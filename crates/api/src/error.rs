//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::DomainError;
use stats::StatsError;

/// API-level error type that maps to HTTP responses.
///
/// Every response body carries the message and a stable error kind:
/// `{"error": "...", "kind": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// No verified identity headers on the request.
    Unauthenticated(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Checkout or cart operation failed.
    Checkout(CheckoutError),
    /// Statistics query failed.
    Stats(StatsError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg),
            ApiError::Checkout(err) => {
                let status = kind_to_status(err.kind());
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "internal server error");
                }
                (status, err.kind(), err.to_string())
            }
            ApiError::Stats(err) => {
                let status = kind_to_status(err.kind());
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "internal server error");
                }
                (status, err.kind(), err.to_string())
            }
        };

        let body = serde_json::json!({ "error": message, "kind": kind });
        (status, axum::Json(body)).into_response()
    }
}

fn kind_to_status(kind: &str) -> StatusCode {
    match kind {
        "NOT_FOUND" | "PRODUCT_UNAVAILABLE" => StatusCode::NOT_FOUND,
        "INSUFFICIENT_STOCK" | "EMPTY_CART" | "INVALID_ARGUMENT" => StatusCode::BAD_REQUEST,
        "UNAUTHENTICATED" => StatusCode::UNAUTHORIZED,
        "FORBIDDEN" => StatusCode::FORBIDDEN,
        "INVALID_STATE" | "CONFLICT" => StatusCode::CONFLICT,
        "UPSTREAM_UNAVAILABLE" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}

impl From<StatsError> for ApiError {
    fn from(err: StatsError) -> Self {
        ApiError::Stats(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Checkout(CheckoutError::Domain(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(kind_to_status("NOT_FOUND"), StatusCode::NOT_FOUND);
        assert_eq!(kind_to_status("INSUFFICIENT_STOCK"), StatusCode::BAD_REQUEST);
        assert_eq!(kind_to_status("FORBIDDEN"), StatusCode::FORBIDDEN);
        assert_eq!(kind_to_status("INVALID_STATE"), StatusCode::CONFLICT);
        assert_eq!(kind_to_status("CONFLICT"), StatusCode::CONFLICT);
        assert_eq!(kind_to_status("UPSTREAM_UNAVAILABLE"), StatusCode::BAD_GATEWAY);
        assert_eq!(kind_to_status("STORAGE"), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
