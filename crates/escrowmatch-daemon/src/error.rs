//! Mapping from engine errors to HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use escrowmatch_types::{ErrorKind, EscrowError};

use crate::api_types::ErrorBody;

/// Code for requests without a usable caller identity.
pub const UNAUTHENTICATED_CODE: &str = "EM_ERR_AUTH";
/// Code for requests the transport cannot decode.
pub const BAD_REQUEST_CODE: &str = "EM_ERR_REQUEST";

/// A failed request, ready to render as `{error, code}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: UNAUTHENTICATED_CODE,
            message: format!("{UNAUTHENTICATED_CODE}: {}", reason.into()),
        }
    }

    pub fn bad_request(reason: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: BAD_REQUEST_CODE,
            message: format!("{BAD_REQUEST_CODE}: {}", reason.into()),
        }
    }
}

#[must_use]
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::StateConflict => StatusCode::CONFLICT,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::Upstream => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EscrowError> for ApiError {
    fn from(err: EscrowError) -> Self {
        let status = status_for(err.kind());
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
                code: self.code.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use escrowmatch_types::{OrderId, OrderStatus, Role};

    use super::*;

    #[test]
    fn taxonomy_maps_to_status() {
        let cases = [
            (
                EscrowError::InvalidAmount {
                    reason: "x".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (EscrowError::OrderNotFound(OrderId::new()), StatusCode::NOT_FOUND),
            (
                EscrowError::OrderNotAcceptable {
                    order_id: OrderId::new(),
                    status: OrderStatus::Accepted,
                },
                StatusCode::CONFLICT,
            ),
            (
                EscrowError::RoleDenied {
                    required: Role::User,
                    actual: Role::Merchant,
                },
                StatusCode::FORBIDDEN,
            ),
            (
                EscrowError::QuoteUnavailable {
                    reason: "down".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                EscrowError::Configuration("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn carries_engine_code() {
        let api = ApiError::from(EscrowError::NotAssignedMerchant(OrderId::new()));
        assert_eq!(api.code, "EM_ERR_400");
        assert!(api.message.starts_with("EM_ERR_400"));
    }
}
