//! HTTP error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use musubi_core::error::MusubiError;
use serde_json::json;
use tracing::error;

/// Wraps a domain error so handlers can return it with `?`.
#[derive(Debug)]
pub struct ApiError(pub MusubiError);

impl From<MusubiError> for ApiError {
    fn from(err: MusubiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            MusubiError::AuthenticationFailed { reason } => (StatusCode::UNAUTHORIZED, reason),
            e @ MusubiError::Forbidden { .. } => (StatusCode::FORBIDDEN, e.to_string()),
            e @ (MusubiError::NotFound { .. } | MusubiError::NoDeliveryTarget { .. }) => {
                (StatusCode::NOT_FOUND, e.to_string())
            }
            e @ MusubiError::Validation { .. } => (StatusCode::BAD_REQUEST, e.to_string()),
            e @ (MusubiError::AlreadyExists { .. }
            | MusubiError::AlreadyConfirmed
            | MusubiError::InvalidTransition { .. }
            | MusubiError::Conflict { .. }
            | MusubiError::LastOrganizer) => (StatusCode::CONFLICT, e.to_string()),
            MusubiError::DeliveryFailure(reason) => {
                error!(%reason, "Push delivery failed");
                (StatusCode::INTERNAL_SERVER_ERROR, reason)
            }
            e @ (MusubiError::Database(_) | MusubiError::Internal(_)) => {
                error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: MusubiError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn kinds_map_to_statuses() {
        assert_eq!(
            status_of(MusubiError::forbidden("nope")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(MusubiError::NoDeliveryTarget {
                recipient: "u".into()
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status_of(MusubiError::AlreadyConfirmed), StatusCode::CONFLICT);
        assert_eq!(
            status_of(MusubiError::Conflict {
                entity: "payment".into()
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(MusubiError::DeliveryFailure("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(MusubiError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
    }
}
