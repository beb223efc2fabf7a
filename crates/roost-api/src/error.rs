use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use roost_types::error::{AuthError, RoutingError, ValidationError};

/// Umbrella over the three domain error families. Every variant is an
/// expected, recoverable-by-caller condition; none are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Routing(#[from] RoutingError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Unexpected server-side failure (e.g. password hashing). Not part of
    /// the client-facing taxonomy.
    #[error("Internal Error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(AuthError::AccessDenied) => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::Routing(RoutingError::InvalidChannel) => StatusCode::NOT_FOUND,
            ApiError::Routing(RoutingError::DuplicateChannel) => StatusCode::CONFLICT,
            ApiError::Validation(ValidationError::DuplicateUser) => StatusCode::CONFLICT,
            ApiError::Validation(ValidationError::InsufficientLevel)
            | ApiError::Validation(ValidationError::FilterToggleDenied) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_the_wire_strings() {
        assert_eq!(ApiError::from(AuthError::InvalidAuth).to_string(), "Invalid Auth");
        assert_eq!(
            ApiError::from(RoutingError::InvalidChannel).to_string(),
            "Invalid Channel"
        );
        assert_eq!(
            ApiError::from(ValidationError::EmptyMessage).to_string(),
            "Empty Message"
        );
    }

    #[test]
    fn statuses_follow_the_family() {
        assert_eq!(ApiError::from(AuthError::InvalidPassword).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(AuthError::AccessDenied).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::from(RoutingError::DuplicateChannel).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(ValidationError::MissingParams).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
