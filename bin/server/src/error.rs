//! API error type mapping domain failures onto HTTP responses.
//!
//! Response bodies carry user-safe messages only; database detail stays in
//! the logs.

use amber_ward_access::AccessError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

/// Errors surfaced by API operations.
#[derive(Debug)]
pub enum ApiError {
    /// No actor identity on the request.
    Unauthenticated,
    /// Actor lacks the role or ownership required.
    Forbidden { details: String },
    /// Target entity does not exist or is not visible.
    NotFound { entity: &'static str },
    /// The operation conflicts with current state.
    Conflict { details: String },
    /// Invite token past its expiry.
    Expired { details: String },
    /// Malformed input.
    Validation { details: String },
    /// Database failure.
    Database { details: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "not authenticated"),
            Self::Forbidden { details } => write!(f, "forbidden: {details}"),
            Self::NotFound { entity } => write!(f, "{entity} not found"),
            Self::Conflict { details } => write!(f, "conflict: {details}"),
            Self::Expired { details } => write!(f, "expired: {details}"),
            Self::Validation { details } => write!(f, "validation failed: {details}"),
            Self::Database { details } => write!(f, "database error: {details}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => Self::Unauthenticated,
            AccessError::Forbidden { actor_id, action } => Self::Forbidden {
                details: format!("actor {actor_id} is not allowed to {action}"),
            },
            AccessError::NotFound { entity } => Self::NotFound { entity },
            AccessError::Conflict { details } => Self::Conflict { details },
            AccessError::Expired { details } => Self::Expired { details },
            AccessError::Validation { details } => Self::Validation { details },
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database {
            details: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            Self::Forbidden { .. } => (StatusCode::FORBIDDEN, "Access denied".to_string()),
            Self::NotFound { entity } => (StatusCode::NOT_FOUND, format!("{entity} not found")),
            Self::Conflict { details } => (StatusCode::CONFLICT, details.clone()),
            Self::Expired { details } => (StatusCode::GONE, details.clone()),
            Self::Validation { details } => (StatusCode::UNPROCESSABLE_ENTITY, details.clone()),
            Self::Database { details } => {
                tracing::error!(details = %details, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amber_ward_core::ActorId;

    #[test]
    fn access_error_categories_map_over() {
        let err: ApiError = AccessError::Unauthenticated.into();
        assert!(matches!(err, ApiError::Unauthenticated));

        let err: ApiError = AccessError::conflict("already processed").into();
        assert!(matches!(err, ApiError::Conflict { .. }));

        let err: ApiError = AccessError::Forbidden {
            actor_id: ActorId::new(),
            action: "revoke access",
        }
        .into();
        assert!(matches!(err, ApiError::Forbidden { .. }));
    }

    #[test]
    fn display_includes_category() {
        let err = ApiError::Expired {
            details: "invite token has expired".to_string(),
        };
        assert!(err.to_string().contains("expired"));
    }
}
