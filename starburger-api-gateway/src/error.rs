use std::collections::BTreeMap;

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Json};
use serde_json::json;
use starburger_foodcart::{
    command_handlers::CommandHandlerError, dashboard::DashboardError,
    registration::RegistrationError,
};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthenticationFailed,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Invalid request")]
    Validation(BTreeMap<String, Vec<String>>),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<diesel::result::ConnectionError> for ApiError {
    fn from(err: diesel::result::ConnectionError) -> Self {
        ApiError::ServiceUnavailable(format!("Database error: {err}"))
    }
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        error!(error = %err, "database query failed");
        ApiError::InternalError("Database query failed".to_string())
    }
}

/// Undecodable bodies are reported like any other invalid payload.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(BTreeMap::from([(
            "non_field_errors".to_string(),
            vec![rejection.body_text()],
        )]))
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::Invalid(fields) => ApiError::Validation(fields.into_inner()),
            RegistrationError::Internal(err) => err.into(),
        }
    }
}

impl From<CommandHandlerError> for ApiError {
    fn from(err: CommandHandlerError) -> Self {
        match err {
            CommandHandlerError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CommandHandlerError::InvalidTransition { .. }
            | CommandHandlerError::RestaurantRequired { .. } => ApiError::Conflict(err.to_string()),
            CommandHandlerError::Internal(err) => err.into(),
        }
    }
}

impl From<DashboardError> for ApiError {
    fn from(err: DashboardError) -> Self {
        match err {
            DashboardError::Internal(err) => err.into(),
            DashboardError::PlaceStore(err) => {
                error!(error = %err, "coordinate cache failed");
                ApiError::InternalError("Coordinate cache failed".to_string())
            }
        }
    }
}

impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message) = match &self {
            ApiError::AuthenticationFailed => (
                StatusCode::UNAUTHORIZED,
                "Authentication failed".to_string(),
            ),
            ApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
            ApiError::Validation(fields) => {
                let body = Json(json!({
                    "error": "Invalid request",
                    "fields": fields,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
